//! Macro playback
//!
//! Drives the motion controller through a macro one step at a time. Each
//! step moves to its pose at the configured speed, then holds for the
//! step's delay.

use armature_hal::ByteStore;

use super::machine::{SequencerEvent, SequencerState};
use crate::error::{Error, ValidationError};
use crate::motion::MotionController;
use crate::persist::Persistence;
use crate::store::{Label, Macro};
use crate::traits::ServoOutput;

/// What one sequencer update did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerStatus {
    /// No macro running
    Idle,
    /// Macro running, nothing new this update
    Running,
    /// Step with this index was started
    StepStarted(usize),
    /// Last step finished; the macro is done
    Completed,
    /// Playback stopped because a step failed
    Aborted(Error),
}

/// Macro sequencer
#[derive(Debug, Default)]
pub struct Sequencer {
    state: SequencerState,
    running: Option<Macro>,
    step: usize,
    wait_start_ms: u32,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Name of the macro in progress
    pub fn current_macro(&self) -> Option<&Label> {
        self.running.as_ref().map(|m| &m.name)
    }

    /// Index of the step in progress
    pub fn current_step(&self) -> Option<usize> {
        self.running.as_ref().map(|_| self.step)
    }

    /// Load a macro and start its first step
    ///
    /// Rejected with [`Error::Busy`] while another macro runs. If the first
    /// step's pose cannot be loaded the sequencer stays idle.
    pub fn start_macro<B: ByteStore, S: ServoOutput>(
        &mut self,
        name: &str,
        persistence: &mut Persistence<B>,
        motion: &mut MotionController<S>,
        now_ms: u32,
    ) -> Result<(), Error> {
        if self.is_running() {
            return Err(Error::Busy);
        }
        let program = persistence.macro_view().load_by_name(name)?;
        if program.steps.is_empty() {
            return Err(ValidationError::EmptyMacro.into());
        }

        self.running = Some(program);
        self.step = 0;
        match self.start_step(persistence, motion, now_ms) {
            Ok(()) => {
                self.apply(SequencerEvent::StepStarted);
                Ok(())
            }
            Err(e) => {
                self.apply(SequencerEvent::Abort);
                Err(e)
            }
        }
    }

    /// Stop sequencing; an in-flight move still completes
    pub fn stop(&mut self) {
        self.apply(SequencerEvent::Stop);
    }

    /// Advance playback; call every control cycle after the motion update
    pub fn update<B: ByteStore, S: ServoOutput>(
        &mut self,
        now_ms: u32,
        motion: &mut MotionController<S>,
        persistence: &mut Persistence<B>,
    ) -> SequencerStatus {
        let delay_ms = match (&self.running, self.state) {
            (Some(program), SequencerState::Waiting) => program.steps[self.step].delay_ms,
            _ => 0,
        };

        match self.state {
            SequencerState::Idle => SequencerStatus::Idle,

            SequencerState::Moving => {
                if !motion.is_moving() {
                    self.wait_start_ms = now_ms;
                    self.apply(SequencerEvent::MotionSettled);
                }
                SequencerStatus::Running
            }

            SequencerState::Waiting => {
                if now_ms.wrapping_sub(self.wait_start_ms) < delay_ms {
                    return SequencerStatus::Running;
                }

                self.step += 1;
                let remaining = self.running.as_ref().map_or(0, |m| m.steps.len());
                if self.step >= remaining {
                    self.apply(SequencerEvent::Finished);
                    return SequencerStatus::Completed;
                }

                match self.start_step(persistence, motion, now_ms) {
                    Ok(()) => {
                        self.apply(SequencerEvent::StepStarted);
                        SequencerStatus::StepStarted(self.step)
                    }
                    Err(e) => {
                        self.apply(SequencerEvent::Abort);
                        SequencerStatus::Aborted(e)
                    }
                }
            }
        }
    }

    fn start_step<B: ByteStore, S: ServoOutput>(
        &self,
        persistence: &mut Persistence<B>,
        motion: &mut MotionController<S>,
        now_ms: u32,
    ) -> Result<(), Error> {
        let program = self.running.as_ref().ok_or(Error::NotFound)?;
        let step = program.steps.get(self.step).ok_or(Error::NotFound)?;
        let pose = step.pose.resolve(&persistence.pose_view())?;
        motion.move_to(&pose.angles, None, now_ms)
    }

    fn apply(&mut self, event: SequencerEvent) {
        self.state = self.state.transition(event);
        if !self.state.is_running() {
            self.running = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArmConfig;
    use crate::joint::Angles;
    use crate::motion::MotionStatus;
    use crate::store::{label, MacroStep, PoseRef};
    use crate::testing::{Eeprom, RecordingServos};
    use heapless::Vec;

    const A: Angles = [60, 90, 90, 90, 90, 90, 90];
    const B: Angles = [120, 90, 90, 90, 90, 90, 90];
    const C: Angles = [90, 120, 120, 90, 90, 90, 90];

    struct Rig {
        motion: MotionController<RecordingServos>,
        persistence: Persistence<Eeprom>,
        sequencer: Sequencer,
    }

    impl Rig {
        fn new() -> Self {
            let mut persistence = Persistence::new(Eeprom::new());
            persistence.poses().save("a", &A).unwrap();
            persistence.poses().save("b", &B).unwrap();
            persistence.poses().save("c", &C).unwrap();
            Self {
                motion: MotionController::new(
                    RecordingServos::default(),
                    &ArmConfig::unrestricted(),
                ),
                persistence,
                sequencer: Sequencer::new(),
            }
        }

        fn save_macro(&mut self, name: &str, steps: &[(&str, u32)]) {
            let steps: Vec<MacroStep, 8> = steps
                .iter()
                .map(|(pose, delay)| MacroStep::new(PoseRef::parse(pose).unwrap(), *delay))
                .collect();
            self.persistence.macros().save(name, &steps).unwrap();
        }

        fn tick(&mut self, now: u32) -> SequencerStatus {
            self.motion.update(now);
            self.sequencer
                .update(now, &mut self.motion, &mut self.persistence)
        }

        fn start(&mut self, name: &str, now: u32) -> Result<(), Error> {
            self.sequencer
                .start_macro(name, &mut self.persistence, &mut self.motion, now)
        }
    }

    #[test]
    fn test_three_step_trace() {
        let mut rig = Rig::new();
        rig.save_macro("abc", &[("a", 0), ("b", 200), ("c", 0)]);
        assert!(!rig.sequencer.is_running());

        rig.start("abc", 0).unwrap();
        let mut trace: Vec<SequencerState, 16> = Vec::new();
        trace.push(SequencerState::Idle).unwrap();
        trace.push(rig.sequencer.state()).unwrap();
        let mut visited: Vec<i16, 4> = Vec::new();
        visited.push(rig.motion.active_move().unwrap().target[0]).unwrap();

        let mut now = 0;
        while rig.sequencer.is_running() {
            now += 10;
            assert!(now < 20_000, "macro never finished");
            let status = rig.tick(now);
            if let SequencerStatus::StepStarted(_) = status {
                visited.push(rig.motion.active_move().unwrap().target[0]).unwrap();
            }
            let state = rig.sequencer.state();
            if trace.last() != Some(&state) {
                trace.push(state).unwrap();
            }
            if state == SequencerState::Idle {
                assert_eq!(status, SequencerStatus::Completed);
            }
        }

        use SequencerState::*;
        assert_eq!(
            trace.as_slice(),
            &[Idle, Moving, Waiting, Moving, Waiting, Moving, Waiting, Idle]
        );
        assert_eq!(visited.as_slice(), &[60, 120, 90]);
        assert_eq!(rig.motion.joints().angles(), C);
        assert_eq!(rig.sequencer.current_macro(), None);
    }

    #[test]
    fn test_delay_respected() {
        let mut rig = Rig::new();
        rig.save_macro("ab", &[("a", 500), ("b", 0)]);
        rig.start("ab", 0).unwrap();

        // a: 30 degrees of base travel at 25 ms/degree
        let mut now = 0;
        while rig.sequencer.state() != SequencerState::Waiting {
            now += 10;
            rig.tick(now);
        }
        let settled = now;
        assert_eq!(settled, 750);

        assert_eq!(rig.tick(settled + 490), SequencerStatus::Running);
        assert_eq!(rig.tick(settled + 500), SequencerStatus::StepStarted(1));
    }

    #[test]
    fn test_start_rejected_while_running() {
        let mut rig = Rig::new();
        rig.save_macro("ab", &[("a", 0), ("b", 0)]);
        rig.start("ab", 0).unwrap();
        assert_eq!(rig.start("ab", 10), Err(Error::Busy));
        assert_eq!(rig.sequencer.current_macro().map(|n| n.as_str()), Some("ab"));
    }

    #[test]
    fn test_missing_macro() {
        let mut rig = Rig::new();
        assert_eq!(rig.start("ghost", 0), Err(Error::NotFound));
        assert!(!rig.sequencer.is_running());
        assert!(!rig.motion.is_moving());
    }

    #[test]
    fn test_missing_first_pose() {
        let mut rig = Rig::new();
        rig.save_macro("bad", &[("zz", 0), ("a", 0)]);
        assert_eq!(rig.start("bad", 0), Err(Error::NotFound));
        assert_eq!(rig.sequencer.state(), SequencerState::Idle);
    }

    #[test]
    fn test_missing_later_pose_aborts() {
        let mut rig = Rig::new();
        rig.save_macro("half", &[("a", 0), ("zz", 0)]);
        rig.start("half", 0).unwrap();

        let mut now = 0;
        let status = loop {
            now += 10;
            match rig.tick(now) {
                SequencerStatus::Running => continue,
                other => break other,
            }
        };
        assert_eq!(status, SequencerStatus::Aborted(Error::NotFound));
        assert!(!rig.sequencer.is_running());
    }

    #[test]
    fn test_slot_reference() {
        let mut rig = Rig::new();
        rig.save_macro("slots", &[("1", 0)]);
        rig.start("slots", 0).unwrap();
        assert_eq!(rig.motion.active_move().unwrap().target, B);
    }

    #[test]
    fn test_stop_leaves_move_running() {
        let mut rig = Rig::new();
        rig.save_macro("ab", &[("a", 0), ("b", 0)]);
        rig.start("ab", 0).unwrap();
        rig.tick(100);

        rig.sequencer.stop();
        assert!(!rig.sequencer.is_running());
        assert!(rig.motion.is_moving());
        assert_eq!(rig.tick(200), SequencerStatus::Idle);

        let mut now = 200;
        while rig.motion.update(now) != MotionStatus::Arrived {
            now += 10;
        }
        assert_eq!(rig.motion.joints().angles(), A);
    }

    #[test]
    fn test_label_helper_matches_store() {
        // Macro names round-trip through the label rules
        let mut rig = Rig::new();
        rig.save_macro("m", &[("a", 0)]);
        let name = label("m").unwrap();
        rig.start(&name, 0).unwrap();
        assert_eq!(rig.sequencer.current_macro(), Some(&name));
    }
}
