//! Arm facade
//!
//! Composes the motion controller, sequencer, persistence layer and
//! kinematics into the single aggregate the control loop owns. One
//! [`Arm::tick`] per cycle advances motion, then macro playback.

use armature_hal::ByteStore;
use core::f32::consts::PI;

use crate::config::ArmConfig;
use crate::error::{Error, ValidationError};
use crate::joint::{Angles, Joint, JointReport, JOINT_COUNT};
use crate::kinematics::{Kinematics, Point3};
use crate::motion::{MotionController, MotionStatus};
use crate::persist::{LoadOutcome, Persistence};
use crate::sequencer::{Sequencer, SequencerStatus};
use crate::store::{Label, MacroStep};
use crate::traits::ServoOutput;

/// Coarse status for remote monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArmStatus {
    Idle,
    Moving,
    /// Takes precedence over `Moving`
    RunningMacro,
}

impl ArmStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArmStatus::Idle => "IDLE",
            ArmStatus::Moving => "MOVING",
            ArmStatus::RunningMacro => "RUNNING_MACRO",
        }
    }
}

/// Snapshot published to the telemetry bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Telemetry {
    pub status: ArmStatus,
    /// Logical angles in whole degrees
    pub angles: Angles,
}

impl Telemetry {
    /// Joint positions in radians
    pub fn radians(&self) -> [f32; JOINT_COUNT] {
        self.angles.map(|deg| deg as f32 * (PI / 180.0))
    }
}

/// What one control cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    pub motion: MotionStatus,
    pub sequencer: SequencerStatus,
}

/// The arm
pub struct Arm<S, B> {
    motion: MotionController<S>,
    sequencer: Sequencer,
    persistence: Persistence<B>,
    kinematics: Kinematics,
}

impl<S: ServoOutput, B: ByteStore> Arm<S, B> {
    /// Create an arm at the safe power-on pose; nothing is written yet
    pub fn new(servos: S, store: B, config: &ArmConfig) -> Self {
        Self {
            motion: MotionController::new(servos, config),
            sequencer: Sequencer::new(),
            persistence: Persistence::new(store),
            kinematics: Kinematics::new(config.geometry, config.neutral),
        }
    }

    /// Write the power-on pose, then glide to the stored positions
    ///
    /// A load failure leaves the arm at the power-on pose with safe limits.
    pub fn power_on(&mut self, now_ms: u32) -> Result<LoadOutcome, Error> {
        self.motion.write_all();
        self.persistence.load(&mut self.motion, true, now_ms)
    }

    /// Run one control cycle
    pub fn tick(&mut self, now_ms: u32) -> TickReport {
        let motion = self.motion.update(now_ms);
        let sequencer = self
            .sequencer
            .update(now_ms, &mut self.motion, &mut self.persistence);
        TickReport { motion, sequencer }
    }

    pub fn motion(&self) -> &MotionController<S> {
        &self.motion
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn persistence(&self) -> &Persistence<B> {
        &self.persistence
    }

    pub fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    pub fn status(&self) -> ArmStatus {
        if self.sequencer.is_running() {
            ArmStatus::RunningMacro
        } else if self.motion.is_moving() {
            ArmStatus::Moving
        } else {
            ArmStatus::Idle
        }
    }

    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            status: self.status(),
            angles: self.motion.joints().angles(),
        }
    }

    // Manual moves

    /// Move every joint
    pub fn move_joints(
        &mut self,
        target: &Angles,
        duration_ms: Option<u32>,
        now_ms: u32,
    ) -> Result<(), Error> {
        self.motion.move_to(target, duration_ms, now_ms)
    }

    /// Target built from the current whole-degree angles, clamped to limits
    fn hold_target(&self) -> Angles {
        let joints = self.motion.joints();
        joints.clamp(&joints.angles())
    }

    /// Move one joint; the others hold their current angle
    pub fn move_joint(
        &mut self,
        joint: Joint,
        angle: i16,
        duration_ms: Option<u32>,
        now_ms: u32,
    ) -> Result<(), Error> {
        let mut target = self.hold_target();
        target[joint.index()] = angle;
        self.motion.move_to(&target, duration_ms, now_ms)
    }

    /// Move both shoulder servos to the same angle
    pub fn move_shoulders(
        &mut self,
        angle: i16,
        duration_ms: Option<u32>,
        now_ms: u32,
    ) -> Result<(), Error> {
        let mut target = self.hold_target();
        target[Joint::ShoulderA.index()] = angle;
        target[Joint::ShoulderB.index()] = angle;
        self.motion.move_to(&target, duration_ms, now_ms)
    }

    /// Bring both shoulders to the mean of their current angles
    ///
    /// Returns the chosen angle.
    pub fn align_shoulders(&mut self, duration_ms: Option<u32>, now_ms: u32) -> Result<i16, Error> {
        let joints = self.motion.joints();
        let mean = (joints.angle(Joint::ShoulderA) + joints.angle(Joint::ShoulderB)) / 2;
        self.move_shoulders(mean, duration_ms, now_ms)?;
        Ok(mean)
    }

    /// Solve for a Cartesian target and move there at the configured speed
    ///
    /// Returns the joint target. Nothing moves if there is no solution.
    pub fn move_to_xyz(&mut self, target: Point3, now_ms: u32) -> Result<Angles, Error> {
        let angles = self.kinematics.solve(target, self.motion.joints())?;
        self.motion.move_to(&angles, None, now_ms)?;
        Ok(angles)
    }

    /// Forward kinematics of the current logical angles
    pub fn estimate_current(&self) -> Result<Point3, Error> {
        self.kinematics
            .estimate_degrees(self.motion.joints().logical_angles())
    }

    /// Move to remote joint goals given in radians
    pub fn joint_goal_radians(
        &mut self,
        radians: &[f32; JOINT_COUNT],
        now_ms: u32,
    ) -> Result<(), Error> {
        let mut target = [0i16; JOINT_COUNT];
        for (i, (deg, rad)) in target.iter_mut().zip(radians.iter()).enumerate() {
            let value = libm::roundf(rad * (180.0 / PI));
            if !value.is_finite() || value < i16::MIN as f32 || value > i16::MAX as f32 {
                let joint = Joint::ALL[i];
                let cal = self.motion.joints().calibration(joint);
                return Err(ValidationError::AngleOutOfBounds {
                    joint: i as u8,
                    angle: if value > 0.0 { i16::MAX } else { i16::MIN },
                    min: cal.min,
                    max: cal.max,
                }
                .into());
            }
            *deg = value as i16;
        }
        self.motion.move_to(&target, None, now_ms)
    }

    // Calibration

    pub fn set_min(&mut self, joint: Joint, angle: i16) -> Result<(), Error> {
        self.motion.set_min(joint, angle)
    }

    pub fn set_max(&mut self, joint: Joint, angle: i16) -> Result<(), Error> {
        self.motion.set_max(joint, angle)
    }

    pub fn set_offset(&mut self, joint: Joint, offset: i16) -> Result<(), Error> {
        self.motion.set_offset(joint, offset)
    }

    /// Current, limits, offset and physical output of every joint
    pub fn calibration_report(&self) -> [JointReport; JOINT_COUNT] {
        Joint::ALL.map(|joint| self.motion.joints().report(joint))
    }

    // Poses

    /// Save the current whole-degree angles under `name`
    pub fn save_pose(&mut self, name: &str) -> Result<usize, Error> {
        let angles = self.motion.joints().angles();
        self.persistence.poses().save(name, &angles)
    }

    pub fn apply_pose(
        &mut self,
        name: &str,
        duration_ms: Option<u32>,
        now_ms: u32,
    ) -> Result<(), Error> {
        self.persistence
            .pose_view()
            .apply_by_name(name, &mut self.motion, duration_ms, now_ms)?;
        Ok(())
    }

    pub fn delete_pose(&mut self, name: &str) -> Result<(), Error> {
        self.persistence.poses().delete_by_name(name)
    }

    /// Lazy list of stored pose names
    pub fn pose_names(&self) -> impl Iterator<Item = Label> + Clone + '_ {
        self.persistence.pose_view().into_names()
    }

    // Macros

    pub fn save_macro(&mut self, name: &str, steps: &[MacroStep]) -> Result<usize, Error> {
        self.persistence.macros().save(name, steps)
    }

    pub fn delete_macro(&mut self, name: &str) -> Result<(), Error> {
        self.persistence.macros().delete_by_name(name)
    }

    /// Lazy list of stored macros with their step counts
    pub fn macro_list(&self) -> impl Iterator<Item = (Label, usize)> + Clone + '_ {
        self.persistence.macro_view().into_list()
    }

    pub fn start_macro(&mut self, name: &str, now_ms: u32) -> Result<(), Error> {
        self.sequencer
            .start_macro(name, &mut self.persistence, &mut self.motion, now_ms)
    }

    pub fn stop_macro(&mut self) {
        self.sequencer.stop();
    }

    // Persistence

    /// Persist calibration and current positions
    pub fn save_state(&mut self) -> Result<(), Error> {
        self.persistence.save(self.motion.joints())
    }

    pub fn load_state(&mut self, then_move: bool, now_ms: u32) -> Result<LoadOutcome, Error> {
        self.persistence.load(&mut self.motion, then_move, now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::PoseNames;
    use crate::store::{label, PoseRef};
    use crate::testing::{Eeprom, RecordingServos};

    fn arm() -> Arm<RecordingServos, Eeprom> {
        Arm::new(RecordingServos::default(), Eeprom::new(), &ArmConfig::default())
    }

    fn settle(arm: &mut Arm<RecordingServos, Eeprom>, mut now: u32) -> u32 {
        while arm.status() != ArmStatus::Idle {
            now += 20;
            arm.tick(now);
        }
        now
    }

    #[test]
    fn test_power_on_blank_store() {
        let mut arm = arm();
        assert_eq!(
            arm.power_on(0),
            Err(Error::Integrity(crate::error::IntegrityError::BadMagic))
        );
        assert_eq!(arm.telemetry().angles, [90, 130, 130, 100, 70, 120, 100]);
        assert_eq!(arm.motion().servos().last, [90, 130, 130, 100, 70, 120, 100]);
        assert_eq!(arm.status(), ArmStatus::Idle);
    }

    #[test]
    fn test_power_on_restores_with_glide() {
        let mut arm = arm();
        arm.move_joint(Joint::Base, 30, Some(0), 0).unwrap();
        arm.set_offset(Joint::Elbow, 7).unwrap();
        arm.save_state().unwrap();

        let store = arm.persistence.into_inner();
        let mut rebooted = Arm::new(RecordingServos::default(), store, &ArmConfig::default());
        assert_eq!(rebooted.power_on(0), Ok(LoadOutcome::Restored));
        assert_eq!(rebooted.status(), ArmStatus::Moving);
        assert_eq!(rebooted.motion().joints().calibration(Joint::Elbow).offset, 7);

        settle(&mut rebooted, 0);
        assert_eq!(rebooted.telemetry().angles[0], 30);
    }

    #[test]
    fn test_move_joint_holds_others() {
        let mut arm = arm();
        arm.move_joint(Joint::Elbow, 150, None, 0).unwrap();
        let active = arm.motion().active_move().unwrap();
        assert_eq!(active.target, [90, 130, 130, 150, 70, 120, 100]);
        assert_eq!(active.duration_ms, 50 * 25);
        assert_eq!(arm.status(), ArmStatus::Moving);
    }

    #[test]
    fn test_move_joint_rejected() {
        let mut arm = arm();
        let err = arm.move_joint(Joint::Gripper, 170, None, 0).unwrap_err();
        assert_eq!(
            err,
            Error::Validation(ValidationError::AngleOutOfBounds {
                joint: 6,
                angle: 170,
                min: 55,
                max: 155
            })
        );
        assert_eq!(arm.status(), ArmStatus::Idle);
    }

    #[test]
    fn test_shoulders() {
        let mut arm = arm();
        arm.move_joint(Joint::ShoulderB, 170, Some(0), 0).unwrap();

        assert_eq!(arm.align_shoulders(Some(0), 0).unwrap(), 150);
        let angles = arm.telemetry().angles;
        assert_eq!((angles[1], angles[2]), (150, 150));

        arm.move_shoulders(100, Some(0), 0).unwrap();
        let angles = arm.telemetry().angles;
        assert_eq!((angles[1], angles[2]), (100, 100));
    }

    #[test]
    fn test_move_to_xyz() {
        let mut arm = Arm::new(
            RecordingServos::default(),
            Eeprom::new(),
            &ArmConfig::unrestricted(),
        );
        let target = arm.move_to_xyz(Point3::new(180.0, 0.0, 150.0), 0).unwrap();
        assert_eq!(target[0], 90);
        assert_eq!(target[1], target[2]);

        settle(&mut arm, 0);
        let p = arm.estimate_current().unwrap();
        assert!(p.distance(&Point3::new(180.0, 0.0, 150.0)) < 5.0);

        let before = arm.telemetry();
        assert_eq!(
            arm.move_to_xyz(Point3::new(0.0, 0.0, 70.0), 0),
            Err(Error::DegenerateGeometry)
        );
        assert_eq!(arm.telemetry(), before);
    }

    #[test]
    fn test_joint_goal_radians() {
        let mut arm = arm();
        let mut goal = arm.telemetry().radians();
        goal[0] = PI / 4.0;
        arm.joint_goal_radians(&goal, 0).unwrap();
        assert_eq!(arm.motion().active_move().unwrap().target[0], 45);

        goal[0] = f32::NAN;
        assert!(arm.joint_goal_radians(&goal, 0).unwrap_err().is_validation());
    }

    #[test]
    fn test_status_macro_precedence() {
        let mut arm = arm();
        arm.move_joint(Joint::Base, 60, Some(0), 0).unwrap();
        arm.save_pose("left").unwrap();
        arm.move_joint(Joint::Base, 120, Some(0), 0).unwrap();
        arm.save_pose("right").unwrap();

        let steps = [
            MacroStep::new(PoseRef::Name(label("left").unwrap()), 100),
            MacroStep::new(PoseRef::Name(label("right").unwrap()), 0),
        ];
        arm.save_macro("sweep", &steps).unwrap();
        assert_eq!(arm.macro_list().next(), Some((label("sweep").unwrap(), 2)));

        arm.start_macro("sweep", 0).unwrap();
        assert_eq!(arm.status(), ArmStatus::RunningMacro);
        assert_eq!(arm.status().as_str(), "RUNNING_MACRO");

        settle(&mut arm, 0);
        assert_eq!(arm.telemetry().angles[0], 120);
    }

    #[test]
    fn test_stop_macro_keeps_moving() {
        let mut arm = arm();
        arm.save_pose("here").unwrap();
        arm.move_joint(Joint::Base, 10, Some(0), 0).unwrap();
        arm.save_macro(
            "back",
            &[MacroStep::new(PoseRef::Name(label("here").unwrap()), 0)],
        )
        .unwrap();
        arm.start_macro("back", 0).unwrap();
        arm.stop_macro();
        assert_eq!(arm.status(), ArmStatus::Moving);
    }

    #[test]
    fn test_pose_listing() {
        let mut arm = arm();
        arm.save_pose("one").unwrap();
        arm.save_pose("two").unwrap();
        arm.delete_pose("one").unwrap();

        let names: PoseNames = arm.pose_names().collect();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0], "two");
    }

    #[test]
    fn test_calibration_report() {
        let mut arm = arm();
        arm.set_offset(Joint::Base, -10).unwrap();
        arm.set_min(Joint::Elbow, 80).unwrap();

        let report = arm.calibration_report();
        assert_eq!(report[0].physical, 80);
        assert_eq!(report[3].min, 80);
        assert_eq!(report[6].joint, Joint::Gripper);
    }
}
