//! Typed command surface
//!
//! Every operation a console or remote bridge can request, as data. Front
//! ends tokenize their input into a [`Command`] and hand it to
//! [`Arm::execute`]; the arm answers with a [`Response`] or an [`Error`].

use armature_hal::ByteStore;
use heapless::Vec;

use crate::arm::{Arm, Telemetry};
use crate::error::Error;
use crate::joint::{Angles, Joint, JointReport, JOINT_COUNT};
use crate::kinematics::Point3;
use crate::persist::LoadOutcome;
use crate::store::{Label, MacroStep, MAX_MACROS, MAX_POSES, MAX_STEPS};
use crate::traits::ServoOutput;

/// Collected pose names
pub type PoseNames = Vec<Label, MAX_POSES>;

/// Collected macro names and step counts
pub type MacroList = Vec<(Label, usize), MAX_MACROS>;

/// Requests accepted by the arm
///
/// `duration_ms: None` moves at the configured speed; `Some(0)` jumps.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    MoveJoints { target: Angles, duration_ms: Option<u32> },
    MoveJoint { joint: Joint, angle: i16, duration_ms: Option<u32> },
    MoveShoulders { angle: i16, duration_ms: Option<u32> },
    AlignShoulders { duration_ms: Option<u32> },
    MoveTo(Point3),
    /// Remote joint goals in radians
    JointGoal([f32; JOINT_COUNT]),
    Estimate,

    SetMin { joint: Joint, angle: i16 },
    SetMax { joint: Joint, angle: i16 },
    SetOffset { joint: Joint, offset: i16 },
    Report,

    SavePose(Label),
    ApplyPose { name: Label, duration_ms: Option<u32> },
    DeletePose(Label),
    ListPoses,

    SaveMacro { name: Label, steps: Vec<MacroStep, MAX_STEPS> },
    DeleteMacro(Label),
    ListMacros,
    StartMacro(Label),
    StopMacro,

    Status,
    SaveState,
    LoadState { then_move: bool },
}

/// Successful command results
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    Done,
    /// Slot an entry was written to
    Slot(usize),
    /// Angle both shoulders were sent to
    Aligned(i16),
    /// Joint target chosen for a Cartesian move
    Target(Angles),
    Position(Point3),
    Report([JointReport; JOINT_COUNT]),
    Poses(PoseNames),
    Macros(MacroList),
    Telemetry(Telemetry),
    Loaded(LoadOutcome),
}

impl<S: ServoOutput, B: ByteStore> Arm<S, B> {
    /// Run one command
    pub fn execute(&mut self, command: Command, now_ms: u32) -> Result<Response, Error> {
        let response = match command {
            Command::MoveJoints { target, duration_ms } => {
                self.move_joints(&target, duration_ms, now_ms)?;
                Response::Done
            }
            Command::MoveJoint { joint, angle, duration_ms } => {
                self.move_joint(joint, angle, duration_ms, now_ms)?;
                Response::Done
            }
            Command::MoveShoulders { angle, duration_ms } => {
                self.move_shoulders(angle, duration_ms, now_ms)?;
                Response::Done
            }
            Command::AlignShoulders { duration_ms } => {
                Response::Aligned(self.align_shoulders(duration_ms, now_ms)?)
            }
            Command::MoveTo(point) => Response::Target(self.move_to_xyz(point, now_ms)?),
            Command::JointGoal(radians) => {
                self.joint_goal_radians(&radians, now_ms)?;
                Response::Done
            }
            Command::Estimate => Response::Position(self.estimate_current()?),

            Command::SetMin { joint, angle } => {
                self.set_min(joint, angle)?;
                Response::Done
            }
            Command::SetMax { joint, angle } => {
                self.set_max(joint, angle)?;
                Response::Done
            }
            Command::SetOffset { joint, offset } => {
                self.set_offset(joint, offset)?;
                Response::Done
            }
            Command::Report => Response::Report(self.calibration_report()),

            Command::SavePose(name) => Response::Slot(self.save_pose(&name)?),
            Command::ApplyPose { name, duration_ms } => {
                self.apply_pose(&name, duration_ms, now_ms)?;
                Response::Done
            }
            Command::DeletePose(name) => {
                self.delete_pose(&name)?;
                Response::Done
            }
            // Capacity of the list equals the table size
            Command::ListPoses => Response::Poses(self.pose_names().take(MAX_POSES).collect()),

            Command::SaveMacro { name, steps } => Response::Slot(self.save_macro(&name, &steps)?),
            Command::DeleteMacro(name) => {
                self.delete_macro(&name)?;
                Response::Done
            }
            Command::ListMacros => Response::Macros(self.macro_list().take(MAX_MACROS).collect()),
            Command::StartMacro(name) => {
                self.start_macro(&name, now_ms)?;
                Response::Done
            }
            Command::StopMacro => {
                self.stop_macro();
                Response::Done
            }

            Command::Status => Response::Telemetry(self.telemetry()),
            Command::SaveState => {
                self.save_state()?;
                Response::Done
            }
            Command::LoadState { then_move } => {
                Response::Loaded(self.load_state(then_move, now_ms)?)
            }
        };
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::ArmStatus;
    use crate::config::ArmConfig;
    use crate::error::ValidationError;
    use crate::store::{label, PoseRef};
    use crate::testing::{Eeprom, RecordingServos};

    fn arm() -> Arm<RecordingServos, Eeprom> {
        Arm::new(RecordingServos::default(), Eeprom::new(), &ArmConfig::default())
    }

    fn name(text: &str) -> Label {
        label(text).unwrap()
    }

    #[test]
    fn test_move_and_status() {
        let mut arm = arm();
        let response = arm
            .execute(
                Command::MoveJoint { joint: Joint::Base, angle: 45, duration_ms: None },
                0,
            )
            .unwrap();
        assert_eq!(response, Response::Done);

        match arm.execute(Command::Status, 0).unwrap() {
            Response::Telemetry(t) => assert_eq!(t.status, ArmStatus::Moving),
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[test]
    fn test_rejected_command_reports_error() {
        let mut arm = arm();
        let err = arm
            .execute(Command::SetOffset { joint: Joint::Hand, offset: 91 }, 0)
            .unwrap_err();
        assert_eq!(err, Error::Validation(ValidationError::OffsetOutOfRange(91)));
    }

    #[test]
    fn test_pose_commands() {
        let mut arm = arm();
        assert_eq!(arm.execute(Command::SavePose(name("rest")), 0), Ok(Response::Slot(0)));
        assert_eq!(arm.execute(Command::SavePose(name("grab")), 0), Ok(Response::Slot(1)));

        match arm.execute(Command::ListPoses, 0).unwrap() {
            Response::Poses(names) => {
                assert_eq!(names.len(), 2);
                assert_eq!(names[1], "grab");
            }
            other => panic!("unexpected response {:?}", other),
        }

        arm.execute(Command::DeletePose(name("all")), 0).unwrap();
        assert_eq!(
            arm.execute(
                Command::ApplyPose { name: name("rest"), duration_ms: None },
                0
            ),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn test_macro_commands() {
        let mut arm = arm();
        arm.execute(Command::SavePose(name("rest")), 0).unwrap();

        let mut steps = Vec::new();
        steps.push(MacroStep::new(PoseRef::Slot(0), 50)).unwrap();
        assert_eq!(
            arm.execute(Command::SaveMacro { name: name("loop"), steps }, 0),
            Ok(Response::Slot(0))
        );

        match arm.execute(Command::ListMacros, 0).unwrap() {
            Response::Macros(list) => assert_eq!(list.as_slice(), &[(name("loop"), 1)]),
            other => panic!("unexpected response {:?}", other),
        }

        arm.execute(Command::StartMacro(name("loop")), 0).unwrap();
        assert_eq!(
            arm.execute(Command::StartMacro(name("loop")), 10),
            Err(Error::Busy)
        );
        arm.execute(Command::StopMacro, 10).unwrap();
        assert!(!arm.sequencer().is_running());
    }

    #[test]
    fn test_state_commands() {
        let mut arm = arm();
        arm.execute(Command::SetMin { joint: Joint::Base, angle: 10 }, 0)
            .unwrap();
        arm.execute(Command::SaveState, 0).unwrap();
        arm.execute(Command::SetMin { joint: Joint::Base, angle: 20 }, 0)
            .unwrap();

        assert_eq!(
            arm.execute(Command::LoadState { then_move: false }, 0),
            Ok(Response::Loaded(LoadOutcome::Restored))
        );
        match arm.execute(Command::Report, 0).unwrap() {
            Response::Report(report) => assert_eq!(report[0].min, 10),
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[test]
    fn test_cartesian_commands() {
        let mut arm = Arm::new(
            RecordingServos::default(),
            Eeprom::new(),
            &ArmConfig::unrestricted(),
        );
        match arm.execute(Command::MoveTo(Point3::new(200.0, 0.0, 100.0)), 0).unwrap() {
            Response::Target(target) => assert_eq!(target[6], 90),
            other => panic!("unexpected response {:?}", other),
        }
        assert_eq!(
            arm.execute(Command::MoveTo(Point3::new(0.0, 0.0, 70.0)), 0),
            Err(Error::DegenerateGeometry)
        );
        assert!(matches!(
            arm.execute(Command::Estimate, 0),
            Ok(Response::Position(_))
        ));
    }

    #[test]
    fn test_align_command() {
        let mut arm = arm();
        arm.execute(
            Command::MoveJoint { joint: Joint::ShoulderA, angle: 101, duration_ms: Some(0) },
            0,
        )
        .unwrap();
        assert_eq!(
            arm.execute(Command::AlignShoulders { duration_ms: Some(0) }, 0),
            Ok(Response::Aligned(115))
        );
    }
}
