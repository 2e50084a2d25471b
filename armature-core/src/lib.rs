//! Board-agnostic core logic for the Armature arm controller
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Joint state and calibration
//! - Eased, retargetable motion control
//! - Inverse and forward kinematics
//! - Named pose and macro storage
//! - Macro sequencer state machine
//! - Checksummed persistence with legacy migration
//! - The `Arm` facade and its typed command surface

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod arm;
pub mod command;
pub mod config;
pub mod error;
pub mod joint;
pub mod kinematics;
pub mod motion;
pub mod persist;
pub mod sequencer;
pub mod store;
pub mod traits;

#[cfg(test)]
mod testing;

pub use arm::{Arm, ArmStatus, Telemetry, TickReport};
pub use command::{Command, Response};
pub use error::{Error, IntegrityError, ValidationError};
pub use joint::{Angles, Joint, JOINT_COUNT};
