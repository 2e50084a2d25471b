//! Motion control
//!
//! Eased, time-bounded interpolation between joint targets.

pub mod controller;
pub mod ease;

pub use controller::{ActiveMove, MotionController, MotionStatus};
pub use ease::ease_in_out;
