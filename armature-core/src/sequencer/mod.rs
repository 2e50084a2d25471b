//! Macro sequencing
//!
//! Explicit, finite state machine that replays stored macros without
//! blocking the control loop.

pub mod machine;
pub mod runner;

pub use machine::{SequencerEvent, SequencerState};
pub use runner::{Sequencer, SequencerStatus};
