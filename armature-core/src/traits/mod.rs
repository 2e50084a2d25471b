//! Hardware abstraction traits
//!
//! These traits define the interface between the application logic
//! and hardware-specific implementations. The byte store lives in
//! `armature-hal` because board crates implement it without the core.

pub mod servo;

pub use armature_hal::{ByteRead, ByteStore};
pub use servo::ServoOutput;
