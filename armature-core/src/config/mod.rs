//! Configuration types
//!
//! Board-agnostic configuration structures, serializable with postcard.

pub mod arm;
pub mod geometry;

pub use arm::*;
pub use geometry::*;
