//! Hardware driver implementations
//!
//! Concrete implementations of the actuator trait defined in
//! armature-core:
//!
//! - Hobby servos driven by a 50 Hz PWM channel
//! - A servo bank that fans joint writes out to one channel per joint

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod servo;
