//! RP2040-specific HAL for the arm controller firmware
//!
//! This crate provides RP2040 implementations of the shared
//! `armature-hal` traits:
//!
//! - Emulated EEPROM in the last flash sector (implements
//!   `armature_hal::ByteStore`)

#![no_std]

pub mod flash;

// Re-export shared traits from armature-hal for convenience
pub use armature_hal::{ByteRead, ByteStore, StoreError, STORE_SIZE};
pub use flash::FlashEeprom;
