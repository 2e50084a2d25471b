//! Armature Hardware Abstraction Layer
//!
//! This crate defines hardware abstraction traits that can be implemented
//! by chip-specific HALs. This enables the same motion and persistence code
//! to run on the controller and on the host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (armature-firmware, etc.)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  armature-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ armature-hal- │       │   RamStore    │
//! │    rp2040     │       │ (host, tests) │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`storage::ByteRead`] - Read access to persistent storage
//! - [`storage::ByteStore`] - Persistent byte-addressable storage

#![no_std]
#![deny(unsafe_code)]

pub mod storage;

// Re-export key traits at crate root for convenience
pub use storage::{ByteRead, ByteStore, RamStore, StoreError, STORE_SIZE};
