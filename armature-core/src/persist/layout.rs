//! Byte store layout
//!
//! ```text
//! 0      record region (compact or legacy record, rest zero)
//! 128    pose table   10 x 32 bytes
//! 448    macro table   5 x 288 bytes
//! 1888   end
//! ```

use crate::store::{Macro, Pose, SlotTable, MAX_MACROS, MAX_POSES};

use super::record::LEGACY_RECORD_LEN;

/// Record offset
pub const RECORD_OFFSET: usize = 0;

/// Bytes reserved for the record
pub const RECORD_REGION_LEN: usize = 128;

pub const POSE_SLOT_SIZE: usize = 32;

pub const MACRO_SLOT_SIZE: usize = 288;

pub const POSE_TABLE_OFFSET: usize = RECORD_OFFSET + RECORD_REGION_LEN;

pub const MACRO_TABLE_OFFSET: usize = POSE_TABLE_OFFSET + MAX_POSES * POSE_SLOT_SIZE;

/// First byte past everything the arm stores
pub const LAYOUT_END: usize = MACRO_TABLE_OFFSET + MAX_MACROS * MACRO_SLOT_SIZE;

pub const POSE_TABLE: SlotTable<Pose, POSE_SLOT_SIZE> =
    SlotTable::new(POSE_TABLE_OFFSET, MAX_POSES);

pub const MACRO_TABLE: SlotTable<Macro, MACRO_SLOT_SIZE> =
    SlotTable::new(MACRO_TABLE_OFFSET, MAX_MACROS);

const _: () = assert!(LEGACY_RECORD_LEN <= RECORD_REGION_LEN);
const _: () = assert!(LAYOUT_END <= armature_hal::STORE_SIZE);
