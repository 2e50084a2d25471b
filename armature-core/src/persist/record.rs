//! Persistent record codec
//!
//! Compact record (version 2), little-endian:
//!
//! ```text
//! 0   magic    u32
//! 4   version  u8 = 2
//! 5   current  [u8; 7]
//! 12  min      [u8; 7]
//! 19  max      [u8; 7]
//! 26  offset   [i8; 7]
//! 33  crc16    u16      over bytes 0..33
//! ```
//!
//! Legacy record (version 1) has no version byte and no checksum: magic
//! followed by current, min, max and offset as `[i32; 7]` each.

use crate::error::IntegrityError;
use crate::joint::{
    Angles, Joint, JointCalibration, JointState, JOINT_COUNT, SERVO_MAX_DEG, STORED_OFFSET_LIMIT,
};

use super::crc::crc16;

/// Format sentinel shared by both layouts
pub const MAGIC: u32 = 0xDEAD_BEEF;

/// Current record version
pub const VERSION: u8 = 2;

/// Compact record size in bytes
pub const RECORD_LEN: usize = 35;

/// Legacy record size in bytes
pub const LEGACY_RECORD_LEN: usize = 4 + 4 * JOINT_COUNT * 4;

const VERSION_OFFSET: usize = 4;
const CURRENT_OFFSET: usize = 5;
const MIN_OFFSET: usize = CURRENT_OFFSET + JOINT_COUNT;
const MAX_OFFSET: usize = MIN_OFFSET + JOINT_COUNT;
const OFFSETS_OFFSET: usize = MAX_OFFSET + JOINT_COUNT;
const CRC_OFFSET: usize = OFFSETS_OFFSET + JOINT_COUNT;

const _: () = assert!(CRC_OFFSET + 2 == RECORD_LEN);

/// Which layout a stored record uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordKind {
    Compact,
    Legacy,
}

/// Identify the layout of the bytes at the record offset
///
/// `bytes` must cover the legacy record length. Compact requires version 2
/// and a matching checksum. Otherwise the bytes are legacy only when every
/// legacy field is in range; failing that, the compact error is reported.
pub fn detect(bytes: &[u8; LEGACY_RECORD_LEN]) -> Result<RecordKind, IntegrityError> {
    if read_u32(bytes, 0) != MAGIC {
        return Err(IntegrityError::BadMagic);
    }
    let version = bytes[VERSION_OFFSET];
    let stored = u16::from_le_bytes([bytes[CRC_OFFSET], bytes[CRC_OFFSET + 1]]);
    let computed = crc16(&bytes[..CRC_OFFSET]);
    if version == VERSION && stored == computed {
        return Ok(RecordKind::Compact);
    }
    if LegacyRecord::decode(bytes)?.is_plausible() {
        return Ok(RecordKind::Legacy);
    }
    if version == VERSION {
        Err(IntegrityError::ChecksumMismatch { stored, computed })
    } else {
        Err(IntegrityError::UnknownVersion(version))
    }
}

/// Calibration and position snapshot in the current format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Record {
    pub current: [u8; JOINT_COUNT],
    pub min: [u8; JOINT_COUNT],
    pub max: [u8; JOINT_COUNT],
    pub offset: [i8; JOINT_COUNT],
}

impl Record {
    /// Snapshot the joint state, rounding positions to whole degrees
    pub fn from_joints(joints: &JointState) -> Self {
        let mut record = Self {
            current: [0; JOINT_COUNT],
            min: [0; JOINT_COUNT],
            max: [0; JOINT_COUNT],
            offset: [0; JOINT_COUNT],
        };
        for joint in Joint::ALL {
            let i = joint.index();
            let cal = joints.calibration(joint);
            record.current[i] = joints.angle(joint).clamp(0, SERVO_MAX_DEG as i16) as u8;
            record.min[i] = cal.min;
            record.max[i] = cal.max;
            record.offset[i] = cal.offset;
        }
        record
    }

    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut out = [0u8; RECORD_LEN];
        out[0..4].copy_from_slice(&MAGIC.to_le_bytes());
        out[VERSION_OFFSET] = VERSION;
        out[CURRENT_OFFSET..MIN_OFFSET].copy_from_slice(&self.current);
        out[MIN_OFFSET..MAX_OFFSET].copy_from_slice(&self.min);
        out[MAX_OFFSET..OFFSETS_OFFSET].copy_from_slice(&self.max);
        for (dst, &src) in out[OFFSETS_OFFSET..CRC_OFFSET].iter_mut().zip(self.offset.iter()) {
            *dst = src as u8;
        }
        let crc = crc16(&out[..CRC_OFFSET]);
        out[CRC_OFFSET..].copy_from_slice(&crc.to_le_bytes());
        out
    }

    /// Decode and validate magic, then version, then checksum
    pub fn decode(bytes: &[u8; RECORD_LEN]) -> Result<Self, IntegrityError> {
        if read_u32(bytes, 0) != MAGIC {
            return Err(IntegrityError::BadMagic);
        }
        let version = bytes[VERSION_OFFSET];
        if version != VERSION {
            return Err(IntegrityError::UnknownVersion(version));
        }
        let stored = u16::from_le_bytes([bytes[CRC_OFFSET], bytes[CRC_OFFSET + 1]]);
        let computed = crc16(&bytes[..CRC_OFFSET]);
        if stored != computed {
            return Err(IntegrityError::ChecksumMismatch { stored, computed });
        }

        let mut record = Self {
            current: [0; JOINT_COUNT],
            min: [0; JOINT_COUNT],
            max: [0; JOINT_COUNT],
            offset: [0; JOINT_COUNT],
        };
        record.current.copy_from_slice(&bytes[CURRENT_OFFSET..MIN_OFFSET]);
        record.min.copy_from_slice(&bytes[MIN_OFFSET..MAX_OFFSET]);
        record.max.copy_from_slice(&bytes[MAX_OFFSET..OFFSETS_OFFSET]);
        for (dst, &src) in record.offset.iter_mut().zip(bytes[OFFSETS_OFFSET..CRC_OFFSET].iter()) {
            *dst = src as i8;
        }
        Ok(record)
    }

    /// Calibration to install, sanitized
    ///
    /// Bounds are forced into 0-180 with `min <= max`; offsets into the
    /// stored range.
    pub fn calibration(&self) -> [JointCalibration; JOINT_COUNT] {
        let mut out = [JointCalibration {
            min: 0,
            max: SERVO_MAX_DEG,
            offset: 0,
        }; JOINT_COUNT];
        for (i, cal) in out.iter_mut().enumerate() {
            cal.min = self.min[i].min(SERVO_MAX_DEG);
            cal.max = self.max[i].clamp(cal.min, SERVO_MAX_DEG);
            cal.offset =
                (self.offset[i] as i16).clamp(-STORED_OFFSET_LIMIT, STORED_OFFSET_LIMIT) as i8;
        }
        out
    }

    /// Last known positions, clamped into the sanitized bounds
    pub fn positions(&self) -> Angles {
        let calibration = self.calibration();
        let mut out = [0; JOINT_COUNT];
        for (i, cal) in calibration.iter().enumerate() {
            out[i] = cal.clamp(self.current[i] as i16);
        }
        out
    }
}

/// Unchecksummed record written by older firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyRecord {
    pub current: [i32; JOINT_COUNT],
    pub min: [i32; JOINT_COUNT],
    pub max: [i32; JOINT_COUNT],
    pub offset: [i32; JOINT_COUNT],
}

impl LegacyRecord {
    pub fn decode(bytes: &[u8; LEGACY_RECORD_LEN]) -> Result<Self, IntegrityError> {
        if read_u32(bytes, 0) != MAGIC {
            return Err(IntegrityError::BadMagic);
        }
        let field = |n: usize| -> [i32; JOINT_COUNT] {
            let base = 4 + n * JOINT_COUNT * 4;
            core::array::from_fn(|j| read_i32(bytes, base + j * 4))
        };
        Ok(Self {
            current: field(0),
            min: field(1),
            max: field(2),
            offset: field(3),
        })
    }

    pub fn encode(&self) -> [u8; LEGACY_RECORD_LEN] {
        let mut out = [0u8; LEGACY_RECORD_LEN];
        out[0..4].copy_from_slice(&MAGIC.to_le_bytes());
        let fields = [&self.current, &self.min, &self.max, &self.offset];
        for (n, values) in fields.iter().enumerate() {
            for (j, v) in values.iter().enumerate() {
                let at = 4 + (n * JOINT_COUNT + j) * 4;
                out[at..at + 4].copy_from_slice(&v.to_le_bytes());
            }
        }
        out
    }

    /// Angles and bounds within 0-180, `min <= max`, offsets within the
    /// stored range
    pub fn is_plausible(&self) -> bool {
        let angle = |v: &i32| (0..=SERVO_MAX_DEG as i32).contains(v);
        let limit = STORED_OFFSET_LIMIT as i32;
        self.current.iter().all(angle)
            && self.min.iter().all(angle)
            && self.max.iter().all(angle)
            && self.min.iter().zip(self.max.iter()).all(|(lo, hi)| lo <= hi)
            && self.offset.iter().all(|v| (-limit..=limit).contains(v))
    }

    /// Convert to the compact layout, clamping into its field ranges
    pub fn migrate(&self) -> Record {
        let angle = |v: i32| v.clamp(0, SERVO_MAX_DEG as i32) as u8;
        let limit = STORED_OFFSET_LIMIT as i32;
        Record {
            current: self.current.map(angle),
            min: self.min.map(angle),
            max: self.max.map(angle),
            offset: self.offset.map(|v| v.clamp(-limit, limit) as i8),
        }
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_i32(bytes: &[u8], at: usize) -> i32 {
    read_u32(bytes, at) as i32
}
