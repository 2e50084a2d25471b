//! Arm configuration types
//!
//! Power-on joint limits, motion speed, and arm geometry. Everything here
//! has a safe default so the arm can start without stored calibration.

use serde::{Deserialize, Serialize};

use super::geometry::{ArmGeometry, NeutralAngles};
use crate::joint::JOINT_COUNT;

/// Default speed: milliseconds per degree of the slowest joint
pub const DEFAULT_MS_PER_DEGREE: u16 = 25;

/// Moves never take less than this, even for tiny deltas
pub const DEFAULT_MIN_MOVE_DURATION_MS: u32 = 300;

/// Motion timing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionConfig {
    /// Milliseconds allotted per degree of travel
    pub ms_per_degree: u16,
    /// Floor applied to speed-derived durations
    pub min_move_duration_ms: u32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            ms_per_degree: DEFAULT_MS_PER_DEGREE,
            min_move_duration_ms: DEFAULT_MIN_MOVE_DURATION_MS,
        }
    }
}

/// Software travel limits and start position for one joint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JointLimits {
    /// Lowest allowed logical angle
    pub min: u8,
    /// Highest allowed logical angle
    pub max: u8,
    /// Power-on logical angle
    pub neutral: u8,
}

impl JointLimits {
    /// Create limits for one joint
    pub const fn new(min: u8, max: u8, neutral: u8) -> Self {
        Self { min, max, neutral }
    }

    /// Full 0-180 travel, starting at 90
    pub const fn unrestricted() -> Self {
        Self::new(0, 180, 90)
    }

    /// Check the limits are ordered, in range, and contain the neutral
    pub fn is_valid(&self) -> bool {
        self.min <= self.max && self.max <= 180 && (self.min..=self.max).contains(&self.neutral)
    }
}

/// Safe power-on limits used when nothing valid is stored
///
/// Order: base, shoulder A, shoulder B, elbow, hand, wrist rotate, gripper.
pub const SAFE_LIMITS: [JointLimits; JOINT_COUNT] = [
    JointLimits::new(0, 180, 90),
    JointLimits::new(95, 180, 130),
    JointLimits::new(95, 180, 130),
    JointLimits::new(50, 180, 100),
    JointLimits::new(0, 180, 70),
    JointLimits::new(60, 180, 120),
    JointLimits::new(55, 155, 100),
];

/// Complete arm configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ArmConfig {
    /// Motion timing
    pub motion: MotionConfig,
    /// Per-joint power-on limits
    pub joints: [JointLimits; JOINT_COUNT],
    /// Link lengths and reach envelope
    pub geometry: ArmGeometry,
    /// Servo angle that corresponds to each kinematic zero
    pub neutral: NeutralAngles,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            motion: MotionConfig::default(),
            joints: SAFE_LIMITS,
            geometry: ArmGeometry::default(),
            neutral: NeutralAngles::default(),
        }
    }
}

impl ArmConfig {
    /// Same as default, but every joint may travel the full 0-180 range
    pub fn unrestricted() -> Self {
        Self {
            joints: [JointLimits::unrestricted(); JOINT_COUNT],
            ..Default::default()
        }
    }
}
