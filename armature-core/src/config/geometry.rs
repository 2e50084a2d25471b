//! Arm geometry for the kinematics solver
//!
//! All lengths in millimeters, all angles in servo degrees.

use serde::{Deserialize, Serialize};

/// Link lengths and reach envelope
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ArmGeometry {
    /// Shoulder pivot height above the base plate
    pub base_height_mm: f32,
    /// Shoulder to elbow
    pub upper_arm_mm: f32,
    /// Elbow to wrist
    pub forearm_mm: f32,
    /// Wrist pivot to gripper mount
    pub wrist_offset_mm: f32,
    /// Gripper mount to fingertip
    pub gripper_mm: f32,
    /// Closest reachable distance from the shoulder pivot
    pub min_reach_mm: f32,
    /// Farthest reachable distance from the shoulder pivot
    pub max_reach_mm: f32,
    /// Minimum wrist distance kept beyond the wrist+gripper extension
    pub reach_margin_mm: f32,
}

impl Default for ArmGeometry {
    fn default() -> Self {
        Self {
            base_height_mm: 70.0,
            upper_arm_mm: 105.0,
            forearm_mm: 98.0,
            wrist_offset_mm: 30.0,
            gripper_mm: 60.0,
            min_reach_mm: 100.0,
            max_reach_mm: 290.0,
            reach_margin_mm: 5.0,
        }
    }
}

impl ArmGeometry {
    /// Fixed extension from wrist pivot to fingertip
    pub fn wrist_extension_mm(&self) -> f32 {
        self.wrist_offset_mm + self.gripper_mm
    }
}

/// Servo angle at which each joint sits at its kinematic zero
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NeutralAngles {
    pub base: f32,
    pub shoulder: f32,
    pub elbow: f32,
    pub hand: f32,
    pub wrist_rotate: f32,
    pub gripper: f32,
}

impl Default for NeutralAngles {
    fn default() -> Self {
        Self {
            base: 90.0,
            shoulder: 90.0,
            elbow: 0.0,
            hand: 90.0,
            wrist_rotate: 90.0,
            gripper: 90.0,
        }
    }
}
