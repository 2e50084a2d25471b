//! Joint state
//!
//! Calibration and logical position for every servo channel. The logical
//! angle is what the controller believes the joint is at; the physical
//! angle is what actually goes to the servo after the calibration offset.

use serde::{Deserialize, Serialize};

use crate::config::ArmConfig;
use crate::error::ValidationError;

/// Number of servo channels on the arm
pub const JOINT_COUNT: usize = 7;

/// Largest offset accepted from a calibration command
pub const OFFSET_LIMIT: i16 = 90;

/// Largest offset the compact record can hold
pub const STORED_OFFSET_LIMIT: i16 = 127;

/// Servo travel in degrees
pub const SERVO_MAX_DEG: u8 = 180;

/// Integer angle per joint, as requested, stored and reported
pub type Angles = [i16; JOINT_COUNT];

/// Servo channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Joint {
    Base,
    ShoulderA,
    ShoulderB,
    Elbow,
    /// Wrist pitch
    Hand,
    WristRotate,
    Gripper,
}

impl Joint {
    /// All joints in channel order
    pub const ALL: [Joint; JOINT_COUNT] = [
        Joint::Base,
        Joint::ShoulderA,
        Joint::ShoulderB,
        Joint::Elbow,
        Joint::Hand,
        Joint::WristRotate,
        Joint::Gripper,
    ];

    /// Channel index
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up a joint by channel index
    pub fn from_index(index: u8) -> Result<Self, ValidationError> {
        Self::ALL
            .get(index as usize)
            .copied()
            .ok_or(ValidationError::JointIndex(index))
    }

    /// Short display name
    pub fn name(self) -> &'static str {
        match self {
            Joint::Base => "base",
            Joint::ShoulderA => "shoulder_a",
            Joint::ShoulderB => "shoulder_b",
            Joint::Elbow => "elbow",
            Joint::Hand => "hand",
            Joint::WristRotate => "wrist",
            Joint::Gripper => "gripper",
        }
    }
}

/// Software limits and output correction for one joint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JointCalibration {
    /// Lowest allowed logical angle
    pub min: u8,
    /// Highest allowed logical angle
    pub max: u8,
    /// Added to the logical angle before writing to the servo
    pub offset: i8,
}

impl JointCalibration {
    /// Clamp a requested angle into this joint's travel
    pub fn clamp(&self, angle: i16) -> i16 {
        angle.clamp(self.min as i16, self.max as i16)
    }

    /// Reject an angle outside this joint's travel
    pub fn check(&self, joint: Joint, angle: i16) -> Result<(), ValidationError> {
        if angle < self.min as i16 || angle > self.max as i16 {
            return Err(ValidationError::AngleOutOfBounds {
                joint: joint.index() as u8,
                angle,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Physical servo angle for a logical angle
    pub fn physical(&self, angle: i16) -> u8 {
        (angle + self.offset as i16).clamp(0, SERVO_MAX_DEG as i16) as u8
    }
}

/// One line of the calibration report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JointReport {
    pub joint: Joint,
    pub current: i16,
    pub min: u8,
    pub max: u8,
    pub offset: i8,
    /// Angle currently sent to the servo
    pub physical: u8,
}

/// Logical positions and calibration of every joint
#[derive(Debug, Clone, PartialEq)]
pub struct JointState {
    logical: [f32; JOINT_COUNT],
    calibration: [JointCalibration; JOINT_COUNT],
}

impl JointState {
    /// Power-on state: safe limits, zero offsets, joints at neutral
    pub fn from_config(config: &ArmConfig) -> Self {
        let mut logical = [0.0; JOINT_COUNT];
        let mut calibration = [JointCalibration {
            min: 0,
            max: SERVO_MAX_DEG,
            offset: 0,
        }; JOINT_COUNT];

        for (i, limits) in config.joints.iter().enumerate() {
            logical[i] = limits.neutral as f32;
            calibration[i].min = limits.min;
            calibration[i].max = limits.max;
        }

        Self {
            logical,
            calibration,
        }
    }

    /// Interpolated logical angle
    pub fn logical(&self, joint: Joint) -> f32 {
        self.logical[joint.index()]
    }

    /// Logical angle rounded to whole degrees
    pub fn angle(&self, joint: Joint) -> i16 {
        libm::roundf(self.logical[joint.index()]) as i16
    }

    /// All logical angles rounded to whole degrees
    pub fn angles(&self) -> Angles {
        let mut out = [0; JOINT_COUNT];
        for joint in Joint::ALL {
            out[joint.index()] = self.angle(joint);
        }
        out
    }

    /// Raw logical angles
    pub fn logical_angles(&self) -> &[f32; JOINT_COUNT] {
        &self.logical
    }

    pub fn calibration(&self, joint: Joint) -> &JointCalibration {
        &self.calibration[joint.index()]
    }

    pub fn calibrations(&self) -> &[JointCalibration; JOINT_COUNT] {
        &self.calibration
    }

    /// Angle written to the servo for the current logical position
    pub fn physical(&self, joint: Joint) -> u8 {
        self.calibration(joint).physical(self.angle(joint))
    }

    /// Validate a full target vector against the current limits
    pub fn check(&self, target: &Angles) -> Result<(), ValidationError> {
        for joint in Joint::ALL {
            self.calibration(joint).check(joint, target[joint.index()])?;
        }
        Ok(())
    }

    /// Clamp every element of a target vector into its joint's travel
    pub fn clamp(&self, target: &Angles) -> Angles {
        let mut out = *target;
        for (angle, cal) in out.iter_mut().zip(self.calibration.iter()) {
            *angle = cal.clamp(*angle);
        }
        out
    }

    /// Calibration report line for one joint
    pub fn report(&self, joint: Joint) -> JointReport {
        let cal = self.calibration(joint);
        JointReport {
            joint,
            current: self.angle(joint),
            min: cal.min,
            max: cal.max,
            offset: cal.offset,
            physical: self.physical(joint),
        }
    }

    pub(crate) fn set_logical(&mut self, joint: Joint, angle: f32) {
        self.logical[joint.index()] = angle;
    }

    pub(crate) fn calibration_mut(&mut self, joint: Joint) -> &mut JointCalibration {
        &mut self.calibration[joint.index()]
    }

    pub(crate) fn set_calibrations(&mut self, calibration: [JointCalibration; JOINT_COUNT]) {
        self.calibration = calibration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_index() {
        assert_eq!(Joint::from_index(0), Ok(Joint::Base));
        assert_eq!(Joint::from_index(6), Ok(Joint::Gripper));
        assert_eq!(
            Joint::from_index(7),
            Err(ValidationError::JointIndex(7))
        );
        for (i, joint) in Joint::ALL.iter().enumerate() {
            assert_eq!(joint.index(), i);
        }
    }

    #[test]
    fn test_physical_clamped() {
        let cal = JointCalibration {
            min: 0,
            max: 180,
            offset: 15,
        };
        assert_eq!(cal.physical(90), 105);
        assert_eq!(cal.physical(175), 180);

        let cal = JointCalibration {
            min: 0,
            max: 180,
            offset: -20,
        };
        assert_eq!(cal.physical(10), 0);
    }

    #[test]
    fn test_check_bounds() {
        let state = JointState::from_config(&ArmConfig::default());
        let mut target = state.angles();
        assert!(state.check(&target).is_ok());

        // Shoulder A lower limit is 95
        target[1] = 94;
        assert_eq!(
            state.check(&target),
            Err(ValidationError::AngleOutOfBounds {
                joint: 1,
                angle: 94,
                min: 95,
                max: 180
            })
        );
    }

    #[test]
    fn test_power_on_neutral() {
        let state = JointState::from_config(&ArmConfig::default());
        assert_eq!(state.angles(), [90, 130, 130, 100, 70, 120, 100]);
        assert_eq!(state.calibration(Joint::Gripper).max, 155);
        assert_eq!(state.physical(Joint::Elbow), 100);
    }

    #[test]
    fn test_report() {
        let mut state = JointState::from_config(&ArmConfig::default());
        state.calibration_mut(Joint::Base).offset = -5;
        state.set_logical(Joint::Base, 44.6);

        let line = state.report(Joint::Base);
        assert_eq!(line.current, 45);
        assert_eq!(line.offset, -5);
        assert_eq!(line.physical, 40);
    }
}
