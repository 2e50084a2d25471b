//! Non-blocking joint interpolation
//!
//! The controller owns the joint state and at most one active move. A new
//! move always starts from the current logical angles, so a retarget issued
//! mid-flight continues smoothly from wherever the arm is now.

use super::ease::ease_in_out;
use crate::config::{ArmConfig, MotionConfig};
use crate::error::{Error, ValidationError};
use crate::joint::{
    Angles, Joint, JointCalibration, JointState, JOINT_COUNT, OFFSET_LIMIT, SERVO_MAX_DEG,
};
use crate::traits::ServoOutput;

/// The single in-flight interpolation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveMove {
    /// Logical angles when the move was issued
    pub start: [f32; JOINT_COUNT],
    /// Clamped target angles
    pub target: Angles,
    /// Clock value when the move was issued
    pub start_ms: u32,
    /// Always non-zero
    pub duration_ms: u32,
}

impl ActiveMove {
    /// Fraction of the duration elapsed at `now_ms`, saturating at 1.0
    pub fn progress(&self, now_ms: u32) -> f32 {
        let elapsed = now_ms.wrapping_sub(self.start_ms);
        if elapsed >= self.duration_ms {
            1.0
        } else {
            elapsed as f32 / self.duration_ms as f32
        }
    }
}

/// Result of one controller update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionStatus {
    /// No move active
    Idle,
    /// Move in progress, joints written at interpolated angles
    Moving,
    /// Move finished on this update, joints written at their exact targets
    Arrived,
}

/// Motion controller
///
/// Joint state mutation funnels through here: moves change logical angles,
/// calibration operations change limits and offsets.
pub struct MotionController<S> {
    servos: S,
    joints: JointState,
    config: MotionConfig,
    active: Option<ActiveMove>,
}

impl<S: ServoOutput> MotionController<S> {
    /// Create a controller at the power-on neutral pose
    ///
    /// Nothing is written to the servos until [`write_all`](Self::write_all)
    /// or the first move.
    pub fn new(servos: S, config: &ArmConfig) -> Self {
        Self {
            servos,
            joints: JointState::from_config(config),
            config: config.motion,
            active: None,
        }
    }

    pub fn joints(&self) -> &JointState {
        &self.joints
    }

    pub fn motion_config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn servos(&self) -> &S {
        &self.servos
    }

    pub fn servos_mut(&mut self) -> &mut S {
        &mut self.servos
    }

    pub fn active_move(&self) -> Option<&ActiveMove> {
        self.active.as_ref()
    }

    pub fn is_moving(&self) -> bool {
        self.active.is_some()
    }

    /// Start a move toward `target` over `duration_ms`
    ///
    /// The whole request is rejected if any joint is outside its limits;
    /// an in-flight move is left untouched in that case. A zero duration
    /// applies the target immediately and cancels any active move.
    pub fn start_move(
        &mut self,
        target: &Angles,
        duration_ms: u32,
        now_ms: u32,
    ) -> Result<(), Error> {
        self.joints.check(target)?;
        let target = self.joints.clamp(target);

        if duration_ms == 0 {
            self.active = None;
            for joint in Joint::ALL {
                self.joints.set_logical(joint, target[joint.index()] as f32);
            }
            self.write_all();
            return Ok(());
        }

        // Every joint restarts from its current logical angle, including
        // joints whose target did not change.
        self.active = Some(ActiveMove {
            start: *self.joints.logical_angles(),
            target,
            start_ms: now_ms,
            duration_ms,
        });
        Ok(())
    }

    /// Start a move, deriving the duration from speed when none is given
    pub fn move_to(
        &mut self,
        target: &Angles,
        duration_ms: Option<u32>,
        now_ms: u32,
    ) -> Result<(), Error> {
        self.joints.check(target)?;
        let duration = match duration_ms {
            Some(d) => d,
            None => self.duration_by_speed(target),
        };
        self.start_move(target, duration, now_ms)
    }

    /// Duration for the slowest joint to reach `target` at configured speed
    ///
    /// Never below the configured minimum, even when nothing moves.
    pub fn duration_by_speed(&self, target: &Angles) -> u32 {
        let clamped = self.joints.clamp(target);
        let current = self.joints.angles();

        let max_delta = clamped
            .iter()
            .zip(current.iter())
            .map(|(t, c)| (t - c).unsigned_abs() as u32)
            .max()
            .unwrap_or(0);

        (max_delta * self.config.ms_per_degree as u32).max(self.config.min_move_duration_ms)
    }

    /// Advance the active move to `now_ms`
    ///
    /// Safe to call at any cadence; does nothing while idle.
    pub fn update(&mut self, now_ms: u32) -> MotionStatus {
        let Some(active) = self.active else {
            return MotionStatus::Idle;
        };

        let progress = active.progress(now_ms);
        if progress >= 1.0 {
            for joint in Joint::ALL {
                self.joints
                    .set_logical(joint, active.target[joint.index()] as f32);
            }
            self.active = None;
            self.write_all();
            return MotionStatus::Arrived;
        }

        let eased = ease_in_out(progress);
        for joint in Joint::ALL {
            let i = joint.index();
            let start = active.start[i];
            let angle = start + (active.target[i] as f32 - start) * eased;
            self.joints.set_logical(joint, angle);
        }
        self.write_all();
        MotionStatus::Moving
    }

    /// Write every joint's physical angle
    pub fn write_all(&mut self) {
        for joint in Joint::ALL {
            self.write_joint(joint);
        }
    }

    fn write_joint(&mut self, joint: Joint) {
        let physical = self.joints.physical(joint);
        self.servos.write(joint.index(), physical);
    }

    /// Set the lower travel limit of one joint
    ///
    /// The current angle is not moved; the next accepted move brings the
    /// joint back inside the new limits.
    pub fn set_min(&mut self, joint: Joint, angle: i16) -> Result<(), Error> {
        let min = check_bound(angle)?;
        let cal = self.joints.calibration_mut(joint);
        if min > cal.max {
            return Err(ValidationError::InvertedBounds { min, max: cal.max }.into());
        }
        cal.min = min;
        Ok(())
    }

    /// Set the upper travel limit of one joint
    pub fn set_max(&mut self, joint: Joint, angle: i16) -> Result<(), Error> {
        let max = check_bound(angle)?;
        let cal = self.joints.calibration_mut(joint);
        if max < cal.min {
            return Err(ValidationError::InvertedBounds { min: cal.min, max }.into());
        }
        cal.max = max;
        Ok(())
    }

    /// Set the output offset of one joint and write it once
    pub fn set_offset(&mut self, joint: Joint, offset: i16) -> Result<(), Error> {
        if !(-OFFSET_LIMIT..=OFFSET_LIMIT).contains(&offset) {
            return Err(ValidationError::OffsetOutOfRange(offset).into());
        }
        self.joints.calibration_mut(joint).offset = offset as i8;
        self.write_joint(joint);
        Ok(())
    }

    /// Replace every joint's calibration, as restored from storage
    pub(crate) fn install_calibration(&mut self, calibration: [JointCalibration; JOINT_COUNT]) {
        self.joints.set_calibrations(calibration);
    }
}

fn check_bound(angle: i16) -> Result<u8, ValidationError> {
    if !(0..=SERVO_MAX_DEG as i16).contains(&angle) {
        return Err(ValidationError::BoundOutOfRange(angle));
    }
    Ok(angle as u8)
}
