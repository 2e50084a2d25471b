//! Closed-form kinematics
//!
//! Two-link planar solver for shoulder and elbow, with base yaw from the
//! target bearing and wrist pitch chosen so the gripper points along the
//! line from the shoulder pivot to the target. Coordinates are millimeters
//! with the origin on the base plate under the shoulder, z up.

use core::f32::consts::PI;

use crate::config::{ArmGeometry, NeutralAngles};
use crate::error::Error;
use crate::joint::{Angles, Joint, JointState, JOINT_COUNT};

/// Distance below which the target sits on the shoulder pivot
const DEGENERATE_DISTANCE_MM: f32 = 1e-3;

/// Cartesian point in millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        libm::sqrtf(dx * dx + dy * dy + dz * dz)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

fn to_degrees(rad: f32) -> f32 {
    rad * (180.0 / PI)
}

fn to_radians(deg: f32) -> f32 {
    deg * (PI / 180.0)
}

/// Inverse and forward kinematics for the arm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    geometry: ArmGeometry,
    neutral: NeutralAngles,
}

impl Kinematics {
    pub fn new(geometry: ArmGeometry, neutral: NeutralAngles) -> Self {
        Self { geometry, neutral }
    }

    pub fn geometry(&self) -> &ArmGeometry {
        &self.geometry
    }

    /// Solve for unrounded servo angles
    ///
    /// Reach is clamped to the configured envelope, so an out-of-range
    /// target yields the closest pose along the same bearing and pitch.
    /// Shoulder B mirrors shoulder A, the wrist rotation follows the base,
    /// and the gripper stays at its neutral.
    pub fn solve_degrees(&self, target: Point3) -> Result<[f32; JOINT_COUNT], Error> {
        let g = &self.geometry;
        let n = &self.neutral;
        let Point3 { x, y, z } = target;

        let planar = libm::sqrtf(x * x + y * y);
        let base_deg = to_degrees(libm::atan2f(y, x)) + n.base;

        let elevation = z - g.base_height_mm;
        let distance = libm::sqrtf(planar * planar + elevation * elevation);
        if !(distance >= DEGENERATE_DISTANCE_MM) {
            return Err(Error::DegenerateGeometry);
        }

        let extension = g.wrist_extension_mm();
        let floor = extension + g.reach_margin_mm;
        let clipped = distance.clamp(g.min_reach_mm, g.max_reach_mm).max(floor);
        let wrist_distance = (clipped - extension).max(g.reach_margin_mm);

        // Wrist point on the line from the shoulder to the target
        let scale = wrist_distance / distance;
        let wx = planar * scale;
        let wz = elevation * scale;

        let l1 = g.upper_arm_mm;
        let l2 = g.forearm_mm;
        let cos_elbow =
            ((wx * wx + wz * wz - l1 * l1 - l2 * l2) / (2.0 * l1 * l2)).clamp(-1.0, 1.0);
        let elbow = libm::acosf(cos_elbow);
        let shoulder = libm::atan2f(wz, wx)
            - libm::atan2f(l2 * libm::sinf(elbow), l1 + l2 * libm::cosf(elbow));
        if !shoulder.is_finite() || !elbow.is_finite() {
            return Err(Error::DegenerateGeometry);
        }

        let mut pitch = libm::atan2f(elevation, planar);
        if !pitch.is_finite() {
            pitch = 0.0;
        }
        let wrist = pitch - (shoulder + elbow);

        let shoulder_deg = to_degrees(shoulder) + n.shoulder;
        let mut out = [0.0; JOINT_COUNT];
        out[Joint::Base.index()] = base_deg;
        out[Joint::ShoulderA.index()] = shoulder_deg;
        out[Joint::ShoulderB.index()] = shoulder_deg;
        out[Joint::Elbow.index()] = to_degrees(elbow) + n.elbow;
        out[Joint::Hand.index()] = to_degrees(wrist) + n.hand;
        out[Joint::WristRotate.index()] = n.wrist_rotate + (base_deg - n.base);
        out[Joint::Gripper.index()] = n.gripper;
        Ok(out)
    }

    /// Solve and round to whole degrees inside each joint's limits
    pub fn solve(&self, target: Point3, joints: &JointState) -> Result<Angles, Error> {
        let degrees = self.solve_degrees(target)?;
        let mut out = [0; JOINT_COUNT];
        for joint in Joint::ALL {
            let rounded = libm::roundf(degrees[joint.index()]) as i16;
            out[joint.index()] = joints.calibration(joint).clamp(rounded);
        }
        Ok(out)
    }

    /// Fingertip position for unrounded servo angles
    pub fn estimate_degrees(&self, angles: &[f32; JOINT_COUNT]) -> Result<Point3, Error> {
        let g = &self.geometry;
        let n = &self.neutral;

        let base = to_radians(angles[Joint::Base.index()] - n.base);
        let shoulder = to_radians(angles[Joint::ShoulderA.index()] - n.shoulder);
        let elbow = to_radians(angles[Joint::Elbow.index()] - n.elbow);
        let wrist = to_radians(angles[Joint::Hand.index()] - n.hand);

        let a2 = shoulder;
        let a3 = a2 + elbow;
        let a4 = a3 + wrist;
        let extension = g.wrist_extension_mm();

        let reach = libm::cosf(a2) * g.upper_arm_mm
            + libm::cosf(a3) * g.forearm_mm
            + libm::cosf(a4) * extension;
        let rise = libm::sinf(a2) * g.upper_arm_mm
            + libm::sinf(a3) * g.forearm_mm
            + libm::sinf(a4) * extension;

        let point = Point3::new(
            reach * libm::cosf(base),
            reach * libm::sinf(base),
            g.base_height_mm + rise,
        );
        if !point.is_finite() {
            return Err(Error::DegenerateGeometry);
        }
        Ok(point)
    }

    /// Fingertip position for whole-degree servo angles
    pub fn estimate(&self, angles: &Angles) -> Result<Point3, Error> {
        let mut degrees = [0.0; JOINT_COUNT];
        for (d, a) in degrees.iter_mut().zip(angles.iter()) {
            *d = *a as f32;
        }
        self.estimate_degrees(&degrees)
    }
}
