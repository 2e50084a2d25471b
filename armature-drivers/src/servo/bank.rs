//! Servo bank
//!
//! One PWM servo per joint, addressed by joint index. Implements the core
//! actuator trait so the motion controller can drive real hardware.

use armature_core::traits::ServoOutput;
use armature_core::JOINT_COUNT;
use embedded_hal::pwm::SetDutyCycle;

use super::pwm::{PwmServo, ServoTiming};

/// All joint servos of the arm
pub struct ServoBank<P> {
    servos: [PwmServo<P>; JOINT_COUNT],
    faults: u32,
}

impl<P: SetDutyCycle> ServoBank<P> {
    /// Build a bank from one channel per joint, in joint order
    pub fn new(channels: [P; JOINT_COUNT], timing: ServoTiming) -> Self {
        Self {
            servos: channels.map(|channel| PwmServo::new(channel, timing)),
            faults: 0,
        }
    }

    pub fn servo(&self, joint: usize) -> Option<&PwmServo<P>> {
        self.servos.get(joint)
    }

    /// Number of channel writes that failed since creation
    pub fn faults(&self) -> u32 {
        self.faults
    }
}

impl<P: SetDutyCycle> ServoOutput for ServoBank<P> {
    fn write(&mut self, joint: usize, physical_deg: u8) {
        let Some(servo) = self.servos.get_mut(joint) else {
            return;
        };
        if servo.set_angle(physical_deg).is_err() {
            self.faults = self.faults.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::pwm::mock::MockPwm;
    use super::*;
    use armature_core::config::ArmConfig;
    use armature_core::motion::MotionController;

    fn bank() -> ServoBank<MockPwm> {
        ServoBank::new(core::array::from_fn(|_| MockPwm::new()), ServoTiming::default())
    }

    #[test]
    fn test_write_routes_to_joint() {
        let mut bank = bank();
        bank.write(3, 180);

        assert_eq!(bank.servo(3).unwrap().angle(), Some(180));
        assert_eq!(bank.servo(2).unwrap().angle(), None);
        assert_eq!(bank.faults(), 0);
    }

    #[test]
    fn test_out_of_range_joint_ignored() {
        let mut bank = bank();
        bank.write(JOINT_COUNT, 90);
        assert!(bank.servo(JOINT_COUNT).is_none());
        assert_eq!(bank.faults(), 0);
    }

    #[test]
    fn test_failed_channel_counts_fault() {
        let mut channels: [MockPwm; JOINT_COUNT] = core::array::from_fn(|_| MockPwm::new());
        channels[0].fail = true;
        let mut bank = ServoBank::new(channels, ServoTiming::default());

        bank.write(0, 10);
        bank.write(1, 10);
        assert_eq!(bank.faults(), 1);
        assert_eq!(bank.servo(1).unwrap().angle(), Some(10));
    }

    #[test]
    fn test_drives_motion_controller() {
        let mut motion = MotionController::new(bank(), &ArmConfig::default());
        motion.write_all();

        let neutral = [90u8, 130, 130, 100, 70, 120, 100];
        for (joint, angle) in neutral.iter().enumerate() {
            assert_eq!(motion.servos().servo(joint).unwrap().angle(), Some(*angle));
        }
    }
}
