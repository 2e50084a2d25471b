//! PWM hobby servo
//!
//! Maps 0-180 degrees linearly onto a pulse width between the servo's
//! minimum and maximum, expressed as a fraction of the PWM period.
//!
//! ```ignore
//! let mut servo = PwmServo::new(channel, ServoTiming::default());
//! servo.set_angle(90)?;
//! ```

use embedded_hal::pwm::SetDutyCycle;

/// Highest angle a servo accepts
pub const MAX_ANGLE: u8 = 180;

/// Pulse timing of a servo channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoTiming {
    /// Pulse width at 0 degrees
    pub min_pulse_us: u16,
    /// Pulse width at 180 degrees
    pub max_pulse_us: u16,
    /// PWM period (20 ms at 50 Hz)
    pub period_us: u16,
}

impl Default for ServoTiming {
    fn default() -> Self {
        Self {
            min_pulse_us: 544,
            max_pulse_us: 2400,
            period_us: 20_000,
        }
    }
}

impl ServoTiming {
    /// Pulse width for an angle, saturating above 180 degrees
    pub fn pulse_us(&self, degrees: u8) -> u16 {
        let degrees = degrees.min(MAX_ANGLE) as u32;
        let span = self.max_pulse_us.saturating_sub(self.min_pulse_us) as u32;
        self.min_pulse_us + (degrees * span / MAX_ANGLE as u32) as u16
    }
}

/// One servo on one PWM channel
pub struct PwmServo<P> {
    channel: P,
    timing: ServoTiming,
    /// Last angle successfully written
    angle: Option<u8>,
}

impl<P: SetDutyCycle> PwmServo<P> {
    /// Wrap a channel already configured for the servo's period
    pub fn new(channel: P, timing: ServoTiming) -> Self {
        Self {
            channel,
            timing,
            angle: None,
        }
    }

    pub fn timing(&self) -> &ServoTiming {
        &self.timing
    }

    /// Last angle written, `None` before the first write
    pub fn angle(&self) -> Option<u8> {
        self.angle
    }

    pub fn channel(&self) -> &P {
        &self.channel
    }

    /// Drive the horn to `degrees`
    pub fn set_angle(&mut self, degrees: u8) -> Result<(), P::Error> {
        let pulse = self.timing.pulse_us(degrees);
        self.channel
            .set_duty_cycle_fraction(pulse, self.timing.period_us)?;
        self.angle = Some(degrees.min(MAX_ANGLE));
        Ok(())
    }

    /// Stop sending pulses; most servos then go limp
    pub fn release(&mut self) -> Result<(), P::Error> {
        self.channel.set_duty_cycle_fully_off()?;
        self.angle = None;
        Ok(())
    }

    pub fn into_inner(self) -> P {
        self.channel
    }
}


#[cfg(test)]
mod tests {
    use super::mock::{MockPwm, MockPwmError};
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pulse_endpoints() {
        let timing = ServoTiming::default();
        assert_eq!(timing.pulse_us(0), 544);
        assert_eq!(timing.pulse_us(90), 1472);
        assert_eq!(timing.pulse_us(180), 2400);
        assert_eq!(timing.pulse_us(255), 2400);
    }

    #[test]
    fn test_duty_from_pulse() {
        let mut servo = PwmServo::new(MockPwm::new(), ServoTiming::default());
        assert_eq!(servo.angle(), None);

        servo.set_angle(90).unwrap();
        // 19999 * 1472 / 20000
        assert_eq!(servo.channel().duty, 1471);
        assert_eq!(servo.angle(), Some(90));
    }

    #[test]
    fn test_failed_write_keeps_last_angle() {
        let mut servo = PwmServo::new(MockPwm::new(), ServoTiming::default());
        servo.set_angle(30).unwrap();

        let mut channel = servo.into_inner();
        channel.fail = true;
        let mut servo = PwmServo::new(channel, ServoTiming::default());
        assert_eq!(servo.set_angle(60), Err(MockPwmError));
        assert_eq!(servo.angle(), None);
    }

    #[test]
    fn test_release() {
        let mut servo = PwmServo::new(MockPwm::new(), ServoTiming::default());
        servo.set_angle(180).unwrap();
        servo.release().unwrap();
        assert_eq!(servo.channel().duty, 0);
        assert_eq!(servo.angle(), None);
    }

    proptest! {
        #[test]
        fn prop_pulse_monotonic(a in 0u8..=180, b in 0u8..=180) {
            let timing = ServoTiming::default();
            if a <= b {
                prop_assert!(timing.pulse_us(a) <= timing.pulse_us(b));
            }
            prop_assert!(timing.pulse_us(a) >= timing.min_pulse_us);
            prop_assert!(timing.pulse_us(a) <= timing.max_pulse_us);
        }
    }
}
