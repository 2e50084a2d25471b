//! Servo drivers
//!
//! Standard hobby servos take a pulse every 20 ms whose width selects the
//! horn angle. The timing is board independent; channels are anything that
//! implements `embedded_hal::pwm::SetDutyCycle`.

pub mod bank;
pub mod pwm;

pub use bank::ServoBank;
pub use pwm::{PwmServo, ServoTiming};
