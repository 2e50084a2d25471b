//! Armature - Servo Robotic Arm Firmware
//!
//! Main firmware binary for RP2040-based seven-servo arm controllers.
//! Servos are driven from hardware PWM slices; calibration, poses and
//! macros live in an emulated EEPROM in the last flash sector.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use {defmt_rtt as _, panic_probe as _};

use armature_core::config::ArmConfig;
use armature_core::Arm;
use armature_drivers::servo::{ServoBank, ServoTiming};
use armature_hal_rp2040::FlashEeprom;

mod channels;
mod tasks;

/// 125 MHz system clock divided down to a 1 MHz PWM counter
const PWM_DIVIDER: u8 = 125;

/// Counter top for a 20 ms servo period
const PWM_TOP: u16 = 19_999;

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Armature firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let mut pwm_config = PwmConfig::default();
    pwm_config.divider = PWM_DIVIDER.into();
    pwm_config.top = PWM_TOP;

    // Servo signal pins are GPIO2-GPIO8, in joint order (PWM slices 1-4)
    let (base, shoulder_a) =
        Pwm::new_output_ab(p.PWM_SLICE1, p.PIN_2, p.PIN_3, pwm_config.clone()).split();
    let (shoulder_b, elbow) =
        Pwm::new_output_ab(p.PWM_SLICE2, p.PIN_4, p.PIN_5, pwm_config.clone()).split();
    let (hand, wrist_rotate) =
        Pwm::new_output_ab(p.PWM_SLICE3, p.PIN_6, p.PIN_7, pwm_config.clone()).split();
    let (gripper, _) = Pwm::new_output_a(p.PWM_SLICE4, p.PIN_8, pwm_config).split();

    let servos = ServoBank::new(
        [
            unwrap!(base),
            unwrap!(shoulder_a),
            unwrap!(shoulder_b),
            unwrap!(elbow),
            unwrap!(hand),
            unwrap!(wrist_rotate),
            unwrap!(gripper),
        ],
        ServoTiming::default(),
    );
    info!("Servo PWM initialized");

    let store = unwrap!(FlashEeprom::new(p.FLASH));
    info!("Emulated EEPROM loaded");

    let arm = Arm::new(servos, store, &ArmConfig::default());

    unwrap!(spawner.spawn(tasks::control_task(arm)));
    info!("All tasks spawned, firmware running");
}
