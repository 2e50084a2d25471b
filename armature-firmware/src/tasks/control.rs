//! Control task
//!
//! Owns the arm. Restores persisted state at boot, then runs the
//! cooperative loop: every tick advances motion and macro playback, and
//! commands from the channel are executed between ticks.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::pwm::PwmOutput;
use embassy_time::{Duration, Instant, Ticker};

use armature_core::persist::LoadOutcome;
use armature_core::sequencer::SequencerStatus;
use armature_core::{Arm, Command, Error};
use armature_drivers::servo::ServoBank;
use armature_hal_rp2040::FlashEeprom;

use crate::channels::{COMMAND_CHANNEL, TELEMETRY};

/// Control loop period
pub const CONTROL_INTERVAL_MS: u64 = 20;

/// Publish telemetry every this many ticks (100 ms)
const TELEMETRY_EVERY: u32 = 5;

/// The arm as wired on the board
pub type FirmwareArm = Arm<ServoBank<PwmOutput<'static>>, FlashEeprom<'static>>;

/// Control task - main coordination loop
#[embassy_executor::task]
pub async fn control_task(mut arm: FirmwareArm) {
    info!("Control task started");

    let start = Instant::now();
    let now_ms = || start.elapsed().as_millis() as u32;

    match arm.power_on(now_ms()) {
        Ok(LoadOutcome::Restored) => info!("Stored state restored, gliding to last pose"),
        Ok(LoadOutcome::Migrated) => warn!("Legacy record migrated and restored"),
        Err(Error::Integrity(e)) => warn!("Stored state rejected ({:?}), using safe defaults", e),
        Err(e) => error!("Restore failed: {:?}", e),
    }

    let mut ticker = Ticker::every(Duration::from_millis(CONTROL_INTERVAL_MS));
    let mut cycles: u32 = 0;
    let mut faults = 0;

    loop {
        match select(ticker.next(), COMMAND_CHANNEL.receive()).await {
            Either::First(()) => {
                let report = arm.tick(now_ms());
                match report.sequencer {
                    SequencerStatus::StepStarted(step) => debug!("Macro step {}", step),
                    SequencerStatus::Completed => info!("Macro finished"),
                    SequencerStatus::Aborted(e) => warn!("Macro aborted: {:?}", e),
                    SequencerStatus::Idle | SequencerStatus::Running => {}
                }

                let seen = arm.motion().servos().faults();
                if seen != faults {
                    warn!("Servo write failures: {}", seen);
                    faults = seen;
                }

                cycles = cycles.wrapping_add(1);
                if cycles % TELEMETRY_EVERY == 0 {
                    TELEMETRY.signal(arm.telemetry());
                }
            }

            Either::Second(command) => execute(&mut arm, command, now_ms()),
        }
    }
}

/// Run one command and log the outcome
fn execute(arm: &mut FirmwareArm, command: Command, now_ms: u32) {
    debug!("Command: {:?}", command);
    let commits = writes_store(&command);
    let starts_macro = matches!(command, Command::StartMacro(_));

    match arm.execute(command, now_ms) {
        Ok(response) => {
            debug!("Response: {:?}", response);
            if commits {
                info!("Persistent store committed");
            }
            if starts_macro {
                if let Some(name) = arm.sequencer().current_macro() {
                    info!("Macro {} started", name.as_str());
                }
            }
        }
        Err(e) => warn!("Command rejected: {:?}", e),
    }
}

/// Commands that end in a store commit when they succeed
fn writes_store(command: &Command) -> bool {
    matches!(
        command,
        Command::SavePose(_)
            | Command::DeletePose(_)
            | Command::SaveMacro { .. }
            | Command::DeleteMacro(_)
            | Command::SaveState
    )
}
