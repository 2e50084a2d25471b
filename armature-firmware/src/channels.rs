//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! Front ends (serial console, remote bridge) push typed commands and read
//! telemetry; only the control task touches the arm.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use armature_core::{Command, Telemetry};

/// Channel capacity for pending commands
const COMMAND_CHANNEL_SIZE: usize = 4;

/// Commands for the arm, executed in arrival order
pub static COMMAND_CHANNEL: Channel<CriticalSectionRawMutex, Command, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Latest status and joint angles (updated by the control task)
pub static TELEMETRY: Signal<CriticalSectionRawMutex, Telemetry> = Signal::new();
