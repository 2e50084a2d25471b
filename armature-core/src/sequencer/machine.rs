//! Macro playback state machine
//!
//! The runner turns clock and motion observations into events; all state
//! changes go through [`SequencerState::transition`].

/// Playback states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerState {
    /// No macro running
    #[default]
    Idle,
    /// Waiting for the current step's move to finish
    Moving,
    /// Holding the current step's pose for its delay
    Waiting,
}

/// Events that drive playback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerEvent {
    /// A step's pose was found and its move issued
    StepStarted,
    /// The motion controller reported idle
    MotionSettled,
    /// Last step's delay elapsed
    Finished,
    /// A step's pose could not be loaded or moved to
    Abort,
    /// Explicit stop request
    Stop,
}

impl SequencerState {
    /// Check if a macro is in progress
    pub fn is_running(&self) -> bool {
        !matches!(self, SequencerState::Idle)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: SequencerEvent) -> Self {
        use SequencerEvent::*;
        use SequencerState::*;

        match (self, event) {
            (Idle, StepStarted) => Moving,

            (Moving, MotionSettled) => Waiting,

            (Waiting, StepStarted) => Moving,
            (Waiting, Finished) => Idle,

            // Stop and abort end playback from anywhere
            (_, Stop) | (_, Abort) => Idle,

            // Default: stay in current state
            _ => self,
        }
    }
}
