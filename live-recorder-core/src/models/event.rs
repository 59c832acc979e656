use serde::{Deserialize, Serialize};

use super::audio_models::LevelReading;
use super::error::{ErrorKind, RecorderError};
use super::recording_result::RecordingResult;
use super::state::SessionState;
use crate::traits::recorder_delegate::RecorderDelegate;

/// Sending half of the controller's event queue.
pub type EventSender = crossbeam_channel::Sender<RecorderEvent>;

/// State updates delivered to the control surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RecorderEvent {
    LevelUpdated { meter_percent: f32, decibels: f32 },
    ElapsedTimeUpdated { elapsed: String },
    StateChanged { state: SessionState },
    RecordingCompleted { result: RecordingResult },
    ErrorOccurred { kind: ErrorKind, message: String },
}

impl RecorderEvent {
    pub fn level(reading: LevelReading) -> Self {
        Self::LevelUpdated {
            meter_percent: reading.meter_percent,
            decibels: reading.decibels,
        }
    }

    pub fn error(err: &RecorderError) -> Self {
        Self::ErrorOccurred {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Hand the event to the matching delegate callback.
    pub fn dispatch(&self, delegate: &dyn RecorderDelegate) {
        match self {
            Self::LevelUpdated {
                meter_percent,
                decibels,
            } => delegate.on_level_updated(&LevelReading {
                decibels: *decibels,
                meter_percent: *meter_percent,
            }),
            Self::ElapsedTimeUpdated { elapsed } => delegate.on_elapsed_time_updated(elapsed),
            Self::StateChanged { state } => delegate.on_state_changed(*state),
            Self::RecordingCompleted { result } => delegate.on_recording_completed(result),
            Self::ErrorOccurred { kind, message } => delegate.on_error(*kind, message),
        }
    }
}
