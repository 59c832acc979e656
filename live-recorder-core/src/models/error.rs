use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by device enumeration, capture, and file output.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("device query failed: {0}")]
    DeviceQuery(String),

    #[error("failed to open device {index}: {reason}")]
    DeviceOpen { index: usize, reason: String },

    #[error("output path is empty")]
    InvalidOutputPath,

    #[error("no audio captured")]
    EmptyBuffer,

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("stream failed: {0}")]
    StreamFailed(String),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("configuration failed: {0}")]
    Configuration(String),

    #[error("playback failed: {0}")]
    Playback(String),
}

impl RecorderError {
    pub fn device_open(index: usize, reason: impl Into<String>) -> Self {
        Self::DeviceOpen {
            index,
            reason: reason.into(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DeviceQuery(_) => ErrorKind::DeviceQuery,
            Self::DeviceOpen { .. } => ErrorKind::DeviceOpen,
            Self::InvalidOutputPath => ErrorKind::InvalidOutputPath,
            Self::EmptyBuffer => ErrorKind::EmptyBuffer,
            Self::Write { .. } => ErrorKind::Write,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::StreamFailed(_) => ErrorKind::StreamFailed,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Playback(_) => ErrorKind::Playback,
        }
    }
}

/// Serializable error category carried by `ErrorOccurred` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DeviceQuery,
    DeviceOpen,
    InvalidOutputPath,
    EmptyBuffer,
    Write,
    InvalidState,
    StreamFailed,
    Timeout,
    Configuration,
    Playback,
}

impl ErrorKind {
    /// Whether the failure is informational rather than something that went wrong.
    pub fn is_informational(self) -> bool {
        matches!(self, Self::EmptyBuffer)
    }
}
