use std::fmt;

use serde::{Deserialize, Serialize};

/// Session controller state machine.
///
/// State transitions:
/// ```text
/// idle ⇄ monitoring
///   ↓        ↓
/// recording ─→ idle (→ monitoring)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Monitoring,
    Recording,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_monitoring(&self) -> bool {
        matches!(self, Self::Monitoring)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Monitoring => "monitoring",
            Self::Recording => "recording",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which stream, if any, a `CaptureSession` has open.
///
/// ```text
/// closed → monitoring → closed
/// closed → recording  → closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureMode {
    Closed,
    Monitoring,
    Recording,
}

impl CaptureMode {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}
