use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Result of a completed recording.
///
/// `CaptureSession` produces it without a checksum; `RecordingWriter`
/// fills the checksum in once the file is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingResult {
    pub path: PathBuf,
    /// Wall-clock time between start and stop.
    pub duration_secs: f64,
    pub frame_count: u64,
    pub sample_rate: u32,
    pub channels: u16,
    /// RFC 3339 timestamp of the recording start.
    pub created_at: String,
    /// SHA-256 hex digest of the written file.
    pub checksum: Option<String>,
}

impl RecordingResult {
    pub fn has_audio(&self) -> bool {
        self.frame_count > 0
    }

    /// Duration of the captured audio itself, from the frame count.
    pub fn audio_duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count as f64 / self.sample_rate as f64
    }

    pub fn formatted_duration(&self) -> String {
        format_elapsed(Duration::from_secs_f64(self.duration_secs.max(0.0)))
    }
}

/// Format a duration as zero-padded `HH:MM:SS`, truncating fractions.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
