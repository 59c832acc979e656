use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, TimeZone};

use super::audio_models::MAX_CAPTURE_CHANNELS;

/// Configuration for a recorder process.
///
/// The sample rate is fixed for the life of the process.
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderConfiguration {
    /// Capture and output sample rate in Hz (default: 44100).
    pub sample_rate: u32,

    /// Integer PCM bit depth of the output file (default: 16). Valid values: 16, 24, 32.
    pub bit_depth: u16,

    /// Channel cap per stream (default: 2).
    pub max_channels: u16,

    /// Requested driver block size in frames, or None for the driver default.
    pub block_frames: Option<u32>,

    /// Directory for generated output paths.
    pub output_directory: PathBuf,

    /// File name prefix for generated output paths.
    pub file_prefix: String,

    /// Interval between elapsed-time updates while recording.
    pub elapsed_tick: Duration,

    /// Upper bound on device open and close.
    pub stream_timeout: Duration,
}

impl RecorderConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if ![16, 24, 32].contains(&self.bit_depth) {
            return Err(format!("unsupported bit depth: {}", self.bit_depth));
        }
        if self.max_channels == 0 {
            return Err("max channels must be at least 1".into());
        }
        if self.block_frames == Some(0) {
            return Err("block size must be positive".into());
        }
        if self.elapsed_tick.is_zero() {
            return Err("elapsed tick must be positive".into());
        }
        Ok(())
    }

    /// `<output_directory>/<file_prefix>YYYYMMDD_HHMMSS.wav`
    pub fn default_output_path<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> PathBuf
    where
        Tz::Offset: std::fmt::Display,
    {
        let stamp = now.format("%Y%m%d_%H%M%S");
        self.output_directory
            .join(format!("{}{}.wav", self.file_prefix, stamp))
    }
}

impl Default for RecorderConfiguration {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            bit_depth: 16,
            max_channels: MAX_CAPTURE_CHANNELS,
            block_frames: Some(4096),
            output_directory: PathBuf::from("audio_data"),
            file_prefix: "recorded_audio_".into(),
            elapsed_tick: Duration::from_secs(1),
            stream_timeout: Duration::from_secs(5),
        }
    }
}
