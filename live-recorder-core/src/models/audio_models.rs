use serde::{Deserialize, Serialize};

/// Upper bound on the channels opened per stream, whatever the device offers.
pub const MAX_CAPTURE_CHANNELS: u16 = 2;

/// An audio input device as seen at enumeration time.
///
/// The snapshot goes stale if hardware changes; re-enumerate to refresh.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Device {
    /// Position in the host's device enumeration.
    pub index: usize,
    pub name: String,
    pub max_input_channels: u16,
}

impl Device {
    pub fn new(index: usize, name: impl Into<String>, max_input_channels: u16) -> Self {
        Self {
            index,
            name: name.into(),
            max_input_channels,
        }
    }

    pub fn is_input(&self) -> bool {
        self.max_input_channels > 0
    }

    /// Channel count to open on this device, capped at `max_channels`.
    pub fn capture_channels(&self, max_channels: u16) -> u16 {
        self.max_input_channels.min(max_channels)
    }

    /// Label used in device lists, e.g. `"Stereo Mix (input ch: 2)"`.
    pub fn display_label(&self) -> String {
        format!("{} (input ch: {})", self.name, self.max_input_channels)
    }
}

/// One delivery of interleaved samples from the device driver.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBlock {
    pub samples: Vec<f32>,
    pub frame_count: usize,
    pub channel_count: u16,
}

impl SampleBlock {
    /// Build a block from interleaved samples. A trailing partial frame is dropped.
    pub fn from_interleaved(mut samples: Vec<f32>, channel_count: u16) -> Self {
        let channels = channel_count.max(1) as usize;
        let frame_count = samples.len() / channels;
        samples.truncate(frame_count * channels);
        Self {
            samples,
            frame_count,
            channel_count,
        }
    }

    pub fn silence(frame_count: usize, channel_count: u16) -> Self {
        Self {
            samples: vec![0.0; frame_count * channel_count as usize],
            frame_count,
            channel_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }
}

/// A level meter reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelReading {
    pub decibels: f32,
    /// Linear map of [-60, 0] dB onto [0, 100]. Exceeds 100 when clipping.
    pub meter_percent: f32,
}

impl LevelReading {
    pub fn band(&self) -> LevelBand {
        LevelBand::from_percent(self.meter_percent)
    }
}

/// Color band a control surface should use for a meter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelBand {
    Normal,
    Warn,
    Hot,
}

impl LevelBand {
    pub fn from_percent(meter_percent: f32) -> Self {
        if meter_percent > 80.0 {
            Self::Hot
        } else if meter_percent > 60.0 {
            Self::Warn
        } else {
            Self::Normal
        }
    }
}
