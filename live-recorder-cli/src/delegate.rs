use std::cell::RefCell;
use std::io::{self, Write};

use serde::Serialize;

use live_recorder_core::{
    Device, ErrorKind, LevelBand, LevelReading, RecorderDelegate, RecordingResult, SessionState,
};

const METER_WIDTH: usize = 30;

/// RecorderDelegate that draws a live meter line on the terminal.
///
/// Level updates redraw the current line in place; every other event
/// clears it and prints on a line of its own.
#[derive(Default)]
pub struct ConsoleDelegate {
    elapsed: RefCell<Option<String>>,
}

impl ConsoleDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear_line(&self) {
        print!("\r{:width$}\r", "", width = METER_WIDTH + 32);
    }
}

impl RecorderDelegate for ConsoleDelegate {
    fn on_state_changed(&self, state: SessionState) {
        self.clear_line();
        if !state.is_recording() {
            self.elapsed.borrow_mut().take();
        }
        println!("[{}]", state);
    }

    fn on_level_updated(&self, reading: &LevelReading) {
        let meter = render_meter(reading, METER_WIDTH);
        match self.elapsed.borrow().as_deref() {
            Some(elapsed) => print!("\r{} {}", elapsed, meter),
            None => print!("\r{}", meter),
        }
        let _ = io::stdout().flush();
    }

    fn on_elapsed_time_updated(&self, elapsed: &str) {
        *self.elapsed.borrow_mut() = Some(elapsed.to_string());
    }

    fn on_recording_completed(&self, result: &RecordingResult) {
        self.clear_line();
        println!(
            "Saved {} ({}, {} frames, {} ch, {} Hz)",
            result.path.display(),
            result.formatted_duration(),
            result.frame_count,
            result.channels,
            result.sample_rate
        );
        if let Some(checksum) = &result.checksum {
            println!("  sha256 {}", checksum);
        }
    }

    fn on_error(&self, kind: ErrorKind, message: &str) {
        self.clear_line();
        if kind.is_informational() {
            println!("{}", message);
        } else {
            eprintln!("error: {}", message);
        }
    }
}

/// `[#####-----]  -12.3 dB !` for one reading. Warn adds `!`, Hot `!!`.
pub fn render_meter(reading: &LevelReading, width: usize) -> String {
    let fraction = reading.meter_percent.clamp(0.0, 100.0) / 100.0;
    let filled = ((fraction * width as f32).round() as usize).min(width);
    let marker = match reading.band() {
        LevelBand::Normal => "",
        LevelBand::Warn => " !",
        LevelBand::Hot => " !!",
    };
    format!(
        "[{}{}] {:6.1} dB{}",
        "#".repeat(filled),
        "-".repeat(width - filled),
        reading.decibels,
        marker
    )
}

// -- Serializable device listing --

#[derive(Clone, Serialize)]
pub struct DeviceInfo {
    pub index: usize,
    pub name: String,
    pub input_channels: u16,
    pub label: String,
    pub is_default: bool,
}

impl DeviceInfo {
    pub fn new(device: &Device, selected: Option<usize>) -> Self {
        Self {
            index: device.index,
            name: device.name.clone(),
            input_channels: device.max_input_channels,
            label: device.display_label(),
            is_default: selected == Some(device.index),
        }
    }
}
