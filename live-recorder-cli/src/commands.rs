use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};

use live_recorder_core::{RecordingResult, SessionController};
use live_recorder_platform::{CpalCaptureProvider, CpalDeviceCatalog, SystemOpener};

use crate::delegate::{ConsoleDelegate, DeviceInfo};

pub type Controller = SessionController<CpalCaptureProvider, CpalDeviceCatalog>;

/// Foreground tick: how often events are drained and stop conditions checked.
const TICK: Duration = Duration::from_millis(50);

/// Where drained events go.
pub enum Output {
    Console(ConsoleDelegate),
    /// One JSON object per event on stdout.
    Json,
}

impl Output {
    pub fn new(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Console(ConsoleDelegate::new())
        }
    }

    pub fn deliver(&self, controller: &mut Controller) -> Result<()> {
        match self {
            Self::Console(delegate) => {
                controller.pump(delegate);
            }
            Self::Json => {
                for event in controller.drain_events() {
                    println!("{}", serde_json::to_string(&event)?);
                }
            }
        }
        Ok(())
    }

    fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }
}

pub fn list_devices(controller: &Controller, output: &Output) -> Result<()> {
    let selected = controller.selected_device().map(|d| d.index);
    let devices: Vec<DeviceInfo> = controller
        .devices()
        .iter()
        .map(|d| DeviceInfo::new(d, selected))
        .collect();

    if output.is_json() {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }
    if devices.is_empty() {
        println!("No input devices found.");
    }
    for device in &devices {
        let marker = if device.is_default { "*" } else { " " };
        println!("{} {:>3}  {}", marker, device.index, device.label);
    }
    Ok(())
}

pub fn monitor(
    controller: &mut Controller,
    output: &Output,
    device: Option<usize>,
    seconds: Option<u64>,
    running: &AtomicBool,
) -> Result<()> {
    if let Some(index) = device {
        controller.select_device(index)?;
    }
    controller.start_monitoring()?;

    run_while(controller, output, running, seconds, |c| c.state().is_monitoring())?;

    controller.shutdown()?;
    output.deliver(controller)
}

pub fn record(
    controller: &mut Controller,
    output: &Output,
    device: Option<usize>,
    path: Option<PathBuf>,
    seconds: Option<u64>,
    play: bool,
    running: &AtomicBool,
) -> Result<RecordingResult> {
    if let Some(index) = device {
        controller.select_device(index)?;
    }
    if let Some(path) = path {
        controller.set_output_path(path);
    }

    controller.start_monitoring()?;
    controller.start_recording()?;
    if !output.is_json() {
        println!(
            "Recording to {} (Ctrl-C to stop)",
            controller.output_path().display()
        );
    }

    run_while(controller, output, running, seconds, |c| c.state().is_recording())?;

    // A stream fault may already have finalized the recording.
    let stopped = if controller.state().is_recording() {
        controller.stop_recording().map(Some)
    } else {
        Ok(controller.last_recording().cloned())
    };
    controller.shutdown()?;
    output.deliver(controller)?;

    let Some(result) = stopped? else {
        bail!("recording ended without producing a file");
    };

    if play {
        controller
            .open_last_recording(&SystemOpener)
            .with_context(|| format!("could not play {}", result.path.display()))?;
    }
    Ok(result)
}

/// Drain events until Ctrl-C, the time limit, or `keep_going` turning false.
fn run_while(
    controller: &mut Controller,
    output: &Output,
    running: &AtomicBool,
    seconds: Option<u64>,
    keep_going: impl Fn(&Controller) -> bool,
) -> Result<()> {
    let deadline = seconds.map(|s| Instant::now() + Duration::from_secs(s));

    while running.load(Ordering::SeqCst) && keep_going(controller) {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        output.deliver(controller)?;
        thread::sleep(TICK);
    }
    output.deliver(controller)
}
