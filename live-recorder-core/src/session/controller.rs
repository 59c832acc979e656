use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver};

use crate::models::audio_models::Device;
use crate::models::config::RecorderConfiguration;
use crate::models::error::RecorderError;
use crate::models::event::{EventSender, RecorderEvent};
use crate::models::recording_result::{format_elapsed, RecordingResult};
use crate::models::state::SessionState;
use crate::session::capture::{CaptureSession, StoppedRecording};
use crate::session::clock::{Clock, SystemClock};
use crate::session::elapsed::ElapsedTicker;
use crate::storage::recording_writer::RecordingWriter;
use crate::traits::capture_provider::CaptureProvider;
use crate::traits::device_catalog::{preferred_default, DeviceCatalog};
use crate::traits::file_opener::FileOpener;
use crate::traits::recorder_delegate::RecorderDelegate;

/// Top-level state machine driving monitoring, recording and file output.
///
/// ## State Machine
///
/// ```text
/// Idle ──start_monitoring──→ Monitoring ──start_recording──→ Recording
///  ↑                            │    ↑                            │
///  └──────stop_monitoring───────┘    └───────stop_recording───────┘
///                                      (write file, then re-monitor)
/// ```
///
/// Commands run on the caller's thread. Capture callbacks and the elapsed
/// timer only post to the event queue; the host drains it with [`pump`] or
/// [`drain_events`]. Every failed command also posts `ErrorOccurred`.
///
/// [`pump`]: SessionController::pump
/// [`drain_events`]: SessionController::drain_events
pub struct SessionController<P: CaptureProvider, C: DeviceCatalog> {
    catalog: C,
    capture: CaptureSession<P>,
    writer: RecordingWriter,
    config: RecorderConfiguration,
    clock: Arc<dyn Clock>,
    state: SessionState,
    devices: Vec<Device>,
    selected: Option<Device>,
    output_path: PathBuf,
    ticker: Option<ElapsedTicker>,
    event_tx: EventSender,
    event_rx: Receiver<RecorderEvent>,
    last_recording: Option<RecordingResult>,
}

impl<P: CaptureProvider, C: DeviceCatalog> SessionController<P, C> {
    pub fn new(catalog: C, provider: P, config: RecorderConfiguration) -> Result<Self, RecorderError> {
        Self::with_clock(catalog, provider, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        catalog: C,
        provider: P,
        config: RecorderConfiguration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RecorderError> {
        config.validate().map_err(RecorderError::Configuration)?;

        let (event_tx, event_rx) = unbounded();
        let capture = CaptureSession::new(provider, &config, event_tx.clone(), Arc::clone(&clock));
        let output_path = config.default_output_path(&chrono::Local::now());

        Ok(Self {
            catalog,
            capture,
            writer: RecordingWriter::new(config.bit_depth),
            config,
            clock,
            state: SessionState::Idle,
            devices: Vec::new(),
            selected: None,
            output_path,
            ticker: None,
            event_tx,
            event_rx,
            last_recording: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &RecorderConfiguration {
        &self.config
    }

    /// Device list from the last successful refresh.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn selected_device(&self) -> Option<&Device> {
        self.selected.as_ref()
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Path used by the next recording. Takes effect at `start_recording`.
    pub fn set_output_path(&mut self, path: impl Into<PathBuf>) {
        self.output_path = path.into();
    }

    pub fn last_recording(&self) -> Option<&RecordingResult> {
        self.last_recording.as_ref()
    }

    /// A receiver on the event queue, for hosts that wait on it directly.
    ///
    /// Receivers compete for events; use either this or `pump`.
    pub fn event_receiver(&self) -> Receiver<RecorderEvent> {
        self.event_rx.clone()
    }

    /// Re-enumerate input devices.
    ///
    /// The current selection is kept if its index is still present,
    /// otherwise the preferred default (first loopback-looking device, else
    /// the first device) is selected.
    pub fn refresh_devices(&mut self) -> Result<&[Device], RecorderError> {
        let devices = match self.catalog.list_input_devices() {
            Ok(devices) => devices,
            Err(e) => return Err(self.report(e)),
        };

        self.selected = self
            .selected
            .as_ref()
            .and_then(|current| devices.iter().find(|d| d.index == current.index).cloned())
            .or_else(|| preferred_default(&devices).cloned());
        self.devices = devices;

        log::info!(
            "Found {} input devices, selected: {}",
            self.devices.len(),
            self.selected
                .as_ref()
                .map(|d| d.display_label())
                .unwrap_or_else(|| "none".into())
        );
        Ok(&self.devices)
    }

    /// Select the device by index. Restarts monitoring on it if monitoring.
    pub fn select_device(&mut self, index: usize) -> Result<(), RecorderError> {
        if self.state.is_recording() {
            return Err(self.report(RecorderError::InvalidState(
                "cannot change device while recording".into(),
            )));
        }
        let Some(device) = self.devices.iter().find(|d| d.index == index).cloned() else {
            return Err(self.report(RecorderError::device_open(index, "no input device with this index")));
        };

        log::info!("Selected {}", device.display_label());
        self.selected = Some(device);
        if self.state.is_monitoring() {
            self.start_monitoring()?;
        }
        Ok(())
    }

    /// Open a metering stream on the selected device.
    pub fn start_monitoring(&mut self) -> Result<(), RecorderError> {
        if self.state.is_recording() {
            return Err(self.report(RecorderError::InvalidState(
                "cannot monitor while recording".into(),
            )));
        }
        let device = self.require_device()?;
        let channels = device.capture_channels(self.config.max_channels);

        if let Err(e) = self.capture.start_monitoring(&device, channels) {
            self.set_state(SessionState::Idle);
            return Err(self.report(e));
        }
        self.set_state(SessionState::Monitoring);
        Ok(())
    }

    /// Close the metering stream. A no-op unless monitoring.
    pub fn stop_monitoring(&mut self) -> Result<(), RecorderError> {
        if !self.state.is_monitoring() {
            return Ok(());
        }
        let closed = self.capture.stop_monitoring();
        self.set_state(SessionState::Idle);
        closed.map_err(|e| self.report(e))
    }

    /// Start recording the selected device to the current output path.
    ///
    /// Monitoring is stopped and its stream released before the recording
    /// stream opens. If the open fails the controller is left Idle.
    pub fn start_recording(&mut self) -> Result<(), RecorderError> {
        if self.state.is_recording() {
            return Err(self.report(RecorderError::InvalidState("already recording".into())));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(self.report(RecorderError::InvalidOutputPath));
        }
        let device = self.require_device()?;
        let channels = device.capture_channels(self.config.max_channels);

        self.stop_monitoring()?;

        let path = self.output_path.clone();
        if let Err(e) = self.capture.start_recording(&device, channels, &path) {
            self.set_state(SessionState::Idle);
            return Err(self.report(e));
        }

        let started_at = self
            .capture
            .recording_started_at()
            .unwrap_or_else(|| self.clock.now());
        self.set_state(SessionState::Recording);
        self.emit(RecorderEvent::ElapsedTimeUpdated {
            elapsed: format_elapsed(Duration::ZERO),
        });

        match ElapsedTicker::start(
            started_at,
            Arc::clone(&self.clock),
            self.config.elapsed_tick,
            self.event_tx.clone(),
        ) {
            Ok(ticker) => self.ticker = Some(ticker),
            // Recording itself is unaffected; only live elapsed updates are lost.
            Err(e) => log::warn!("Elapsed timer unavailable: {}", e),
        }
        Ok(())
    }

    pub fn start_recording_to(&mut self, path: impl Into<PathBuf>) -> Result<(), RecorderError> {
        self.set_output_path(path);
        self.start_recording()
    }

    /// Stop recording, write the file, then resume monitoring.
    pub fn stop_recording(&mut self) -> Result<RecordingResult, RecorderError> {
        if !self.state.is_recording() {
            return Err(self.report(RecorderError::InvalidState("not recording".into())));
        }
        let outcome = self.finish_recording();

        // The next open would have to release that stream first, and it just failed to.
        if self.capture.stream_open() {
            log::warn!("Not resuming monitoring: recording stream was not released");
        } else if let Err(e) = self.start_monitoring() {
            log::warn!("Could not resume monitoring: {}", e);
        }
        outcome
    }

    /// Start recording when not recording, otherwise stop.
    pub fn toggle_recording(&mut self) -> Result<Option<RecordingResult>, RecorderError> {
        if self.state.is_recording() {
            self.stop_recording().map(Some)
        } else {
            self.start_recording().map(|_| None)
        }
    }

    /// Open the last written recording with the host's default player.
    pub fn open_last_recording(&self, opener: &dyn FileOpener) -> Result<(), RecorderError> {
        let Some(result) = &self.last_recording else {
            return Err(self.report(RecorderError::Playback("nothing recorded yet".into())));
        };
        if !result.path.is_file() {
            return Err(self.report(RecorderError::Playback(format!(
                "{} no longer exists",
                result.path.display()
            ))));
        }
        opener.open(&result.path).map_err(|e| self.report(e))
    }

    /// Handle stream faults, then deliver queued events to `delegate`.
    ///
    /// Returns the number of events delivered.
    pub fn pump(&mut self, delegate: &dyn RecorderDelegate) -> usize {
        self.handle_faults();
        let mut delivered = 0;
        for event in self.event_rx.try_iter() {
            event.dispatch(delegate);
            delivered += 1;
        }
        delivered
    }

    /// Handle stream faults, then take every queued event.
    pub fn drain_events(&mut self) -> Vec<RecorderEvent> {
        self.handle_faults();
        self.event_rx.try_iter().collect()
    }

    /// Finish any recording (writing it) and release the device.
    pub fn shutdown(&mut self) -> Result<Option<RecordingResult>, RecorderError> {
        let finished = if self.state.is_recording() {
            self.finish_recording().map(Some)
        } else {
            Ok(None)
        };
        self.stop_monitoring()?;
        log::info!("Recorder shut down");
        finished
    }

    /// Tear down after a driver error.
    ///
    /// A failing recording is still finalized and written; monitoring is not
    /// restarted on a device that just failed.
    fn handle_faults(&mut self) {
        let faults = self.capture.take_faults();
        if faults.is_empty() {
            return;
        }
        for fault in &faults {
            log::error!("Stream fault: {}", fault);
        }

        match self.state {
            SessionState::Recording => {
                let _ = self.finish_recording();
            }
            SessionState::Monitoring => {
                let _ = self.stop_monitoring();
            }
            SessionState::Idle => {
                log::debug!("Ignoring faults from a closed stream");
                return;
            }
        }
        self.report(RecorderError::StreamFailed(faults.join("; ")));
    }

    fn finish_recording(&mut self) -> Result<RecordingResult, RecorderError> {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }

        let stopped = self.capture.stop_recording();
        self.set_state(SessionState::Idle);
        let StoppedRecording {
            result: captured,
            buffer,
            close_error,
        } = stopped.map_err(|e| self.report(e))?;
        if let Some(e) = close_error {
            self.report(e);
        }

        self.emit(RecorderEvent::ElapsedTimeUpdated {
            elapsed: format_elapsed(Duration::from_secs_f64(captured.duration_secs)),
        });

        let written = self
            .writer
            .write(&buffer, &captured.path, captured.sample_rate)
            .map_err(|e| self.report(e))?;

        let result = RecordingResult {
            duration_secs: captured.duration_secs,
            created_at: captured.created_at,
            ..written
        };
        self.last_recording = Some(result.clone());
        self.emit(RecorderEvent::RecordingCompleted {
            result: result.clone(),
        });
        Ok(result)
    }

    fn require_device(&self) -> Result<Device, RecorderError> {
        self.selected.clone().ok_or_else(|| {
            self.report(RecorderError::InvalidState("no input device selected".into()))
        })
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state == state {
            return;
        }
        log::debug!("State {} -> {}", self.state, state);
        self.state = state;
        self.emit(RecorderEvent::StateChanged { state });
    }

    fn emit(&self, event: RecorderEvent) {
        // The receiver lives in self, so this only fails during teardown.
        let _ = self.event_tx.send(event);
    }

    /// Post `err` as an `ErrorOccurred` event and hand it back.
    fn report(&self, err: RecorderError) -> RecorderError {
        if err.kind().is_informational() {
            log::info!("{}", err);
        } else {
            log::warn!("{}", err);
        }
        self.emit(RecorderEvent::error(&err));
        err
    }
}

impl<P: CaptureProvider, C: DeviceCatalog> Drop for SessionController<P, C> {
    fn drop(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
        if let Err(e) = self.capture.close() {
            log::warn!("Error releasing device on drop: {}", e);
        }
    }
}
