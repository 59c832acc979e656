use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

use crate::models::audio_models::{Device, SampleBlock};
use crate::models::config::RecorderConfiguration;
use crate::models::error::RecorderError;
use crate::models::event::{EventSender, RecorderEvent};
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureMode;
use crate::processing::level_meter;
use crate::processing::recording_buffer::RecordingBuffer;
use crate::session::clock::Clock;
use crate::traits::capture_provider::{BlockCallback, CaptureProvider, StreamCallbacks, StreamRequest};

/// Bookkeeping for the recording in progress.
struct ActiveRecording {
    output_path: PathBuf,
    started_at: Instant,
    created_at: String,
    channels: u16,
}

/// What `stop_recording` hands back: the result and the captured audio.
#[derive(Debug)]
pub struct StoppedRecording {
    pub result: RecordingResult,
    pub buffer: RecordingBuffer,
    /// Set when the device stream could not be released. The audio is
    /// still complete; the stream stays held until a later close succeeds.
    pub close_error: Option<RecorderError>,
}

/// Owns the device stream lifecycle for one provider.
///
/// Monitoring and recording are mutually exclusive: the provider holds at
/// most one stream, and a new one is only opened once the previous one has
/// been closed and released.
///
/// ```text
/// [Provider thread] → on_block → LevelMeter → LevelUpdated ─→ [event queue]
///                              ↘ (recording) RecordingBuffer
/// ```
pub struct CaptureSession<P: CaptureProvider> {
    provider: P,
    mode: CaptureMode,
    events: EventSender,
    fault_tx: Sender<String>,
    fault_rx: Receiver<String>,
    buffer: Arc<Mutex<RecordingBuffer>>,
    recording: Option<ActiveRecording>,
    clock: Arc<dyn Clock>,
    sample_rate: u32,
    block_frames: Option<u32>,
    stream_timeout: Duration,
}

impl<P: CaptureProvider> CaptureSession<P> {
    pub fn new(
        provider: P,
        config: &RecorderConfiguration,
        events: EventSender,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (fault_tx, fault_rx) = unbounded();
        Self {
            provider,
            mode: CaptureMode::Closed,
            events,
            fault_tx,
            fault_rx,
            buffer: Arc::new(Mutex::new(RecordingBuffer::new())),
            recording: None,
            clock,
            sample_rate: config.sample_rate,
            block_frames: config.block_frames,
            stream_timeout: config.stream_timeout,
        }
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    /// Whether the provider still holds a device stream.
    pub fn stream_open(&self) -> bool {
        self.provider.is_open()
    }

    /// Start time of the recording in progress.
    pub fn recording_started_at(&self) -> Option<Instant> {
        self.recording.as_ref().map(|r| r.started_at)
    }

    /// Driver errors reported since the last call.
    pub fn take_faults(&self) -> Vec<String> {
        self.fault_rx.try_iter().collect()
    }

    /// Open a metering-only stream. Restarts monitoring if it is already running.
    pub fn start_monitoring(&mut self, device: &Device, channels: u16) -> Result<(), RecorderError> {
        match self.mode {
            CaptureMode::Recording => {
                return Err(RecorderError::InvalidState(
                    "cannot monitor while recording".into(),
                ))
            }
            CaptureMode::Monitoring => self.stop_monitoring()?,
            CaptureMode::Closed => {}
        }

        let events = self.events.clone();
        let on_block = Arc::new(move |block: SampleBlock| {
            let reading = level_meter::compute_level(&block);
            let _ = events.send(RecorderEvent::level(reading));
        });

        self.open_stream(device, channels, on_block)?;
        self.mode = CaptureMode::Monitoring;
        log::info!("Monitoring {} ({} ch)", device.name, channels);
        Ok(())
    }

    /// Close the monitoring stream. A no-op unless monitoring.
    pub fn stop_monitoring(&mut self) -> Result<(), RecorderError> {
        if self.mode != CaptureMode::Monitoring {
            return Ok(());
        }
        self.mode = CaptureMode::Closed;
        self.provider.close()?;
        log::info!("Monitoring stopped");
        Ok(())
    }

    /// Open a stream that buffers every block and keeps the meter live.
    ///
    /// Monitoring must already be stopped.
    pub fn start_recording(
        &mut self,
        device: &Device,
        channels: u16,
        output_path: &Path,
    ) -> Result<(), RecorderError> {
        if output_path.as_os_str().is_empty() {
            return Err(RecorderError::InvalidOutputPath);
        }
        if !self.mode.is_closed() {
            return Err(RecorderError::InvalidState(format!(
                "cannot start recording while {:?} stream is open",
                self.mode
            )));
        }

        self.buffer.lock().clear();
        let started_at = self.clock.now();

        let events = self.events.clone();
        let buffer = Arc::clone(&self.buffer);
        let on_block = Arc::new(move |block: SampleBlock| {
            let reading = level_meter::compute_level(&block);
            buffer.lock().push(block);
            let _ = events.send(RecorderEvent::level(reading));
        });

        self.open_stream(device, channels, on_block)?;
        self.recording = Some(ActiveRecording {
            output_path: output_path.to_path_buf(),
            started_at,
            created_at: chrono::Utc::now().to_rfc3339(),
            channels,
        });
        self.mode = CaptureMode::Recording;
        log::info!(
            "Recording {} ({} ch) to {}",
            device.name,
            channels,
            output_path.display()
        );
        Ok(())
    }

    /// Close the recording stream and hand back what it captured.
    ///
    /// The stream is closed before the buffer is taken, so no block can be
    /// appended afterwards. Zero captured frames is not an error here. A
    /// failed close is returned in `close_error` alongside the audio.
    pub fn stop_recording(&mut self) -> Result<StoppedRecording, RecorderError> {
        let Some(recording) = self.recording.take() else {
            return Err(RecorderError::InvalidState("not recording".into()));
        };
        self.mode = CaptureMode::Closed;

        let close_error = self.provider.close().err();
        if let Some(e) = &close_error {
            log::warn!("Error closing recording stream: {}", e);
        }

        let elapsed = self.clock.now().saturating_duration_since(recording.started_at);
        let buffer = std::mem::take(&mut *self.buffer.lock());

        let result = RecordingResult {
            path: recording.output_path,
            duration_secs: elapsed.as_secs_f64(),
            frame_count: buffer.frame_count(),
            sample_rate: self.sample_rate,
            channels: buffer.channels().unwrap_or(recording.channels),
            created_at: recording.created_at,
            checksum: None,
        };
        log::info!(
            "Recording stopped after {:.2}s: {} blocks, {} frames",
            result.duration_secs,
            buffer.block_count(),
            result.frame_count
        );
        Ok(StoppedRecording {
            result,
            buffer,
            close_error,
        })
    }

    /// Close whatever stream is open without producing a result.
    pub fn close(&mut self) -> Result<(), RecorderError> {
        self.mode = CaptureMode::Closed;
        self.recording = None;
        self.provider.close()
    }

    fn open_stream(
        &mut self,
        device: &Device,
        channels: u16,
        on_block: BlockCallback,
    ) -> Result<(), RecorderError> {
        if channels == 0 {
            return Err(RecorderError::device_open(device.index, "device has no input channels"));
        }

        let fault_tx = self.fault_tx.clone();
        let callbacks = StreamCallbacks {
            on_block,
            on_error: Arc::new(move |message: String| {
                let _ = fault_tx.send(message);
            }),
        };
        let request = StreamRequest {
            device: device.clone(),
            channels,
            sample_rate: self.sample_rate,
            block_frames: self.block_frames,
            timeout: self.stream_timeout,
        };

        // A stream left over from a failed close must go before another opens.
        if self.provider.is_open() {
            log::info!("Releasing previous stream before opening {}", device.name);
            self.provider.close()?;
        }

        // Stale faults belong to a stream that no longer exists.
        self.take_faults();
        self.provider.open(&request, callbacks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::clock::ManualClock;
    use crate::session::test_support::FakeProvider;

    struct Harness {
        session: CaptureSession<FakeProvider>,
        provider: FakeProvider,
        clock: ManualClock,
        events: Receiver<RecorderEvent>,
    }

    fn harness() -> Harness {
        let provider = FakeProvider::new();
        let clock = ManualClock::new();
        let (tx, rx) = unbounded();
        let session = CaptureSession::new(
            provider.clone(),
            &RecorderConfiguration::default(),
            tx,
            Arc::new(clock.clone()),
        );
        Harness {
            session,
            provider,
            clock,
            events: rx,
        }
    }

    fn stereo_mix() -> Device {
        Device::new(1, "Stereo Mix", 2)
    }

    fn level_events(rx: &Receiver<RecorderEvent>) -> usize {
        rx.try_iter()
            .filter(|e| matches!(e, RecorderEvent::LevelUpdated { .. }))
            .count()
    }

    #[test]
    fn monitoring_emits_levels_without_buffering() {
        let mut h = harness();
        h.session.start_monitoring(&stereo_mix(), 2).unwrap();

        h.provider.deliver(SampleBlock::from_interleaved(vec![0.5; 512], 2));
        h.provider.deliver(SampleBlock::silence(256, 2));

        assert_eq!(level_events(&h.events), 2);
        assert!(h.session.buffer.lock().is_empty());
        assert_eq!(h.session.mode(), CaptureMode::Monitoring);
    }

    #[test]
    fn stop_monitoring_is_idempotent() {
        let mut h = harness();
        h.session.stop_monitoring().unwrap();

        h.session.start_monitoring(&stereo_mix(), 2).unwrap();
        h.session.stop_monitoring().unwrap();
        h.session.stop_monitoring().unwrap();

        assert!(!h.provider.is_stream_open());
        assert_eq!(h.provider.close_count(), 1);
        assert_eq!(h.session.mode(), CaptureMode::Closed);
    }

    #[test]
    fn restarting_monitoring_closes_first() {
        let mut h = harness();
        h.session.start_monitoring(&stereo_mix(), 2).unwrap();
        h.session.start_monitoring(&Device::new(0, "Mic", 1), 1).unwrap();

        assert_eq!(h.provider.max_concurrent_streams(), 1);
        assert_eq!(h.provider.last_request().unwrap().device.name, "Mic");
    }

    #[test]
    fn recording_buffers_blocks_and_meters() {
        let mut h = harness();
        h.session
            .start_recording(&stereo_mix(), 2, Path::new("out.wav"))
            .unwrap();

        h.provider.deliver(SampleBlock::silence(4096, 2));
        h.provider.deliver(SampleBlock::silence(1000, 2));
        h.clock.advance(Duration::from_secs(3));

        let stopped = h.session.stop_recording().unwrap();

        assert_eq!(level_events(&h.events), 2);
        assert_eq!(stopped.buffer.block_count(), 2);
        assert_eq!(stopped.result.frame_count, 5096);
        assert_eq!(stopped.result.duration_secs, 3.0);
        assert_eq!(stopped.result.path, PathBuf::from("out.wav"));
        assert_eq!(stopped.result.sample_rate, 44100);
        assert!(!h.provider.is_stream_open());
    }

    #[test]
    fn blocks_after_stop_are_not_buffered() {
        let mut h = harness();
        h.session
            .start_recording(&stereo_mix(), 2, Path::new("out.wav"))
            .unwrap();
        h.provider.deliver(SampleBlock::silence(10, 2));
        let stopped = h.session.stop_recording().unwrap();

        h.provider.deliver(SampleBlock::silence(10, 2));

        assert_eq!(stopped.result.frame_count, 10);
        assert!(h.session.buffer.lock().is_empty());
    }

    #[test]
    fn new_recording_starts_with_empty_buffer() {
        let mut h = harness();
        let path = Path::new("out.wav");
        h.session.start_recording(&stereo_mix(), 2, path).unwrap();
        h.provider.deliver(SampleBlock::silence(100, 2));
        h.session.stop_recording().unwrap();

        h.session.start_recording(&stereo_mix(), 2, path).unwrap();
        let stopped = h.session.stop_recording().unwrap();

        assert_eq!(stopped.result.frame_count, 0);
        assert!(!stopped.result.has_audio());
    }

    #[test]
    fn recording_requires_output_path() {
        let mut h = harness();
        let err = h
            .session
            .start_recording(&stereo_mix(), 2, Path::new(""))
            .unwrap_err();

        assert!(matches!(err, RecorderError::InvalidOutputPath));
        assert_eq!(h.provider.open_count(), 0);
    }

    #[test]
    fn recording_refuses_while_monitoring() {
        let mut h = harness();
        h.session.start_monitoring(&stereo_mix(), 2).unwrap();

        let err = h
            .session
            .start_recording(&stereo_mix(), 2, Path::new("out.wav"))
            .unwrap_err();

        assert!(matches!(err, RecorderError::InvalidState(_)));
        assert_eq!(h.session.mode(), CaptureMode::Monitoring);
    }

    #[test]
    fn open_failure_leaves_session_closed() {
        let mut h = harness();
        h.provider.fail_next_open("device busy");

        let err = h
            .session
            .start_recording(&stereo_mix(), 2, Path::new("out.wav"))
            .unwrap_err();

        assert!(matches!(err, RecorderError::DeviceOpen { index: 1, .. }));
        assert_eq!(h.session.mode(), CaptureMode::Closed);
        assert!(h.session.recording_started_at().is_none());
        assert!(h.session.stop_recording().is_err());
    }

    #[test]
    fn driver_errors_surface_as_faults() {
        let mut h = harness();
        h.session.start_monitoring(&stereo_mix(), 2).unwrap();

        h.provider.inject_fault("device unplugged");

        assert_eq!(h.session.take_faults(), vec!["device unplugged".to_string()]);
        assert!(h.session.take_faults().is_empty());
    }

    #[test]
    fn failed_close_keeps_audio_and_reports_error() {
        let mut h = harness();
        h.session
            .start_recording(&stereo_mix(), 2, Path::new("out.wav"))
            .unwrap();
        h.provider.deliver(SampleBlock::silence(480, 2));
        h.provider.fail_next_close("device release");

        let stopped = h.session.stop_recording().unwrap();

        assert!(matches!(stopped.close_error, Some(RecorderError::Timeout(_))));
        assert_eq!(stopped.result.frame_count, 480);
        assert_eq!(h.session.mode(), CaptureMode::Closed);
        assert!(h.session.stream_open());
    }

    #[test]
    fn lingering_stream_is_closed_before_next_open() {
        let mut h = harness();
        h.session
            .start_recording(&stereo_mix(), 2, Path::new("out.wav"))
            .unwrap();
        h.provider.fail_next_close("device release");
        h.session.stop_recording().unwrap();

        h.session.start_monitoring(&stereo_mix(), 2).unwrap();

        assert_eq!(h.provider.max_concurrent_streams(), 1);
        assert_eq!(h.provider.open_count(), 2);
        assert_eq!(h.session.mode(), CaptureMode::Monitoring);
    }

    #[test]
    fn open_refused_while_lingering_stream_cannot_close() {
        let mut h = harness();
        h.session.start_monitoring(&stereo_mix(), 2).unwrap();
        h.provider.fail_next_close("device release");
        assert!(h.session.stop_monitoring().is_err());

        h.provider.fail_next_close("device release");
        let err = h.session.start_monitoring(&stereo_mix(), 2).unwrap_err();

        assert!(matches!(err, RecorderError::Timeout(_)));
        assert_eq!(h.provider.open_count(), 1);
        assert_eq!(h.session.mode(), CaptureMode::Closed);
    }
}
