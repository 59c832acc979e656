//! cpal input stream provider.
//!
//! `cpal::Stream` is not `Send`, so each stream lives on a dedicated
//! `audio-capture` thread that builds it, reports readiness, then parks
//! until `close` asks it to drop the stream.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use cpal::traits::{DeviceTrait, StreamTrait};

use live_recorder_core::models::audio_models::SampleBlock;
use live_recorder_core::models::error::RecorderError;
use live_recorder_core::traits::capture_provider::{CaptureProvider, StreamCallbacks, StreamRequest};

use crate::device_catalog::find_device;

/// Handles to the thread owning an open stream.
struct StreamThread {
    stop_tx: Sender<()>,
    done_rx: Receiver<()>,
    handle: thread::JoinHandle<()>,
    close_timeout: Duration,
}

/// cpal-backed capture provider.
///
/// Holds at most one stream. `close` blocks until the stream has been
/// dropped and the device released, up to the request's timeout. A close
/// that times out leaves the stream registered so it can be retried.
pub struct CpalCaptureProvider {
    host_id: cpal::HostId,
    stream: Option<StreamThread>,
}

impl CpalCaptureProvider {
    pub fn new() -> Self {
        Self::with_host(cpal::default_host().id())
    }

    pub fn with_host(host_id: cpal::HostId) -> Self {
        Self {
            host_id,
            stream: None,
        }
    }
}

impl Default for CpalCaptureProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureProvider for CpalCaptureProvider {
    fn open(&mut self, request: &StreamRequest, callbacks: StreamCallbacks) -> Result<(), RecorderError> {
        if self.stream.is_some() {
            return Err(RecorderError::InvalidState("a stream is already open".into()));
        }

        let index = request.device.index;
        let (ready_tx, ready_rx) = bounded::<Result<(), RecorderError>>(1);
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let (done_tx, done_rx) = bounded::<()>(1);
        let host_id = self.host_id;
        let thread_request = request.clone();

        let handle = thread::Builder::new()
            .name("audio-capture".into())
            .spawn(move || {
                let stream = match build_input(host_id, &thread_request, callbacks) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                // A dropped sender counts as a stop request.
                let _ = stop_rx.recv();
                drop(stream);
                log::debug!("Capture stream for device {} released", thread_request.device.index);
                let _ = done_tx.send(());
            })
            .map_err(|e| RecorderError::device_open(index, format!("failed to spawn capture thread: {}", e)))?;

        match ready_rx.recv_timeout(request.timeout) {
            Ok(Ok(())) => {
                log::info!(
                    "Opened {} ({} ch, {} Hz)",
                    request.device.name,
                    request.channels,
                    request.sample_rate
                );
                self.stream = Some(StreamThread {
                    stop_tx,
                    done_rx,
                    handle,
                    close_timeout: request.timeout,
                });
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(RecvTimeoutError::Timeout) => {
                // The thread drops the stream as soon as the build returns.
                drop(stop_tx);
                log::error!("Opening {} timed out", request.device.name);
                Err(RecorderError::Timeout(format!("device {} to open", index)))
            }
            Err(RecvTimeoutError::Disconnected) => {
                let _ = handle.join();
                Err(RecorderError::device_open(index, "capture thread exited during open"))
            }
        }
    }

    fn close(&mut self) -> Result<(), RecorderError> {
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };

        // Full means an earlier close already asked.
        let _ = stream.stop_tx.try_send(());
        match stream.done_rx.recv_timeout(stream.close_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let _ = stream.handle.join();
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => {
                log::error!("Capture thread did not release the device in time");
                // Still held: keep the handles so a later close can finish the job.
                self.stream = Some(stream);
                Err(RecorderError::Timeout("capture stream to close".into()))
            }
        }
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for CpalCaptureProvider {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Error closing capture stream on drop: {}", e);
        }
    }
}

/// Build and start the input stream. Runs on the capture thread.
fn build_input(
    host_id: cpal::HostId,
    request: &StreamRequest,
    callbacks: StreamCallbacks,
) -> Result<cpal::Stream, RecorderError> {
    let index = request.device.index;
    let host = cpal::host_from_id(host_id).map_err(|e| RecorderError::device_open(index, e.to_string()))?;
    let device = find_device(&host, &request.device)?;

    let ranges = device
        .supported_input_configs()
        .map_err(|e| RecorderError::device_open(index, e.to_string()))?;
    let plan = select_config(ranges, request).ok_or_else(|| {
        RecorderError::device_open(
            index,
            format!(
                "no input config with at least {} ch at {} Hz",
                request.channels, request.sample_rate
            ),
        )
    })?;

    if plan.channels != request.channels {
        log::info!(
            "{} has no {} ch input; opening {} ch and keeping the first {}",
            request.device.name,
            request.channels,
            plan.channels,
            request.channels
        );
    }

    let config = cpal::StreamConfig {
        channels: plan.channels,
        sample_rate: cpal::SampleRate(request.sample_rate),
        buffer_size: plan.buffer_size,
    };
    log::debug!("Stream config: {:?}, format: {:?}", config, plan.sample_format);

    let keep = request.channels;
    let timeout = Some(request.timeout);
    let stream = match plan.sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, keep, callbacks, timeout),
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, keep, callbacks, timeout),
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, keep, callbacks, timeout),
        cpal::SampleFormat::I32 => build_stream::<i32>(&device, &config, keep, callbacks, timeout),
        other => {
            return Err(RecorderError::device_open(
                index,
                format!("unsupported sample format {:?}", other),
            ))
        }
    }
    .map_err(|e| RecorderError::device_open(index, e.to_string()))?;

    stream
        .play()
        .map_err(|e| RecorderError::device_open(index, e.to_string()))?;
    Ok(stream)
}

const SUPPORTED_FORMATS: [cpal::SampleFormat; 4] = [
    cpal::SampleFormat::F32,
    cpal::SampleFormat::I32,
    cpal::SampleFormat::I16,
    cpal::SampleFormat::U16,
];

/// How a request maps onto one of the device's advertised configs.
#[derive(Debug, Clone, Copy, PartialEq)]
struct StreamPlan {
    /// Channels the device stream is opened with.
    channels: u16,
    sample_format: cpal::SampleFormat,
    buffer_size: cpal::BufferSize,
}

/// Pick a channel count, sample format and buffer size for `request` among
/// the device's supported input ranges.
///
/// An exact channel match wins; otherwise the smallest advertised count
/// above the request is opened and the extra channels are dropped in the
/// callback. Formats are preferred in `SUPPORTED_FORMATS` order. The
/// requested block size is used only where the range advertises it;
/// otherwise the driver default applies.
fn select_config<I>(ranges: I, request: &StreamRequest) -> Option<StreamPlan>
where
    I: IntoIterator<Item = cpal::SupportedStreamConfigRange>,
{
    let usable: Vec<cpal::SupportedStreamConfigRange> = ranges
        .into_iter()
        .filter(|r| {
            r.channels() >= request.channels
                && r.min_sample_rate().0 <= request.sample_rate
                && request.sample_rate <= r.max_sample_rate().0
                && SUPPORTED_FORMATS.contains(&r.sample_format())
        })
        .collect();

    let channels = usable.iter().map(|r| r.channels()).min()?;
    let range = SUPPORTED_FORMATS.iter().find_map(|format| {
        usable
            .iter()
            .find(|r| r.channels() == channels && r.sample_format() == *format)
    })?;

    let buffer_size = match (request.block_frames, range.buffer_size()) {
        (Some(frames), cpal::SupportedBufferSize::Range { min, max }) if (*min..=*max).contains(&frames) => {
            cpal::BufferSize::Fixed(frames)
        }
        (Some(frames), _) => {
            log::debug!("Block size {} not advertised, using driver default", frames);
            cpal::BufferSize::Default
        }
        (None, _) => cpal::BufferSize::Default,
    };
    Some(StreamPlan {
        channels,
        sample_format: range.sample_format(),
        buffer_size,
    })
}

/// The first `keep` samples of every `device_channels`-wide frame.
fn leading_channels<T: Copy>(data: &[T], device_channels: u16, keep: u16) -> impl Iterator<Item = T> + '_ {
    data.chunks(device_channels.max(1) as usize)
        .flat_map(move |frame| frame.iter().take(keep as usize).copied())
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    keep: u16,
    callbacks: StreamCallbacks,
    timeout: Option<Duration>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + Send + 'static,
    f32: cpal::FromSample<T>,
{
    let device_channels = config.channels;
    let StreamCallbacks { on_block, on_error } = callbacks;

    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let samples: Vec<f32> = leading_channels(data, device_channels, keep)
                .map(<f32 as cpal::FromSample<T>>::from_sample_)
                .collect();
            on_block(SampleBlock::from_interleaved(samples, keep));
        },
        move |err| {
            log::error!("Audio stream error: {}", err);
            on_error(err.to_string());
        },
        timeout,
    )
}
