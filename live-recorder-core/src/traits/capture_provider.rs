use std::sync::Arc;
use std::time::Duration;

use crate::models::audio_models::{Device, SampleBlock};
use crate::models::error::RecorderError;

/// Callback invoked with each block delivered by the driver.
///
/// Runs on the capture thread. Implementations must not block: copy,
/// meter, and append only.
pub type BlockCallback = Arc<dyn Fn(SampleBlock) + Send + Sync + 'static>;

/// Callback invoked when the driver reports a runtime stream error.
pub type StreamErrorCallback = Arc<dyn Fn(String) + Send + Sync + 'static>;

/// The pair of callbacks a provider drives while a stream is open.
#[derive(Clone)]
pub struct StreamCallbacks {
    pub on_block: BlockCallback,
    pub on_error: StreamErrorCallback,
}

/// Parameters for opening one input stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    pub device: Device,
    pub channels: u16,
    pub sample_rate: u32,
    pub block_frames: Option<u32>,
    /// Bound on how long open and close may take.
    pub timeout: Duration,
}

/// Interface for platform-specific audio input streams.
///
/// A provider holds at most one open stream. Implemented by
/// `CpalCaptureProvider` in `live-recorder-platform`.
pub trait CaptureProvider: Send {
    /// Open a stream and start delivering blocks via `callbacks`.
    ///
    /// Returns once the stream is running, or with `DeviceOpen` if the
    /// device is invalid or busy.
    fn open(&mut self, request: &StreamRequest, callbacks: StreamCallbacks) -> Result<(), RecorderError>;

    /// Stop the stream and release the device.
    ///
    /// Blocks until the device handle is released. A no-op when nothing is open.
    /// If the release times out the stream is still held: `is_open` stays
    /// true and `close` may be called again.
    fn close(&mut self) -> Result<(), RecorderError>;

    /// Whether a stream is currently open.
    fn is_open(&self) -> bool;
}
