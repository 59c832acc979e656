//! In-memory provider and catalog for session tests.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::{Device, SampleBlock};
use crate::models::error::RecorderError;
use crate::traits::capture_provider::{CaptureProvider, StreamCallbacks, StreamRequest};
use crate::traits::device_catalog::DeviceCatalog;

#[derive(Default)]
struct FakeState {
    callbacks: Option<StreamCallbacks>,
    open_streams: usize,
    max_concurrent: usize,
    open_count: usize,
    close_count: usize,
    requests: Vec<StreamRequest>,
    fail_next_open: Option<String>,
    fail_next_close: Option<String>,
}

/// Provider whose stream is driven by the test. Clones share state.
#[derive(Clone, Default)]
pub(crate) struct FakeProvider {
    state: Arc<Mutex<FakeState>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a block as the driver would. Dropped when no stream is open.
    pub fn deliver(&self, block: SampleBlock) {
        let on_block = self.state.lock().callbacks.as_ref().map(|c| Arc::clone(&c.on_block));
        if let Some(on_block) = on_block {
            on_block(block);
        }
    }

    pub fn inject_fault(&self, message: &str) {
        let on_error = self.state.lock().callbacks.as_ref().map(|c| Arc::clone(&c.on_error));
        if let Some(on_error) = on_error {
            on_error(message.to_string());
        }
    }

    pub fn fail_next_open(&self, reason: &str) {
        self.state.lock().fail_next_open = Some(reason.to_string());
    }

    /// Make the next close time out with the stream still held.
    pub fn fail_next_close(&self, what: &str) {
        self.state.lock().fail_next_close = Some(what.to_string());
    }

    pub fn is_stream_open(&self) -> bool {
        self.state.lock().open_streams > 0
    }

    pub fn max_concurrent_streams(&self) -> usize {
        self.state.lock().max_concurrent
    }

    pub fn open_count(&self) -> usize {
        self.state.lock().open_count
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().close_count
    }

    pub fn last_request(&self) -> Option<StreamRequest> {
        self.state.lock().requests.last().cloned()
    }
}

impl CaptureProvider for FakeProvider {
    fn open(&mut self, request: &StreamRequest, callbacks: StreamCallbacks) -> Result<(), RecorderError> {
        let mut s = self.state.lock();
        if let Some(reason) = s.fail_next_open.take() {
            return Err(RecorderError::device_open(request.device.index, reason));
        }
        // Counted rather than refused so tests can observe overlapping opens.
        s.open_streams += 1;
        s.max_concurrent = s.max_concurrent.max(s.open_streams);
        s.open_count += 1;
        s.requests.push(request.clone());
        s.callbacks = Some(callbacks);
        Ok(())
    }

    fn close(&mut self) -> Result<(), RecorderError> {
        let mut s = self.state.lock();
        if s.open_streams > 0 {
            if let Some(what) = s.fail_next_close.take() {
                return Err(RecorderError::Timeout(what));
            }
            s.open_streams -= 1;
            s.close_count += 1;
        }
        s.callbacks = None;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.is_stream_open()
    }
}

/// Catalog returning a fixed list, or failing.
pub(crate) struct FakeCatalog {
    devices: Mutex<Result<Vec<Device>, String>>,
}

impl FakeCatalog {
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            devices: Mutex::new(Ok(devices)),
        }
    }

    /// Simulate hardware changing between enumerations.
    pub fn set_devices(&self, devices: Vec<Device>) {
        *self.devices.lock() = Ok(devices);
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            devices: Mutex::new(Err(reason.to_string())),
        }
    }
}

impl DeviceCatalog for FakeCatalog {
    fn list_input_devices(&self) -> Result<Vec<Device>, RecorderError> {
        self.devices
            .lock()
            .clone()
            .map_err(RecorderError::DeviceQuery)
    }
}
