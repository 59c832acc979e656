use std::sync::Arc;

use crate::models::audio_models::Device;
use crate::models::error::RecorderError;

/// Case-insensitive name fragments of loopback ("what you hear") inputs.
const LOOPBACK_NAME_PATTERNS: &[&str] = &["stereo mix", "ステレオ", "loopback", "monitor of"];

/// Source of audio input devices.
pub trait DeviceCatalog: Send + Sync {
    /// All devices with at least one input channel, in system enumeration order.
    fn list_input_devices(&self) -> Result<Vec<Device>, RecorderError>;

    /// Re-enumerate and look a device up by its index.
    fn resolve(&self, index: usize) -> Result<Device, RecorderError> {
        self.list_input_devices()?
            .into_iter()
            .find(|d| d.index == index)
            .ok_or_else(|| RecorderError::device_open(index, "no input device with this index"))
    }
}

impl<T: DeviceCatalog + ?Sized> DeviceCatalog for Arc<T> {
    fn list_input_devices(&self) -> Result<Vec<Device>, RecorderError> {
        (**self).list_input_devices()
    }

    fn resolve(&self, index: usize) -> Result<Device, RecorderError> {
        (**self).resolve(index)
    }
}

/// Whether a device name looks like a loopback / stereo mix input.
pub fn is_loopback_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    LOOPBACK_NAME_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Pick the device to select on startup.
///
/// First loopback-looking device, else the first device, else none.
pub fn preferred_default(devices: &[Device]) -> Option<&Device> {
    devices
        .iter()
        .find(|d| is_loopback_name(&d.name))
        .or_else(|| devices.first())
}
