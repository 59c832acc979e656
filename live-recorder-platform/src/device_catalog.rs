//! Input device enumeration through cpal.
//!
//! Devices are numbered by their position in the host's full device list,
//! so indices stay stable while the hardware does not change. Devices
//! without input channels keep their number but are filtered out.

use cpal::traits::{DeviceTrait, HostTrait};

use live_recorder_core::models::audio_models::Device;
use live_recorder_core::models::error::RecorderError;
use live_recorder_core::traits::device_catalog::DeviceCatalog;

/// Device catalog backed by a cpal host (the platform default unless chosen).
#[derive(Debug, Clone, Copy)]
pub struct CpalDeviceCatalog {
    host_id: cpal::HostId,
}

impl CpalDeviceCatalog {
    pub fn new() -> Self {
        Self::with_host(cpal::default_host().id())
    }

    pub fn with_host(host_id: cpal::HostId) -> Self {
        Self { host_id }
    }

    pub fn host_id(&self) -> cpal::HostId {
        self.host_id
    }
}

impl Default for CpalDeviceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceCatalog for CpalDeviceCatalog {
    fn list_input_devices(&self) -> Result<Vec<Device>, RecorderError> {
        let host = cpal::host_from_id(self.host_id)
            .map_err(|e| RecorderError::DeviceQuery(e.to_string()))?;
        let devices = host
            .devices()
            .map_err(|e| RecorderError::DeviceQuery(e.to_string()))?;

        let inputs: Vec<Device> = devices
            .enumerate()
            .filter_map(|(index, device)| {
                let channels = max_input_channels(&device);
                if channels == 0 {
                    return None;
                }
                Some(Device::new(index, device_name(&device, index), channels))
            })
            .collect();

        log::debug!("{:?} host reports {} input devices", self.host_id, inputs.len());
        Ok(inputs)
    }
}

/// Largest channel count across the device's supported input configs.
fn max_input_channels(device: &cpal::Device) -> u16 {
    match device.supported_input_configs() {
        Ok(configs) => configs.map(|c| c.channels()).max().unwrap_or(0),
        Err(e) => {
            log::debug!("Skipping device without input configs: {}", e);
            0
        }
    }
}

pub(crate) fn device_name(device: &cpal::Device, index: usize) -> String {
    device.name().unwrap_or_else(|_| format!("Device {}", index))
}

/// Re-resolve a listed device on `host` for opening.
///
/// Fails if the device list changed so that the index now names another device.
pub(crate) fn find_device(host: &cpal::Host, wanted: &Device) -> Result<cpal::Device, RecorderError> {
    let device = host
        .devices()
        .map_err(|e| RecorderError::device_open(wanted.index, e.to_string()))?
        .nth(wanted.index)
        .ok_or_else(|| RecorderError::device_open(wanted.index, "device is no longer present"))?;

    let name = device_name(&device, wanted.index);
    if name != wanted.name {
        return Err(RecorderError::device_open(
            wanted.index,
            format!("device list changed: expected {:?}, found {:?}", wanted.name, name),
        ));
    }
    Ok(device)
}
