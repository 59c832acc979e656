//! # live-recorder-platform
//!
//! cpal device backend and OS integration for live-recorder.
//!
//! Provides:
//! - `CpalDeviceCatalog`: input device enumeration through the default (or chosen) cpal host
//! - `CpalCaptureProvider`: one input stream at a time, owned by a dedicated thread
//! - `SystemOpener`: hands a finished recording to the OS default player
//!
//! ## Usage
//! ```ignore
//! use live_recorder_core::{RecorderConfiguration, SessionController};
//! use live_recorder_platform::{CpalCaptureProvider, CpalDeviceCatalog};
//!
//! let mut controller = SessionController::new(
//!     CpalDeviceCatalog::new(),
//!     CpalCaptureProvider::new(),
//!     RecorderConfiguration::default(),
//! )?;
//! controller.refresh_devices()?;
//! controller.start_monitoring()?;
//! ```

pub mod cpal_provider;
pub mod device_catalog;
pub mod opener;

pub use cpal_provider::CpalCaptureProvider;
pub use device_catalog::CpalDeviceCatalog;
pub use opener::SystemOpener;
