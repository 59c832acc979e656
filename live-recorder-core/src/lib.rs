//! # live-recorder-core
//!
//! Platform-agnostic core of the live recorder.
//!
//! Provides level metering, capture buffering, WAV output, and the session
//! state machine. Platform backends implement `DeviceCatalog` and
//! `CaptureProvider` and plug into the generic `SessionController`.
//!
//! ## Architecture
//!
//! ```text
//! live-recorder-core (this crate)
//! ├── traits/       ← CaptureProvider, DeviceCatalog, RecorderDelegate, FileOpener
//! ├── models/       ← RecorderError, SessionState, RecorderConfiguration, RecorderEvent, etc.
//! ├── processing/   ← level meter, RecordingBuffer, WAV header and PCM encoding
//! ├── session/      ← CaptureSession, SessionController, elapsed timer, clocks
//! └── storage/      ← RecordingWriter
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{Device, LevelBand, LevelReading, SampleBlock, MAX_CAPTURE_CHANNELS};
pub use models::config::RecorderConfiguration;
pub use models::error::{ErrorKind, RecorderError};
pub use models::event::RecorderEvent;
pub use models::recording_result::{format_elapsed, RecordingResult};
pub use models::state::{CaptureMode, SessionState};
pub use processing::level_meter::compute_level;
pub use processing::recording_buffer::RecordingBuffer;
pub use session::capture::CaptureSession;
pub use session::clock::{Clock, ManualClock, SystemClock};
pub use session::controller::SessionController;
pub use storage::recording_writer::RecordingWriter;
pub use traits::capture_provider::{CaptureProvider, StreamCallbacks, StreamRequest};
pub use traits::device_catalog::{is_loopback_name, preferred_default, DeviceCatalog};
pub use traits::file_opener::FileOpener;
pub use traits::recorder_delegate::RecorderDelegate;
