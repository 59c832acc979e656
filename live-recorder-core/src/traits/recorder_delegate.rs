use crate::models::audio_models::LevelReading;
use crate::models::error::ErrorKind;
use crate::models::recording_result::RecordingResult;
use crate::models::state::SessionState;

/// Event delegate for recorder notifications.
///
/// Called from the foreground context that drains the controller's event
/// queue (`SessionController::pump`), never from the capture callback.
pub trait RecorderDelegate {
    /// Called when the controller state changes.
    fn on_state_changed(&self, state: SessionState);

    /// Called for every captured block, while monitoring or recording.
    fn on_level_updated(&self, reading: &LevelReading);

    /// Called once per tick while recording, and once more at stop.
    fn on_elapsed_time_updated(&self, elapsed: &str);

    /// Called when a recording has been written to disk.
    fn on_recording_completed(&self, result: &RecordingResult);

    /// Called when a command or the stream fails.
    fn on_error(&self, kind: ErrorKind, message: &str);
}
