use std::path::Path;
use std::process::Command;

use live_recorder_core::models::error::RecorderError;
use live_recorder_core::traits::file_opener::FileOpener;

/// Opens files with the OS default handler (`start`, `open` or `xdg-open`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl FileOpener for SystemOpener {
    fn open(&self, path: &Path) -> Result<(), RecorderError> {
        let mut command = open_command(path);
        log::debug!("Running {:?}", command);

        let status = command
            .status()
            .map_err(|e| RecorderError::Playback(format!("failed to launch {:?}: {}", command.get_program(), e)))?;
        if !status.success() {
            return Err(RecorderError::Playback(format!(
                "{:?} exited with {}",
                command.get_program(),
                status
            )));
        }
        Ok(())
    }
}

#[cfg(target_os = "windows")]
fn open_command(path: &Path) -> Command {
    let mut command = Command::new("cmd");
    // The empty argument is the window title `start` expects first.
    command.args(["/C", "start", ""]).arg(path);
    command
}

#[cfg(target_os = "macos")]
fn open_command(path: &Path) -> Command {
    let mut command = Command::new("open");
    command.arg(path);
    command
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn open_command(path: &Path) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(path);
    command
}
