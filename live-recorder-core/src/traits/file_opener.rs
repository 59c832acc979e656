use std::path::Path;

use crate::models::error::RecorderError;

/// Hands a file to the host OS's default application for its type.
pub trait FileOpener {
    fn open(&self, path: &Path) -> Result<(), RecorderError>;
}
