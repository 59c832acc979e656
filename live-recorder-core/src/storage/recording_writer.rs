use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::RecorderError;
use crate::models::recording_result::RecordingResult;
use crate::processing::recording_buffer::RecordingBuffer;
use crate::processing::wav_format::{self, PcmFormat};

/// Persists a `RecordingBuffer` as a PCM WAV file.
///
/// ## Durability
///
/// The file is written to a temporary sibling (`.recording-*.wav.part`) in
/// the destination directory, synced, then renamed onto `path`. A failed
/// write leaves nothing at `path`; an existing file there is only replaced
/// on success. The published file gets the mode of the file it replaces,
/// or 0644 when there is none, instead of the temp file's 0600.
///
/// ## File Format
///
/// ```text
/// [44-byte WAV header]
/// [interleaved integer PCM, blocks in arrival order]
/// ```
#[derive(Debug, Clone)]
pub struct RecordingWriter {
    bit_depth: u16,
}

impl RecordingWriter {
    pub fn new(bit_depth: u16) -> Self {
        Self { bit_depth }
    }

    /// Write `buffer` to `path` at `sample_rate`.
    ///
    /// The returned result carries the audio duration derived from the frame
    /// count and the SHA-256 of the written file.
    pub fn write(
        &self,
        buffer: &RecordingBuffer,
        path: &Path,
        sample_rate: u32,
    ) -> Result<RecordingResult, RecorderError> {
        if path.as_os_str().is_empty() {
            return Err(RecorderError::InvalidOutputPath);
        }
        let Some(channels) = buffer.channels() else {
            return Err(RecorderError::EmptyBuffer);
        };
        if buffer.blocks().any(|b| b.channel_count != channels) {
            return Err(RecorderError::write(
                path,
                io::Error::new(io::ErrorKind::InvalidData, "blocks have mixed channel counts"),
            ));
        }

        let frame_count = buffer.frame_count();
        let data_size = wav_format::data_size(frame_count * channels as u64, self.bit_depth);
        if data_size > wav_format::MAX_DATA_SIZE {
            return Err(RecorderError::write(
                path,
                io::Error::new(io::ErrorKind::InvalidInput, "recording exceeds the 4 GiB WAV size limit"),
            ));
        }

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| RecorderError::write(path, e))?;

        let mut part = tempfile::Builder::new()
            .prefix(".recording-")
            .suffix(".wav.part")
            .tempfile_in(&dir)
            .map_err(|e| RecorderError::write(path, e))?;

        let header = PcmFormat::new(sample_rate, channels, self.bit_depth).header(data_size as u32);
        let checksum = self
            .write_body(part.as_file_mut(), &header, buffer)
            .map_err(|e| RecorderError::write(path, e))?;

        set_publish_permissions(part.as_file(), path).map_err(|e| RecorderError::write(path, e))?;
        part.as_file()
            .sync_all()
            .map_err(|e| RecorderError::write(path, e))?;
        // On failure the PersistError still owns the temp file and removes it on drop.
        part.persist(path)
            .map_err(|e| RecorderError::write(path, e.error))?;

        log::info!(
            "Wrote {} frames ({} ch, {} Hz, {}-bit) to {}",
            frame_count,
            channels,
            sample_rate,
            self.bit_depth,
            path.display()
        );

        Ok(RecordingResult {
            path: path.to_path_buf(),
            duration_secs: frame_count as f64 / sample_rate.max(1) as f64,
            frame_count,
            sample_rate,
            channels,
            created_at: chrono::Utc::now().to_rfc3339(),
            checksum: Some(checksum),
        })
    }

    /// Write header and PCM data, hashing everything written.
    fn write_body(
        &self,
        file: &mut fs::File,
        header: &[u8],
        buffer: &RecordingBuffer,
    ) -> io::Result<String> {
        let mut out = BufWriter::new(file);
        let mut hasher = Sha256::new();

        out.write_all(header)?;
        hasher.update(header);

        let mut pcm = Vec::new();
        for block in buffer.blocks() {
            pcm.clear();
            wav_format::encode_pcm(&block.samples, self.bit_depth, &mut pcm);
            out.write_all(&pcm)?;
            hasher.update(&pcm);
        }
        out.flush()?;

        Ok(hex_encode(&hasher.finalize()))
    }
}

#[cfg(unix)]
fn set_publish_permissions(file: &fs::File, path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = match fs::metadata(path) {
        Ok(existing) if existing.is_file() => existing.permissions(),
        _ => fs::Permissions::from_mode(0o644),
    };
    file.set_permissions(permissions)
}

#[cfg(not(unix))]
fn set_publish_permissions(_file: &fs::File, _path: &Path) -> io::Result<()> {
    Ok(())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
