pub mod level_meter;
pub mod recording_buffer;
pub mod wav_format;
