pub mod audio_models;
pub mod config;
pub mod error;
pub mod event;
pub mod recording_result;
pub mod state;
