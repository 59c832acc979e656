use crate::models::audio_models::{LevelReading, SampleBlock};

/// Minimum reported level, used in place of -∞ for silence.
pub const DB_FLOOR: f32 = -60.0;

/// Compute the level of one block.
///
/// RMS is the Euclidean norm of every sample in the block divided by
/// `sqrt(frame_count)`. Decibels are floored at [`DB_FLOOR`] but not capped:
/// clipped multi-channel input reads above 0 dB and above 100 %.
///
/// Monitoring and recording both meter through this function.
pub fn compute_level(block: &SampleBlock) -> LevelReading {
    let rms = block_rms(block);
    let decibels = if rms > 0.0 {
        (20.0 * rms.log10()) as f32
    } else {
        DB_FLOOR
    };
    let decibels = decibels.max(DB_FLOOR);
    LevelReading {
        decibels,
        meter_percent: meter_percent(decibels),
    }
}

/// Map [-60, 0] dB linearly onto [0, 100] %.
pub fn meter_percent(decibels: f32) -> f32 {
    (decibels - DB_FLOOR) / -DB_FLOOR * 100.0
}

fn block_rms(block: &SampleBlock) -> f64 {
    if block.frame_count == 0 {
        return 0.0;
    }
    let sum_sq: f64 = block.samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    sum_sq.sqrt() / (block.frame_count as f64).sqrt()
}
