//! WAV file format utilities.
//!
//! Builds the canonical 44-byte RIFF/WAVE header and encodes float samples
//! as little-endian integer PCM.

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Largest data chunk a RIFF size field can describe.
pub const MAX_DATA_SIZE: u64 = u32::MAX as u64 - (WAV_HEADER_SIZE as u64 - 8);

/// Sample layout of an integer PCM data chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
}

impl PcmFormat {
    pub fn new(sample_rate: u32, channels: u16, bit_depth: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bit_depth,
        }
    }

    /// Bytes per interleaved frame.
    pub fn block_align(&self) -> u16 {
        self.channels * (self.bit_depth / 8)
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }

    /// The canonical header for a file whose data chunk holds `data_size` bytes.
    ///
    /// ```text
    /// "RIFF" <36 + data_size> "WAVE"
    /// "fmt " <16> <1 = PCM> <channels> <rate> <byte rate> <block align> <bits>
    /// "data" <data_size>
    /// ```
    ///
    /// All integers little-endian.
    pub fn header(&self, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
        let riff_size = (WAV_HEADER_SIZE as u32 - 8) + data_size;
        let fields: [&[u8]; 13] = [
            b"RIFF",
            &riff_size.to_le_bytes(),
            b"WAVE",
            b"fmt ",
            &16u32.to_le_bytes(),
            &1u16.to_le_bytes(),
            &self.channels.to_le_bytes(),
            &self.sample_rate.to_le_bytes(),
            &self.byte_rate().to_le_bytes(),
            &self.block_align().to_le_bytes(),
            &self.bit_depth.to_le_bytes(),
            b"data",
            &data_size.to_le_bytes(),
        ];

        let mut header = [0u8; WAV_HEADER_SIZE];
        let mut offset = 0;
        for field in fields {
            header[offset..offset + field.len()].copy_from_slice(field);
            offset += field.len();
        }
        header
    }
}

/// Bytes of PCM data for `sample_count` samples at `bit_depth`.
pub fn data_size(sample_count: u64, bit_depth: u16) -> u64 {
    sample_count * (bit_depth / 8) as u64
}

/// Append f32 samples `[-1.0, 1.0]` to `out` as integer PCM (little-endian).
///
/// Clamps out-of-range values. Supported depths: 16, 24, 32.
pub fn encode_pcm(samples: &[f32], bit_depth: u16, out: &mut Vec<u8>) {
    out.reserve(samples.len() * (bit_depth / 8) as usize);
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0) as f64;
        match bit_depth {
            16 => {
                let value = (clamped * i16::MAX as f64) as i16;
                out.extend_from_slice(&value.to_le_bytes());
            }
            24 => {
                let value = (clamped * 8_388_607.0) as i32;
                out.extend_from_slice(&value.to_le_bytes()[0..3]);
            }
            _ => {
                let value = (clamped * i32::MAX as f64) as i32;
                out.extend_from_slice(&value.to_le_bytes());
            }
        }
    }
}
