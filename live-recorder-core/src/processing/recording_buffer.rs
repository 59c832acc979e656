use crate::models::audio_models::SampleBlock;

/// Append-only list of the blocks captured during one recording.
///
/// Shared between the capture callback and the session as
/// `Arc<parking_lot::Mutex<RecordingBuffer>>`. The session only takes it
/// after the stream is closed, so the callback never waits on a slow reader.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordingBuffer {
    blocks: Vec<SampleBlock>,
    frame_count: u64,
}

impl RecordingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block. Empty blocks are ignored.
    pub fn push(&mut self, block: SampleBlock) {
        if block.is_empty() {
            return;
        }
        self.frame_count += block.frame_count as u64;
        self.blocks.push(block);
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
        self.frame_count = 0;
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Total frames across all blocks.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Channel count of the buffered audio, from the first block.
    pub fn channels(&self) -> Option<u16> {
        self.blocks.first().map(|b| b.channel_count)
    }

    /// Blocks in arrival order.
    pub fn blocks(&self) -> impl Iterator<Item = &SampleBlock> {
        self.blocks.iter()
    }

    /// All samples, concatenated in arrival order with interleaving preserved.
    pub fn samples(&self) -> impl Iterator<Item = f32> + '_ {
        self.blocks.iter().flat_map(|b| b.samples.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_accumulates_frames_in_order() {
        let mut buf = RecordingBuffer::new();
        buf.push(SampleBlock::from_interleaved(vec![0.1, 0.2, 0.3, 0.4], 2));
        buf.push(SampleBlock::from_interleaved(vec![0.5, 0.6], 2));

        assert_eq!(buf.block_count(), 2);
        assert_eq!(buf.frame_count(), 3);
        assert_eq!(buf.channels(), Some(2));
        assert_eq!(buf.samples().collect::<Vec<_>>(), vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
    }

    #[test]
    fn empty_blocks_are_skipped() {
        let mut buf = RecordingBuffer::new();
        buf.push(SampleBlock::silence(0, 2));
        assert!(buf.is_empty());
        assert_eq!(buf.channels(), None);
    }

    #[test]
    fn clear_resets() {
        let mut buf = RecordingBuffer::new();
        buf.push(SampleBlock::silence(128, 1));
        buf.clear();

        assert!(buf.is_empty());
        assert_eq!(buf.frame_count(), 0);
        assert_eq!(buf.samples().count(), 0);
    }
}
