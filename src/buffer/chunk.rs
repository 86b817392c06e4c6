//! Queue of whole sample blocks with splitting reads.

use std::collections::VecDeque;

use super::SampleBlock;
use crate::error::{BufferError, BufferResult};

/// Ring of whole chunks, bounded by **chunk count**.
///
/// Each `push` enqueues one block atomically; once `max_chunks` blocks are
/// retained, pushing evicts the oldest whole block. The bound is a chunk
/// count, not a sample count: total buffered frames depend on how large
/// the producer's blocks are, and are unbounded by `max_chunks` alone.
/// Callers that need sample-count-bounded eviction want [`RingBuffer`]
/// instead.
///
/// Reads drain from the oldest end and may stop inside a chunk; the
/// touched chunk is split, its unread remainder requeued at the front, so
/// sample order is preserved exactly.
///
/// [`RingBuffer`]: super::RingBuffer
#[derive(Debug, Clone, Default)]
pub struct ChunkRingBuffer {
    channels: usize,
    chunks: VecDeque<SampleBlock>,
    max_chunks: usize,
}

impl ChunkRingBuffer {
    /// Buffer retaining at most `max_chunks` blocks (min 1).
    pub fn new(channels: usize, max_chunks: usize) -> Self {
        let max_chunks = max_chunks.max(1);
        Self {
            channels: channels.max(1),
            chunks: VecDeque::with_capacity(max_chunks),
            max_chunks,
        }
    }

    /// Channel count of every stored frame.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Retained chunk bound.
    pub fn max_chunks(&self) -> usize {
        self.max_chunks
    }

    /// Number of retained chunks. O(1).
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Total buffered frames across all chunks. O(chunk count).
    pub fn total_frames(&self) -> usize {
        self.chunks.iter().map(SampleBlock::frames).sum()
    }

    /// True if no frames are buffered.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Enqueue one chunk, evicting the oldest if the bound is reached.
    ///
    /// Empty chunks are dropped silently so they cannot crowd out data.
    pub fn push(&mut self, chunk: SampleBlock) -> BufferResult<()> {
        if chunk.channels() != self.channels {
            return Err(BufferError::LengthMismatch {
                expected: self.channels,
                actual: chunk.channels(),
            });
        }
        if chunk.is_empty() {
            return Ok(());
        }
        if self.chunks.len() == self.max_chunks {
            self.chunks.pop_front();
        }
        self.chunks.push_back(chunk);
        Ok(())
    }

    /// Consume the `n` oldest frames, splitting the last chunk touched.
    ///
    /// Fails with [`BufferError::IndexOutOfRange`] if fewer than `n`
    /// frames are buffered; `read_up_to` is the clamping variant.
    pub fn read(&mut self, n: usize) -> BufferResult<SampleBlock> {
        let total = self.total_frames();
        if n > total {
            return Err(BufferError::IndexOutOfRange {
                index: n as isize,
                len: total,
            });
        }
        Ok(self.take_front(n))
    }

    /// Consume up to `n` oldest frames, clamped to what is buffered.
    pub fn read_up_to(&mut self, n: usize) -> SampleBlock {
        let n = n.min(self.total_frames());
        self.take_front(n)
    }

    /// Copy the `n` oldest frames without consuming them.
    pub fn peek(&self, n: usize) -> BufferResult<SampleBlock> {
        let total = self.total_frames();
        if n > total {
            return Err(BufferError::IndexOutOfRange {
                index: n as isize,
                len: total,
            });
        }
        Ok(self.copy_front(n))
    }

    /// Copy up to `n` oldest frames without consuming them.
    pub fn peek_up_to(&self, n: usize) -> SampleBlock {
        self.copy_front(n.min(self.total_frames()))
    }

    /// Drop every retained chunk.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    fn take_front(&mut self, mut need: usize) -> SampleBlock {
        let mut out = Vec::with_capacity(need * self.channels);
        while need > 0 {
            let Some(mut chunk) = self.chunks.pop_front() else {
                break;
            };
            if need >= chunk.frames() {
                need -= chunk.frames();
                out.extend_from_slice(chunk.data());
            } else {
                let rest = chunk.split_off(need);
                out.extend_from_slice(chunk.data());
                self.chunks.push_front(rest);
                need = 0;
            }
        }
        SampleBlock {
            channels: self.channels,
            data: out,
        }
    }

    fn copy_front(&self, mut need: usize) -> SampleBlock {
        let mut out = Vec::with_capacity(need * self.channels);
        for chunk in &self.chunks {
            if need == 0 {
                break;
            }
            let take = need.min(chunk.frames());
            out.extend_from_slice(&chunk.data()[..take * self.channels]);
            need -= take;
        }
        SampleBlock {
            channels: self.channels,
            data: out,
        }
    }
}
