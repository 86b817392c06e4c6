//! Fixed-capacity ring store that overwrites the oldest frames.

use super::{resolve_index, resolve_window, SampleBlock};
use crate::error::{BufferError, BufferResult};

/// Ring buffer of interleaved frames with overwrite-oldest eviction.
///
/// Capacity is fixed at construction and the backing store is never
/// reallocated. Logical frame `i` lives in physical slot
/// `(zero + i) % capacity`; writes that would exceed capacity advance
/// `zero`, evicting the oldest frames FIFO, and logical length saturates
/// at capacity. A single block larger than the whole buffer is rejected
/// rather than partially applied.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    channels: usize,
    /// Backing store, always `capacity * channels` values long.
    data: Vec<f64>,
    /// Physical frame slot of logical index 0.
    zero: usize,
    /// Valid frames, at most `capacity`.
    len: usize,
    capacity: usize,
}

impl RingBuffer {
    /// Ring holding at most `capacity` frames (min 1).
    pub fn new(channels: usize, capacity: usize) -> Self {
        let channels = channels.max(1);
        let capacity = capacity.max(1);
        Self {
            channels,
            data: vec![0.0; capacity * channels],
            zero: 0,
            len: 0,
            capacity,
        }
    }

    /// Channel count of every stored frame.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of valid frames.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if no frames are stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True once every slot holds a valid frame.
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// Fixed capacity in frames.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append one frame, evicting the oldest if full.
    pub fn append(&mut self, frame: &[f64]) -> BufferResult<()> {
        if frame.len() != self.channels {
            return Err(BufferError::LengthMismatch {
                expected: self.channels,
                actual: frame.len(),
            });
        }
        let slot = (self.zero + self.len) % self.capacity;
        let start = slot * self.channels;
        self.data[start..start + self.channels].copy_from_slice(frame);
        if self.len == self.capacity {
            self.zero = (self.zero + 1) % self.capacity;
        } else {
            self.len += 1;
        }
        Ok(())
    }

    /// Append every frame of `block`, evicting the oldest on overflow.
    ///
    /// A block with more frames than the whole capacity fails with
    /// [`BufferError::CapacityExceeded`]; nothing is written.
    pub fn extend(&mut self, block: &SampleBlock) -> BufferResult<()> {
        if block.channels() != self.channels {
            return Err(BufferError::LengthMismatch {
                expected: self.channels,
                actual: block.channels(),
            });
        }
        let incoming = block.frames();
        if incoming > self.capacity {
            return Err(BufferError::CapacityExceeded {
                requested: incoming,
                capacity: self.capacity,
            });
        }
        if incoming == 0 {
            return Ok(());
        }

        // Write in at most two contiguous runs, splitting at the physical end.
        let first_slot = (self.zero + self.len) % self.capacity;
        let run1 = incoming.min(self.capacity - first_slot);
        let dst = first_slot * self.channels;
        let split = run1 * self.channels;
        self.data[dst..dst + split].copy_from_slice(&block.data()[..split]);
        if run1 < incoming {
            let rest = (incoming - run1) * self.channels;
            self.data[..rest].copy_from_slice(&block.data()[split..split + rest]);
        }

        let overflow = (self.len + incoming).saturating_sub(self.capacity);
        self.zero = (self.zero + overflow) % self.capacity;
        self.len = (self.len + incoming).min(self.capacity);
        Ok(())
    }

    /// Consume the `n` oldest frames; fails if fewer are buffered.
    pub fn read(&mut self, n: usize) -> BufferResult<SampleBlock> {
        let block = self.peek(n)?;
        self.consume(n);
        Ok(block)
    }

    /// Consume up to `n` oldest frames, clamped to what is buffered.
    pub fn read_up_to(&mut self, n: usize) -> SampleBlock {
        let n = n.min(self.len);
        let block = self.copy_logical(0, n);
        self.consume(n);
        block
    }

    /// Copy the `n` oldest frames without consuming them.
    pub fn peek(&self, n: usize) -> BufferResult<SampleBlock> {
        if n > self.len {
            return Err(BufferError::IndexOutOfRange {
                index: n as isize,
                len: self.len,
            });
        }
        Ok(self.copy_logical(0, n))
    }

    /// Copy up to `n` oldest frames without consuming them.
    pub fn peek_up_to(&self, n: usize) -> SampleBlock {
        self.copy_logical(0, n.min(self.len))
    }

    /// Copy the `n` newest frames without consuming them.
    pub fn latest(&self, n: usize) -> BufferResult<SampleBlock> {
        if n > self.len {
            return Err(BufferError::IndexOutOfRange {
                index: n as isize,
                len: self.len,
            });
        }
        Ok(self.copy_logical(self.len - n, self.len))
    }

    /// Copy up to `n` newest frames without consuming them.
    pub fn latest_up_to(&self, n: usize) -> SampleBlock {
        let n = n.min(self.len);
        self.copy_logical(self.len - n, self.len)
    }

    /// View one frame; negative indices count from the newest end.
    ///
    /// Frames never straddle the wrap point, so the view is contiguous.
    pub fn frame(&self, index: isize) -> BufferResult<&[f64]> {
        let i = resolve_index(index, self.len)?;
        let slot = (self.zero + i) % self.capacity;
        let start = slot * self.channels;
        Ok(&self.data[start..start + self.channels])
    }

    /// Copy the `[start, end)` frame window; bounds may be negative.
    pub fn window(&self, start: isize, end: isize) -> BufferResult<SampleBlock> {
        let (lo, hi) = resolve_window(start, end, self.len)?;
        Ok(self.copy_logical(lo, hi))
    }

    /// Cyclically shift the logical window by `shift` frames.
    ///
    /// Positive shifts move every frame toward the newest end, with the
    /// newest frames wrapping around to the front (numpy `roll` order).
    /// O(1) when the ring is full, O(len) otherwise.
    pub fn roll(&mut self, shift: isize) {
        if self.len == 0 {
            return;
        }
        let s = shift.rem_euclid(self.len as isize) as usize;
        if s == 0 {
            return;
        }
        if self.len == self.capacity {
            // Full ring: rolling is just re-basing the zero slot.
            self.zero = (self.zero + self.len - s) % self.capacity;
            return;
        }
        let mut scratch = self.copy_logical(0, self.len).into_data();
        scratch.rotate_right(s * self.channels);
        self.write_back(&scratch);
    }

    /// Remove the frames at `indices`, compacting to the front. O(len).
    ///
    /// All indices are validated before anything is removed; the zero
    /// slot resets to 0 afterward.
    pub fn delete(&mut self, indices: &[isize]) -> BufferResult<()> {
        let mut doomed = vec![false; self.len];
        for &index in indices {
            doomed[resolve_index(index, self.len)?] = true;
        }
        let survivors = self.copy_logical(0, self.len);
        let mut kept = Vec::with_capacity(survivors.data().len());
        for (i, frame) in survivors.data().chunks_exact(self.channels).enumerate() {
            if !doomed[i] {
                kept.extend_from_slice(frame);
            }
        }
        self.len = kept.len() / self.channels;
        self.write_back(&kept);
        Ok(())
    }

    /// Drop all frames and reset the zero slot.
    pub fn clear(&mut self) {
        self.len = 0;
        self.zero = 0;
    }

    fn consume(&mut self, n: usize) {
        self.zero = (self.zero + n) % self.capacity;
        self.len -= n;
        if self.len == 0 {
            self.zero = 0;
        }
    }

    /// Copy logical frames `[start, end)` in at most two runs.
    fn copy_logical(&self, start: usize, end: usize) -> SampleBlock {
        let n = end - start;
        let mut data = Vec::with_capacity(n * self.channels);
        if n > 0 {
            let first_slot = (self.zero + start) % self.capacity;
            let run1 = n.min(self.capacity - first_slot);
            let src = first_slot * self.channels;
            data.extend_from_slice(&self.data[src..src + run1 * self.channels]);
            if run1 < n {
                data.extend_from_slice(&self.data[..(n - run1) * self.channels]);
            }
        }
        SampleBlock {
            channels: self.channels,
            data,
        }
    }

    /// Overwrite the store with already-logical-order values, zero at 0.
    fn write_back(&mut self, values: &[f64]) {
        self.data[..values.len()].copy_from_slice(values);
        self.zero = 0;
    }
}
