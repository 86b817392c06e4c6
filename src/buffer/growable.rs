//! Contiguous sample store with doubling growth.

use super::{resolve_index, resolve_window, SampleBlock};
use crate::error::{BufferError, BufferResult};

/// Growable contiguous store of interleaved frames.
///
/// Capacity doubles whenever an append or extend would overflow it, capped
/// at `max_length` if one is set. A growth step that cannot reach the
/// required capacity fails with [`BufferError::CapacityExceeded`] and
/// leaves the buffer untouched. Capacity never shrinks.
#[derive(Debug, Clone)]
pub struct GrowableBuffer {
    channels: usize,
    /// Backing store, always `capacity * channels` values long.
    data: Vec<f64>,
    /// Valid frames, occupying the front of `data`.
    len: usize,
    capacity: usize,
    max_length: Option<usize>,
}

impl GrowableBuffer {
    /// Initial capacity, in frames, when none is requested.
    pub const DEFAULT_CAPACITY: usize = 16;

    /// Unbounded buffer with the default initial capacity.
    pub fn new(channels: usize) -> Self {
        Self::with_capacity(channels, Self::DEFAULT_CAPACITY)
    }

    /// Unbounded buffer with an explicit initial capacity (min 1 frame).
    pub fn with_capacity(channels: usize, capacity: usize) -> Self {
        let channels = channels.max(1);
        let capacity = capacity.max(1);
        Self {
            channels,
            data: vec![0.0; capacity * channels],
            len: 0,
            capacity,
            max_length: None,
        }
    }

    /// Buffer whose capacity may never exceed `max_length` frames.
    ///
    /// The initial capacity is the default, clamped to the cap.
    pub fn with_max_length(channels: usize, max_length: usize) -> Self {
        let max_length = max_length.max(1);
        let mut buf = Self::with_capacity(channels, Self::DEFAULT_CAPACITY.min(max_length));
        buf.max_length = Some(max_length);
        buf
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

    /// Current physical capacity in frames.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Growth cap in frames, if any.
    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    /// Append one frame.
    pub fn append(&mut self, frame: &[f64]) -> BufferResult<()> {
        if frame.len() != self.channels {
            return Err(BufferError::LengthMismatch {
                expected: self.channels,
                actual: frame.len(),
            });
        }
        self.ensure_capacity(self.len + 1)?;
        let start = self.len * self.channels;
        self.data[start..start + self.channels].copy_from_slice(frame);
        self.len += 1;
        Ok(())
    }

    /// Append every frame of `block`. O(1) amortized per frame.
    pub fn extend(&mut self, block: &SampleBlock) -> BufferResult<()> {
        if block.channels() != self.channels {
            return Err(BufferError::LengthMismatch {
                expected: self.channels,
                actual: block.channels(),
            });
        }
        if block.is_empty() {
            return Ok(());
        }
        self.ensure_capacity(self.len + block.frames())?;
        let start = self.len * self.channels;
        self.data[start..start + block.data().len()].copy_from_slice(block.data());
        self.len += block.frames();
        Ok(())
    }

    /// Consume the `n` oldest frames.
    ///
    /// Fails with [`BufferError::IndexOutOfRange`] if fewer than `n`
    /// frames are buffered; `read_up_to` is the clamping variant.
    pub fn read(&mut self, n: usize) -> BufferResult<SampleBlock> {
        let block = self.peek(n)?;
        self.drain_front(n);
        Ok(block)
    }

    /// Consume up to `n` oldest frames, clamped to what is buffered.
    pub fn read_up_to(&mut self, n: usize) -> SampleBlock {
        let n = n.min(self.len);
        let block = self.copy_frames(0, n);
        self.drain_front(n);
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
        Ok(self.copy_frames(0, n))
    }

    /// Copy up to `n` oldest frames without consuming them.
    pub fn peek_up_to(&self, n: usize) -> SampleBlock {
        self.copy_frames(0, n.min(self.len))
    }

    /// Copy the `n` newest frames without consuming them.
    pub fn latest(&self, n: usize) -> BufferResult<SampleBlock> {
        if n > self.len {
            return Err(BufferError::IndexOutOfRange {
                index: n as isize,
                len: self.len,
            });
        }
        Ok(self.copy_frames(self.len - n, self.len))
    }

    /// Copy up to `n` newest frames without consuming them.
    pub fn latest_up_to(&self, n: usize) -> SampleBlock {
        let n = n.min(self.len);
        self.copy_frames(self.len - n, self.len)
    }

    /// View one frame; negative indices count from the newest end.
    pub fn frame(&self, index: isize) -> BufferResult<&[f64]> {
        let i = resolve_index(index, self.len)?;
        let start = i * self.channels;
        Ok(&self.data[start..start + self.channels])
    }

    /// Copy the `[start, end)` frame window; bounds may be negative.
    pub fn window(&self, start: isize, end: isize) -> BufferResult<SampleBlock> {
        let (lo, hi) = resolve_window(start, end, self.len)?;
        Ok(self.copy_frames(lo, hi))
    }

    /// Remove the frames at `indices`, compacting in place. O(len).
    ///
    /// All indices are validated before anything is removed; duplicates
    /// are tolerated.
    pub fn delete(&mut self, indices: &[isize]) -> BufferResult<()> {
        let mut doomed = vec![false; self.len];
        for &index in indices {
            doomed[resolve_index(index, self.len)?] = true;
        }
        let mut write = 0;
        for read in 0..self.len {
            if doomed[read] {
                continue;
            }
            if write != read {
                let src = read * self.channels;
                let dst = write * self.channels;
                self.data.copy_within(src..src + self.channels, dst);
            }
            write += 1;
        }
        self.len = write;
        Ok(())
    }

    /// Grow the physical capacity to exactly `new_capacity` frames.
    ///
    /// Shrinking is rejected, as is growing past `max_length`.
    pub fn resize(&mut self, new_capacity: usize) -> BufferResult<()> {
        if new_capacity < self.capacity {
            return Err(BufferError::CapacityExceeded {
                requested: new_capacity,
                capacity: self.capacity,
            });
        }
        if let Some(max) = self.max_length {
            if new_capacity > max {
                return Err(BufferError::CapacityExceeded {
                    requested: new_capacity,
                    capacity: max,
                });
            }
        }
        self.data.resize(new_capacity * self.channels, 0.0);
        self.capacity = new_capacity;
        Ok(())
    }

    /// Drop all frames. Capacity is untouched.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    fn copy_frames(&self, start: usize, end: usize) -> SampleBlock {
        let data = self.data[start * self.channels..end * self.channels].to_vec();
        SampleBlock {
            channels: self.channels,
            data,
        }
    }

    fn drain_front(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        self.data
            .copy_within(n * self.channels..self.len * self.channels, 0);
        self.len -= n;
    }

    /// Double the capacity (capped) until `needed` frames fit.
    fn ensure_capacity(&mut self, needed: usize) -> BufferResult<()> {
        if needed <= self.capacity {
            return Ok(());
        }
        let mut new_capacity = self.capacity;
        while new_capacity < needed {
            let mut next = new_capacity * 2;
            if let Some(max) = self.max_length {
                next = next.min(max);
            }
            if next <= new_capacity {
                return Err(BufferError::CapacityExceeded {
                    requested: needed,
                    capacity: new_capacity,
                });
            }
            new_capacity = next;
        }
        self.data.resize(new_capacity * self.channels, 0.0);
        self.capacity = new_capacity;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono(values: &[f64]) -> SampleBlock {
        SampleBlock::from_interleaved(1, values.to_vec()).unwrap()
    }

    #[test]
    fn capacity_doubles_and_always_covers_len() {
        let mut buf = GrowableBuffer::new(1);
        assert_eq!(buf.capacity(), 16);
        for i in 0..100 {
            buf.append(&[i as f64]).unwrap();
            assert!(buf.capacity() >= buf.len());
            // Doubling from the default keeps capacity a power-of-two multiple.
            assert_eq!(buf.capacity() % 16, 0);
            assert!((buf.capacity() / 16).is_power_of_two());
        }
        assert_eq!(buf.len(), 100);
        assert_eq!(buf.capacity(), 128);
    }

    #[test]
    fn growth_stops_at_max_length() {
        let mut buf = GrowableBuffer::with_max_length(1, 20);
        assert_eq!(buf.capacity(), 16);
        buf.extend(&mono(&[0.0; 20])).unwrap();
        assert_eq!(buf.capacity(), 20);

        let err = buf.append(&[1.0]).unwrap_err();
        assert_eq!(
            err,
            BufferError::CapacityExceeded {
                requested: 21,
                capacity: 20
            }
        );
        assert_eq!(buf.len(), 20);
    }

    #[test]
    fn initial_capacity_clamped_to_cap() {
        let buf = GrowableBuffer::with_max_length(1, 4);
        assert_eq!(buf.capacity(), 4);
        assert_eq!(buf.max_length(), Some(4));
    }

    #[test]
    fn read_consumes_oldest_first() {
        let mut buf = GrowableBuffer::new(1);
        buf.extend(&mono(&[1.0, 2.0, 3.0, 4.0])).unwrap();

        let head = buf.read(2).unwrap();
        assert_eq!(head.data(), &[1.0, 2.0]);
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.frame(0).unwrap(), &[3.0]);

        assert!(buf.read(3).is_err());
        assert_eq!(buf.len(), 2, "failed read must not consume");

        let rest = buf.read_up_to(10);
        assert_eq!(rest.data(), &[3.0, 4.0]);
        assert!(buf.is_empty());
    }

    #[test]
    fn peek_and_latest_leave_data_in_place() {
        let mut buf = GrowableBuffer::new(2);
        buf.extend(&SampleBlock::from_interleaved(2, vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0]).unwrap())
            .unwrap();

        assert_eq!(buf.peek(2).unwrap().data(), &[1.0, 10.0, 2.0, 20.0]);
        assert_eq!(buf.latest(1).unwrap().data(), &[3.0, 30.0]);
        assert_eq!(buf.latest_up_to(9).frames(), 3);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn negative_indexing_counts_from_newest() {
        let mut buf = GrowableBuffer::new(1);
        buf.extend(&mono(&[5.0, 6.0, 7.0])).unwrap();
        assert_eq!(buf.frame(-1).unwrap(), &[7.0]);
        assert_eq!(buf.window(-2, 3).unwrap().data(), &[6.0, 7.0]);
        assert!(buf.frame(3).is_err());
    }

    #[test]
    fn delete_compacts_in_place() {
        let mut buf = GrowableBuffer::new(1);
        buf.extend(&mono(&[0.0, 1.0, 2.0, 3.0, 4.0])).unwrap();
        buf.delete(&[1, -2, 1]).unwrap();
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.peek_up_to(5).data(), &[0.0, 2.0, 4.0]);

        // A bad index leaves the buffer untouched.
        assert!(buf.delete(&[7]).is_err());
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn resize_grows_only() {
        let mut buf = GrowableBuffer::with_max_length(1, 64);
        buf.resize(32).unwrap();
        assert_eq!(buf.capacity(), 32);
        assert!(buf.resize(16).is_err());
        assert!(buf.resize(128).is_err());
        assert_eq!(buf.capacity(), 32);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let mut buf = GrowableBuffer::new(2);
        assert!(matches!(
            buf.append(&[1.0]),
            Err(BufferError::LengthMismatch {
                expected: 2,
                actual: 1
            })
        ));
        let block = SampleBlock::from_interleaved(3, vec![0.0; 6]).unwrap();
        assert!(buf.extend(&block).is_err());
        assert!(buf.is_empty());
    }
}
