//! Bounded sample stores for irregularly-arriving time-series blocks.
//!
//! Three variants cover the storage policies the pipeline needs:
//!
//! - [`GrowableBuffer`]: contiguous store with doubling growth, optionally
//!   capped. Ingestion in append mode.
//! - [`RingBuffer`]: fixed capacity, overwrites the oldest samples once
//!   full. Ingestion in overwrite mode; never reallocates.
//! - [`ChunkRingBuffer`]: queue of whole blocks bounded by *chunk count*,
//!   with reads that split a block when the request lands inside one.
//!
//! # Frames and interleaving
//!
//! All stores hold multi-channel samples ("frames") as interleaved `f64`
//! values with a channel count fixed at construction. Logical length is
//! counted in frames; one frame is always contiguous in memory, so only
//! frame boundaries wrap in the ring variant.
//!
//! # Read surface
//!
//! Every store exposes the same quartet on its oldest end: `read(n)` and
//! `peek(n)` fail with [`BufferError::IndexOutOfRange`] when fewer than
//! `n` frames are buffered, while `read_up_to(n)` and `peek_up_to(n)`
//! clamp to what is available. Expected boundary conditions are options,
//! not control-flow errors.
//!
//! # Concurrency
//!
//! The stores are plain single-threaded values. Cross-thread use goes
//! through an exclusive-writer discipline: one mutating context, readers
//! copying windows out under a short-lived lock (see `capture`).

mod chunk;
mod growable;
mod ring;

pub use chunk::ChunkRingBuffer;
pub use growable::GrowableBuffer;
pub use ring::RingBuffer;

use crate::error::{BufferError, BufferResult};

/// One ingested block of interleaved multi-channel samples.
///
/// `data.len()` is always a multiple of `channels`; the value at frame
/// `f`, channel `c` lives at `data[f * channels + c]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBlock {
    channels: usize,
    data: Vec<f64>,
}

impl SampleBlock {
    /// Wrap an interleaved value vector.
    ///
    /// Fails with [`BufferError::LengthMismatch`] if `channels` is zero or
    /// `data.len()` is not a multiple of `channels`.
    pub fn from_interleaved(channels: usize, data: Vec<f64>) -> BufferResult<Self> {
        if channels == 0 || data.len() % channels != 0 {
            return Err(BufferError::LengthMismatch {
                expected: channels,
                actual: data.len(),
            });
        }
        Ok(Self { channels, data })
    }

    /// Internal constructor for blocks assembled from already-interleaved
    /// values. Callers guarantee `data.len()` is a multiple of `channels`.
    pub(crate) fn from_parts(channels: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len() % channels.max(1), 0);
        Self { channels, data }
    }

    /// A block of `frames` zeroed frames.
    pub fn zeros(channels: usize, frames: usize) -> Self {
        Self {
            channels: channels.max(1),
            data: vec![0.0; channels.max(1) * frames],
        }
    }

    /// Channel count of every frame in the block.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of frames in the block.
    pub fn frames(&self) -> usize {
        self.data.len() / self.channels
    }

    /// True if the block holds no frames.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Interleaved values, oldest frame first.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Consume the block, returning the interleaved values.
    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// View one frame.
    pub fn frame(&self, index: usize) -> Option<&[f64]> {
        let start = index.checked_mul(self.channels)?;
        self.data.get(start..start + self.channels)
    }

    /// Split the block at `frame`, returning the tail.
    ///
    /// `self` keeps frames `[0, frame)`; the returned block holds the
    /// rest. `frame` past the end returns an empty tail.
    pub fn split_off(&mut self, frame: usize) -> SampleBlock {
        let at = (frame * self.channels).min(self.data.len());
        SampleBlock {
            channels: self.channels,
            data: self.data.split_off(at),
        }
    }

    /// Serialize as little-endian `f64` values for wire transmission.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() * 8);
        for value in &self.data {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }
}

/// Resolve a possibly-negative frame index against `len`.
///
/// Negative indices count from the end, Python-style: `-1` is the newest
/// frame. Anything that lands outside `[0, len)` is an error.
pub(crate) fn resolve_index(index: isize, len: usize) -> BufferResult<usize> {
    let resolved = if index < 0 {
        index + len as isize
    } else {
        index
    };
    if resolved < 0 || resolved as usize >= len {
        return Err(BufferError::IndexOutOfRange { index, len });
    }
    Ok(resolved as usize)
}

/// Resolve a possibly-negative `[start, end)` frame window against `len`.
///
/// Both bounds may be negative; after resolution the window must satisfy
/// `start <= end <= len`. `end == len` is allowed so `window(0, len)`
/// covers the whole store.
pub(crate) fn resolve_window(
    start: isize,
    end: isize,
    len: usize,
) -> BufferResult<(usize, usize)> {
    let fix = |bound: isize| {
        if bound < 0 {
            bound + len as isize
        } else {
            bound
        }
    };
    let (lo, hi) = (fix(start), fix(end));
    if lo < 0 || hi < lo || hi as usize > len {
        let offender = if lo < 0 || lo as usize > len { start } else { end };
        return Err(BufferError::IndexOutOfRange {
            index: offender,
            len,
        });
    }
    Ok((lo as usize, hi as usize))
}
