//! Buffered capture sessions.
//!
//! A [`CaptureSession`] composes the pieces the rest of the crate
//! provides: a [`DataSource`] produces blocks, a [`PeriodicTask`] pulls
//! them on a fixed interval, and a shared [`CaptureBuffer`] stores them
//! under an exclusive-writer lock. Readers never touch the ingestion
//! path; they take [`BufferReader`] handles that pair a clock
//! [`Checkpoint`] with short-lived snapshot locks on the buffer.
//!
//! Stopping (or dropping) a session cancels ingestion but keeps the
//! buffered frames; a restarted session appends to what is already
//! there.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{trace, warn};

use crate::buffer::{GrowableBuffer, RingBuffer, SampleBlock};
use crate::clock::{Checkpoint, SamplingClock};
use crate::config::{BufferMode, StreamConfig};
use crate::error::{BufferError, StreamResult};
use crate::source::DataSource;
use crate::worker::PeriodicTask;

/// Capture store selected by [`BufferMode`].
///
/// `Append` accumulates into a [`GrowableBuffer`] capped at the
/// configured capacity; `Overwrite` keeps the newest frames in a
/// [`RingBuffer`] of exactly that capacity.
#[derive(Debug)]
pub enum CaptureBuffer {
    /// Grow until the cap, then reject.
    Append(GrowableBuffer),
    /// Fixed window, oldest evicted.
    Overwrite(RingBuffer),
}

impl CaptureBuffer {
    /// Build the store for `mode` with `capacity` frames of `channels`.
    pub fn new(mode: BufferMode, channels: usize, capacity: usize) -> Self {
        match mode {
            BufferMode::Append => Self::Append(GrowableBuffer::with_max_length(channels, capacity)),
            BufferMode::Overwrite => Self::Overwrite(RingBuffer::new(channels, capacity)),
        }
    }

    /// Channels per stored frame.
    pub fn channels(&self) -> usize {
        match self {
            Self::Append(buffer) => buffer.channels(),
            Self::Overwrite(buffer) => buffer.channels(),
        }
    }

    /// Buffered frames.
    pub fn len(&self) -> usize {
        match self {
            Self::Append(buffer) => buffer.len(),
            Self::Overwrite(buffer) => buffer.len(),
        }
    }

    /// True when no frames are buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frame bound: growth cap in append mode, window size in overwrite.
    pub fn capacity(&self) -> usize {
        match self {
            Self::Append(buffer) => buffer.max_length().unwrap_or(usize::MAX),
            Self::Overwrite(buffer) => buffer.capacity(),
        }
    }

    /// Store a block under the mode's policy.
    ///
    /// Append mode fails with [`BufferError::CapacityExceeded`] once the
    /// block no longer fits under the cap; overwrite mode evicts instead
    /// and only rejects blocks larger than the whole window.
    pub fn extend(&mut self, block: &SampleBlock) -> Result<(), BufferError> {
        match self {
            Self::Append(buffer) => buffer.extend(block),
            Self::Overwrite(buffer) => buffer.extend(block),
        }
    }

    /// Copy the newest `n` frames, clamped to what is buffered.
    pub fn latest_up_to(&self, n: usize) -> SampleBlock {
        match self {
            Self::Append(buffer) => buffer.latest_up_to(n),
            Self::Overwrite(buffer) => buffer.latest_up_to(n),
        }
    }

    /// Discard every buffered frame.
    pub fn clear(&mut self) {
        match self {
            Self::Append(buffer) => buffer.clear(),
            Self::Overwrite(buffer) => buffer.clear(),
        }
    }
}

/// Periodic ingestion from a source into a shared capture buffer.
///
/// `start` brings up the source, the session clock, and the pump task
/// together; `stop` tears them down in reverse. Start on a running
/// session and stop on an idle one are logged no-ops, so callers do not
/// have to track lifecycle state themselves.
pub struct CaptureSession {
    source: Arc<dyn DataSource>,
    buffer: Arc<Mutex<CaptureBuffer>>,
    clock: SamplingClock,
    interval: Duration,
    session_length: Option<Duration>,
    task: Option<PeriodicTask>,
}

impl CaptureSession {
    /// Build a session over `source`, sized and paced by `config`.
    ///
    /// The buffer takes its channel count and nominal rate from the
    /// source itself; `config` supplies the storage policy, capacity,
    /// pump interval, and optional session length.
    pub fn new(source: Arc<dyn DataSource>, config: &StreamConfig) -> Self {
        let buffer = CaptureBuffer::new(
            config.buffer_mode,
            source.channel_count(),
            config.capacity,
        );
        let clock = SamplingClock::new(source.sampling_rate());
        Self {
            source,
            buffer: Arc::new(Mutex::new(buffer)),
            clock,
            interval: config.interval,
            session_length: config.session_length,
            task: None,
        }
    }

    /// Pump interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True while the pump task is alive (a session length that ran out
    /// counts as stopped).
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Frames currently buffered.
    pub fn buffered_frames(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Handle on the session clock, for elapsed-time queries.
    pub fn clock(&self) -> SamplingClock {
        self.clock.clone()
    }

    /// A new independent reader over the captured frames.
    ///
    /// Each reader carries its own [`Checkpoint`], so consumers at
    /// different cadences never disturb each other or the pump.
    pub fn reader(&self) -> BufferReader {
        BufferReader {
            buffer: Arc::clone(&self.buffer),
            cursor: self.clock.checkpoint(),
        }
    }

    /// Re-expose the captured stream as a [`DataSource`].
    ///
    /// This is the seam for chaining a forwarding worker behind the
    /// session: the worker pulls from the buffer through its own reader
    /// instead of racing the pump for the underlying source.
    pub fn reader_source(&self) -> ReaderSource {
        ReaderSource {
            channels: self.buffer.lock().channels(),
            rate: self.clock.rate(),
            reader: Mutex::new(self.reader()),
        }
    }

    /// Start the source, the clock, and the ingestion pump.
    ///
    /// Warns and returns `Ok` if the session is already running.
    pub async fn start(&mut self) -> StreamResult<()> {
        if self.is_running() {
            warn!("capture session already running; start ignored");
            return Ok(());
        }
        self.source.start().await?;
        self.clock.start();

        let source = Arc::clone(&self.source);
        let buffer = Arc::clone(&self.buffer);
        let task = PeriodicTask::spawn(self.interval, self.session_length, move || {
            let source = Arc::clone(&source);
            let buffer = Arc::clone(&buffer);
            async move { pump(source.as_ref(), &buffer).await }
        });
        self.task = Some(task);
        Ok(())
    }

    /// Stop the pump, the clock, and the source. Buffered frames are
    /// kept for readers.
    ///
    /// Warns and returns `Ok` if the session is not running.
    pub async fn stop(&mut self) -> StreamResult<()> {
        let Some(mut task) = self.task.take() else {
            warn!("capture session not running; stop ignored");
            return Ok(());
        };
        task.stop().await;
        self.clock.stop();
        self.source.stop().await?;
        Ok(())
    }
}

/// One ingestion pass: pull whatever accumulated, store it.
///
/// Failures are logged and skipped; one bad pass must not kill the
/// schedule. The buffer lock is held only for the copy, never across an
/// await.
async fn pump(source: &dyn DataSource, buffer: &Mutex<CaptureBuffer>) {
    let block = match source.get_data(None).await {
        Ok(block) => block,
        Err(error) => {
            warn!(%error, "capture pull failed; skipping pass");
            return;
        }
    };
    if block.is_empty() {
        trace!("capture pass found no new frames");
        return;
    }

    let frames = block.frames();
    let stored = buffer.lock().extend(&block);
    match stored {
        Ok(()) => trace!(frames, "captured block"),
        Err(error @ BufferError::CapacityExceeded { .. }) => {
            warn!(%error, frames, "capture buffer full; block dropped");
        }
        Err(error) => warn!(%error, frames, "capture buffer rejected block"),
    }
}

/// Independent consumer handle over a session's buffer.
///
/// Pairs a clock [`Checkpoint`] (how many frames arrived since this
/// reader last looked) with clamped snapshot reads of the shared
/// buffer. Reads copy data out under a short lock and never consume
/// from the buffer, so any number of readers can coexist.
pub struct BufferReader {
    buffer: Arc<Mutex<CaptureBuffer>>,
    cursor: Checkpoint,
}

impl BufferReader {
    /// Frames produced since this reader last read, without reading.
    pub fn pending(&self) -> usize {
        self.cursor.samples_available()
    }

    /// Copy the newest `n` frames, clamped to what is buffered. Does not
    /// move this reader's cursor.
    pub fn latest(&self, n: usize) -> SampleBlock {
        self.buffer.lock().latest_up_to(n)
    }

    /// Everything new since the last call, clamped to what is still
    /// buffered.
    ///
    /// The count comes from this reader's checkpoint; a slow reader on a
    /// full overwrite-mode buffer gets at most the window that survived.
    pub fn since_last(&mut self) -> SampleBlock {
        let n = self.cursor.take();
        self.buffer.lock().latest_up_to(n)
    }

    /// Advance the cursor to "now" without copying anything out.
    pub fn mark_read(&mut self) {
        self.cursor.mark_read();
    }
}

/// A session's buffer behind the [`DataSource`] trait.
///
/// Pulls go through one private [`BufferReader`], so a downstream
/// worker sees every captured frame exactly once. `start`/`stop` are
/// accepted and ignored; the owning [`CaptureSession`] drives the real
/// lifecycle.
pub struct ReaderSource {
    channels: usize,
    rate: u32,
    reader: Mutex<BufferReader>,
}

#[async_trait]
impl DataSource for ReaderSource {
    fn channel_count(&self) -> usize {
        self.channels
    }

    fn sampling_rate(&self) -> u32 {
        self.rate
    }

    async fn start(&self) -> StreamResult<()> {
        Ok(())
    }

    async fn stop(&self) -> StreamResult<()> {
        Ok(())
    }

    /// `None` hands over everything new since the last pull. An explicit
    /// count still consumes the pending range but returns only its
    /// newest `n` frames, the way an overwrite store would.
    async fn get_data(&self, n_samples: Option<usize>) -> StreamResult<SampleBlock> {
        let mut reader = self.reader.lock();
        let mut block = reader.since_last();
        if let Some(n) = n_samples {
            let skip = block.frames().saturating_sub(n);
            if skip > 0 {
                block = block.split_off(skip);
            }
        }
        Ok(block)
    }

    async fn get_current_data(&self, n_samples: Option<usize>) -> StreamResult<SampleBlock> {
        let reader = self.reader.lock();
        Ok(reader.latest(n_samples.unwrap_or(usize::MAX)))
    }
}
