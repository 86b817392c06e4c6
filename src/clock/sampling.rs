//! Elapsed-time to sample-count translation with per-consumer cursors.
//!
//! A [`SamplingClock`] pairs a [`Timer`] with a nominal sample rate and
//! answers "how many samples should exist by now". Consumers that poll at
//! their own cadence each register a [`Checkpoint`]; the checkpoint owns
//! its consumer's "last read" cursor, so one viewer draining the stream
//! never resets what a slower forwarder still has pending. The clock
//! itself stores no read cursor at all.
//!
//! Counts are nominal: `floor(rate × elapsed)` against a monotonic clock,
//! independent of actual arrival jitter.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::{Duration, Instant};

use super::timer::Timer;

#[derive(Debug)]
struct ClockShared {
    /// Nominal samples per second.
    rate: u32,
    /// Cap applied to checkpointed reads, so a consumer that slept for a
    /// long stretch cannot demand an unbounded block.
    max_batch: Option<usize>,
    timer: Mutex<Timer>,
}

impl ClockShared {
    /// `floor(rate × span)`, in integer nanoseconds so counts near whole
    /// samples never wobble with float rounding.
    fn count(&self, span: Duration) -> usize {
        (span.as_nanos() * u128::from(self.rate) / 1_000_000_000) as usize
    }
}

/// Shared sampling clock. Cloning yields a handle to the same clock.
#[derive(Clone)]
pub struct SamplingClock {
    shared: Arc<ClockShared>,
}

impl SamplingClock {
    /// Clock ticking at `rate` samples per second (min 1).
    pub fn new(rate: u32) -> Self {
        Self::build(rate, None)
    }

    /// Clock whose checkpointed reads are capped at `max_batch` samples.
    pub fn with_max_batch(rate: u32, max_batch: usize) -> Self {
        Self::build(rate, Some(max_batch))
    }

    fn build(rate: u32, max_batch: Option<usize>) -> Self {
        Self {
            shared: Arc::new(ClockShared {
                rate: rate.max(1),
                max_batch,
                timer: Mutex::new(Timer::new()),
            }),
        }
    }

    /// Nominal samples per second.
    pub fn rate(&self) -> u32 {
        self.shared.rate
    }

    /// Per-read cap, if any.
    pub fn max_batch(&self) -> Option<usize> {
        self.shared.max_batch
    }

    /// Start (or restart) counting from the current instant.
    pub fn start(&self) {
        self.shared.timer.lock().start();
    }

    /// Freeze the count at the current instant.
    pub fn stop(&self) {
        self.shared.timer.lock().stop();
    }

    /// Forget the interval entirely.
    pub fn reset(&self) {
        self.shared.timer.lock().reset();
    }

    /// True between `start()` and `stop()`.
    pub fn is_running(&self) -> bool {
        self.shared.timer.lock().is_running()
    }

    /// Elapsed time of the underlying timer.
    pub fn elapsed(&self) -> Duration {
        self.shared.timer.lock().elapsed()
    }

    /// Nominal samples produced since `start()`: `floor(rate × elapsed)`.
    ///
    /// Zero if the clock was never started. Not subject to `max_batch`;
    /// the cap applies to checkpointed reads only.
    pub fn samples_since_start(&self) -> usize {
        self.shared.count(self.shared.timer.lock().elapsed())
    }

    /// Register an independent consumer cursor.
    ///
    /// The new checkpoint starts at the clock's start time, so its first
    /// read covers everything produced so far.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            shared: Arc::clone(&self.shared),
            cursor: None,
        }
    }
}

impl std::fmt::Debug for SamplingClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplingClock")
            .field("rate", &self.shared.rate)
            .field("max_batch", &self.shared.max_batch)
            .field("running", &self.is_running())
            .finish()
    }
}

/// Per-consumer read cursor on one [`SamplingClock`].
///
/// Holds the instant this consumer last read; `samples_available()` counts
/// from there, so distinct consumers see distinct backlogs. Dropping the
/// checkpoint detaches the consumer; nothing on the clock remembers it.
#[derive(Debug)]
pub struct Checkpoint {
    shared: Arc<ClockShared>,
    /// Last read instant; `None` means never read (count from start).
    cursor: Option<Instant>,
}

impl Checkpoint {
    /// Nominal samples produced since this consumer last read.
    ///
    /// `floor(rate × (now − last_read))`, measured to the clock's stop
    /// instant once stopped, and capped at the clock's `max_batch` if one
    /// is set. Zero if the clock was never started.
    pub fn samples_available(&self) -> usize {
        self.pending().0
    }

    /// Move the cursor up to the clock's current readable instant.
    pub fn mark_read(&mut self) {
        let (_, reference) = self.pending();
        if let Some(reference) = reference {
            self.cursor = Some(reference);
        }
    }

    /// `samples_available()` and `mark_read()` as one consistent step.
    ///
    /// The returned count and the new cursor are taken from the same
    /// instant, so samples are never skipped between the two.
    pub fn take(&mut self) -> usize {
        let (count, reference) = self.pending();
        if let Some(reference) = reference {
            self.cursor = Some(reference);
        }
        count
    }

    /// Nominal rate of the owning clock.
    pub fn rate(&self) -> u32 {
        self.shared.rate
    }

    fn pending(&self) -> (usize, Option<Instant>) {
        let timer = self.shared.timer.lock();
        let (Some(started), Some(reference)) = (timer.started_at(), timer.reference_instant())
        else {
            return (0, None);
        };
        drop(timer);

        // A cursor predating the current start (clock restarted) counts
        // from the new start.
        let from = match self.cursor {
            Some(cursor) if cursor > started => cursor,
            _ => started,
        };
        let mut count = self.shared.count(reference.saturating_duration_since(from));
        if let Some(max) = self.shared.max_batch {
            count = count.min(max);
        }
        (count, Some(reference))
    }
}
