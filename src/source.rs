//! Acquisition source capability and the built-in test sources.
//!
//! [`DataSource`] is the seam between the pipeline and whatever produces
//! samples: a hardware board, an audio callback, a synthetic generator.
//! Workers hold sources as `Arc<dyn DataSource>` values injected at
//! construction, never by subclassing a transport.
//!
//! Two implementations ship with the crate: [`RandomSource`] generates
//! uniform noise at a nominal rate, [`PlaybackSource`] loops over a
//! recorded block. Both pace `get_data(None)` by elapsed wall-clock time
//! through a [`SamplingClock`], the same way a real board's driver hands
//! out however many samples accumulated since the last pull.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::buffer::{RingBuffer, SampleBlock};
use crate::clock::{Checkpoint, SamplingClock};
use crate::error::{BufferResult, StreamError, StreamResult};

/// Capability: block-oriented sample acquisition.
///
/// # Contract
/// - `get_data` is destructive: frames handed out are consumed, and
///   `None` means "everything new since my last pull", paced by the
///   source's own clock.
/// - `get_current_data` is a non-destructive peek at the newest frames,
///   for live views that must not steal from the forwarding path.
/// - Both return an empty block when nothing is available; running dry
///   is an expected condition, not an error.
/// - `start`/`stop` bracket acquisition. Pulling from a stopped source
///   yields empty blocks.
///
/// # Thread Safety
/// - All methods take `&self`; implementations use interior mutability
///   so one instance can be shared behind an `Arc`.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Channels in every produced frame.
    fn channel_count(&self) -> usize;

    /// Nominal samples per second.
    fn sampling_rate(&self) -> u32;

    /// Begin producing. Restarting an already-running source rebases its
    /// pacing clock.
    async fn start(&self) -> StreamResult<()>;

    /// Stop producing. Subsequent pulls yield empty blocks.
    async fn stop(&self) -> StreamResult<()>;

    /// Consume up to `n_samples` frames (`None`: all new since last pull).
    async fn get_data(&self, n_samples: Option<usize>) -> StreamResult<SampleBlock>;

    /// Peek at the newest `n_samples` frames without consuming
    /// (`None`: everything retained).
    async fn get_current_data(&self, n_samples: Option<usize>) -> StreamResult<SampleBlock>;
}

/// How many seconds of recent frames a source retains for peeks.
const RETAIN_SECS: usize = 2;

struct RandomInner {
    cursor: Checkpoint,
    /// Newest frames, retained only to serve `get_current_data`.
    recent: RingBuffer,
}

/// Synthetic source producing uniform noise in `[bias, bias + scale)`.
///
/// Pulls are paced by elapsed time at the nominal rate; a single pull is
/// capped at the retention window so a long-slept caller gets a bounded
/// block.
pub struct RandomSource {
    channels: usize,
    scale: f64,
    bias: f64,
    clock: SamplingClock,
    inner: Mutex<RandomInner>,
}

impl RandomSource {
    /// Noise source with unit scale and zero bias.
    pub fn new(channels: usize, rate: u32) -> Self {
        Self::with_amplitude(channels, rate, 1.0, 0.0)
    }

    /// Noise source yielding `scale * uniform(0, 1) + bias`.
    pub fn with_amplitude(channels: usize, rate: u32, scale: f64, bias: f64) -> Self {
        let channels = channels.max(1);
        let retain = (rate.max(1) as usize) * RETAIN_SECS;
        let clock = SamplingClock::with_max_batch(rate, retain);
        let cursor = clock.checkpoint();
        Self {
            channels,
            scale,
            bias,
            clock,
            inner: Mutex::new(RandomInner {
                cursor,
                recent: RingBuffer::new(channels, retain),
            }),
        }
    }

    fn generate(&self, frames: usize) -> SampleBlock {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let data = (0..frames * self.channels)
            .map(|_| self.scale * rng.gen::<f64>() + self.bias)
            .collect();
        SampleBlock::from_parts(self.channels, data)
    }

    /// Keep only the newest frames that fit the retention ring.
    fn retain(recent: &mut RingBuffer, block: &SampleBlock) -> BufferResult<()> {
        let cap = recent.capacity();
        if block.frames() <= cap {
            recent.extend(block)
        } else {
            let skip = (block.frames() - cap) * block.channels();
            let tail =
                SampleBlock::from_interleaved(block.channels(), block.data()[skip..].to_vec())?;
            recent.extend(&tail)
        }
    }
}

#[async_trait]
impl DataSource for RandomSource {
    fn channel_count(&self) -> usize {
        self.channels
    }

    fn sampling_rate(&self) -> u32 {
        self.clock.rate()
    }

    async fn start(&self) -> StreamResult<()> {
        self.inner.lock().recent.clear();
        self.clock.start();
        Ok(())
    }

    async fn stop(&self) -> StreamResult<()> {
        self.clock.stop();
        Ok(())
    }

    async fn get_data(&self, n_samples: Option<usize>) -> StreamResult<SampleBlock> {
        let mut inner = self.inner.lock();
        let n = match n_samples {
            Some(n) => n,
            None => inner.cursor.take(),
        };
        let block = self.generate(n);
        Self::retain(&mut inner.recent, &block)?;
        Ok(block)
    }

    async fn get_current_data(&self, n_samples: Option<usize>) -> StreamResult<SampleBlock> {
        let inner = self.inner.lock();
        let n = n_samples.unwrap_or_else(|| inner.recent.len());
        Ok(inner.recent.latest_up_to(n))
    }
}

#[derive(Debug)]
struct PlaybackInner {
    cursor: Checkpoint,
    /// Next frame of the recording to play.
    position: usize,
}

/// Source replaying a recorded block in a loop at a nominal rate.
///
/// Playback wraps at the end of the recording, so it never runs dry; the
/// recording itself is fixed at construction (file codecs live outside
/// this crate).
#[derive(Debug)]
pub struct PlaybackSource {
    recording: SampleBlock,
    clock: SamplingClock,
    inner: Mutex<PlaybackInner>,
}

impl PlaybackSource {
    /// Loop `recording` at `rate` samples per second.
    ///
    /// An empty recording cannot produce anything and is rejected with
    /// [`StreamError::SourceUnavailable`].
    pub fn new(recording: SampleBlock, rate: u32) -> StreamResult<Self> {
        if recording.is_empty() {
            return Err(StreamError::SourceUnavailable(
                "playback recording is empty".into(),
            ));
        }
        let clock = SamplingClock::with_max_batch(rate, (rate.max(1) as usize) * RETAIN_SECS);
        let cursor = clock.checkpoint();
        Ok(Self {
            recording,
            clock,
            inner: Mutex::new(PlaybackInner {
                cursor,
                position: 0,
            }),
        })
    }

    /// Frames in one loop of the recording.
    pub fn recording_frames(&self) -> usize {
        self.recording.frames()
    }

    /// Copy `n` frames ending at `end` (exclusive), wrapping backward.
    fn window_ending_at(&self, end: usize, n: usize) -> SampleBlock {
        let total = self.recording.frames();
        let n = n.min(total);
        self.window_starting_at((end + total - n) % total, n)
    }

    /// Copy `n` frames starting at `start`, wrapping forward.
    fn window_starting_at(&self, start: usize, n: usize) -> SampleBlock {
        let channels = self.recording.channels();
        let total = self.recording.frames();
        let mut data = Vec::with_capacity(n * channels);
        for i in 0..n {
            let frame = (start + i) % total;
            data.extend_from_slice(
                &self.recording.data()[frame * channels..(frame + 1) * channels],
            );
        }
        SampleBlock::from_parts(channels, data)
    }
}

#[async_trait]
impl DataSource for PlaybackSource {
    fn channel_count(&self) -> usize {
        self.recording.channels()
    }

    fn sampling_rate(&self) -> u32 {
        self.clock.rate()
    }

    async fn start(&self) -> StreamResult<()> {
        self.inner.lock().position = 0;
        self.clock.start();
        Ok(())
    }

    async fn stop(&self) -> StreamResult<()> {
        self.clock.stop();
        Ok(())
    }

    async fn get_data(&self, n_samples: Option<usize>) -> StreamResult<SampleBlock> {
        let mut inner = self.inner.lock();
        let n = match n_samples {
            Some(n) => n,
            None => inner.cursor.take(),
        };
        let block = self.window_starting_at(inner.position, n);
        inner.position = (inner.position + n) % self.recording.frames();
        Ok(block)
    }

    async fn get_current_data(&self, n_samples: Option<usize>) -> StreamResult<SampleBlock> {
        let inner = self.inner.lock();
        let n = n_samples.unwrap_or_else(|| self.recording.frames());
        Ok(self.window_ending_at(inner.position, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, Duration};

    #[tokio::test(start_paused = true)]
    async fn random_source_paces_pulls_by_elapsed_time() {
        let source = RandomSource::new(4, 1000);
        source.start().await.unwrap();

        advance(Duration::from_millis(100)).await;
        let block = source.get_data(None).await.unwrap();
        assert_eq!(block.frames(), 100);
        assert_eq!(block.channels(), 4);

        // Nothing new accumulated since the pull.
        let empty = source.get_data(None).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn random_source_values_respect_amplitude() {
        let source = RandomSource::with_amplitude(1, 100, 2.0, 1.0);
        source.start().await.unwrap();
        advance(Duration::from_secs(1)).await;
        let block = source.get_data(None).await.unwrap();
        assert_eq!(block.frames(), 100);
        assert!(block.data().iter().all(|&v| (1.0..3.0).contains(&v)));
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_count_bypasses_pacing() {
        let source = RandomSource::new(2, 1000);
        source.start().await.unwrap();
        let block = source.get_data(Some(7)).await.unwrap();
        assert_eq!(block.frames(), 7);

        // The paced cursor was not consumed by the explicit pull.
        advance(Duration::from_millis(50)).await;
        assert_eq!(source.get_data(None).await.unwrap().frames(), 50);
    }

    #[tokio::test(start_paused = true)]
    async fn current_data_peeks_without_consuming() {
        let source = RandomSource::new(1, 1000);
        source.start().await.unwrap();
        advance(Duration::from_millis(30)).await;
        source.get_data(None).await.unwrap();

        let first = source.get_current_data(Some(10)).await.unwrap();
        let second = source.get_current_data(Some(10)).await.unwrap();
        assert_eq!(first.frames(), 10);
        assert_eq!(first, second);
        assert_eq!(source.get_current_data(None).await.unwrap().frames(), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_source_yields_empty_blocks() {
        let source = RandomSource::new(1, 1000);
        assert!(source.get_data(None).await.unwrap().is_empty());

        source.start().await.unwrap();
        advance(Duration::from_secs(1)).await;
        source.stop().await.unwrap();
        source.get_data(None).await.unwrap(); // drain up to the stop instant
        advance(Duration::from_secs(1)).await;
        assert!(source.get_data(None).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn playback_loops_over_the_recording() {
        let recording = SampleBlock::from_interleaved(1, vec![1.0, 2.0, 3.0]).unwrap();
        let source = PlaybackSource::new(recording, 10).unwrap();
        source.start().await.unwrap();

        advance(Duration::from_millis(500)).await;
        let block = source.get_data(None).await.unwrap();
        assert_eq!(block.data(), &[1.0, 2.0, 3.0, 1.0, 2.0]);

        advance(Duration::from_millis(100)).await;
        let next = source.get_data(None).await.unwrap();
        assert_eq!(next.data(), &[3.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn playback_current_data_ends_at_the_play_head() {
        let recording = SampleBlock::from_interleaved(1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let source = PlaybackSource::new(recording, 10).unwrap();
        source.start().await.unwrap();

        advance(Duration::from_millis(600)).await; // plays frames 0,1,2,3,0,1
        source.get_data(None).await.unwrap();
        let recent = source.get_current_data(Some(3)).await.unwrap();
        assert_eq!(recent.data(), &[4.0, 1.0, 2.0]);
    }

    #[test]
    fn playback_rejects_an_empty_recording() {
        let empty = SampleBlock::zeros(2, 0);
        let err = PlaybackSource::new(empty, 10).unwrap_err();
        assert!(matches!(err, StreamError::SourceUnavailable(_)));
    }
}
