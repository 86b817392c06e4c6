//! End-to-end capture pipeline tests.
//!
//! Source → capture session → checkpointed readers, and the full chain
//! with a forwarding worker pulling the captured stream into a sink.
//! Everything runs under a paused tokio clock; pump and worker
//! intervals are deliberately coprime so no two schedules ever share a
//! deadline and every count below is exact.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::{sleep, Duration};

use daq_stream::buffer::SampleBlock;
use daq_stream::capture::CaptureSession;
use daq_stream::config::{BufferMode, StreamConfig};
use daq_stream::error::StreamResult;
use daq_stream::sink::Sink;
use daq_stream::source::{PlaybackSource, RandomSource};
use daq_stream::worker::StreamWorker;

fn pipeline_config(mode: BufferMode, capacity: usize) -> StreamConfig {
    StreamConfig {
        interval: Duration::from_millis(100),
        capacity,
        buffer_mode: mode,
        ..StreamConfig::default()
    }
}

/// Sink recording send sizes.
#[derive(Default)]
struct CountingSink {
    sizes: Mutex<Vec<usize>>,
}

impl CountingSink {
    fn sends(&self) -> usize {
        self.sizes.lock().len()
    }

    fn total_bytes(&self) -> usize {
        self.sizes.lock().iter().sum()
    }
}

#[async_trait]
impl Sink for CountingSink {
    async fn send(&self, payload: &[u8]) -> StreamResult<()> {
        self.sizes.lock().push(payload.len());
        Ok(())
    }

    fn address(&self) -> &str {
        "test://count"
    }
}

#[tokio::test(start_paused = true)]
async fn test_pipeline_forwards_captured_frames() {
    let source = Arc::new(RandomSource::new(2, 1000));
    let mut session =
        CaptureSession::new(source, &pipeline_config(BufferMode::Overwrite, 4096));

    let sink = Arc::new(CountingSink::default());
    let mut worker = StreamWorker::new(
        Arc::new(session.reader_source()),
        Arc::clone(&sink) as Arc<dyn Sink>,
        Duration::from_millis(130),
    );

    session.start().await.unwrap();
    worker.start().await.unwrap();

    // Pump at 100 ms multiples, worker at 130 ms multiples. The pull at
    // t=0 finds nothing; t=130 forwards the 100 frames pumped so far;
    // each later pull forwards its 130 nominal frames.
    sleep(Duration::from_millis(1010)).await;
    worker.stop().await.unwrap();
    session.stop().await.unwrap();

    assert_eq!(session.buffered_frames(), 1000);
    assert_eq!(sink.sends(), 7);
    // 100 + 6 * 130 frames, 2 channels, 8 bytes each.
    assert_eq!(sink.total_bytes(), 880 * 2 * 8);
}

#[tokio::test(start_paused = true)]
async fn test_playback_content_survives_the_capture_window() {
    let recording =
        SampleBlock::from_interleaved(1, (1..=10).map(f64::from).collect()).unwrap();
    let source = Arc::new(PlaybackSource::new(recording, 1000).unwrap());
    let mut session =
        CaptureSession::new(source, &pipeline_config(BufferMode::Overwrite, 250));

    session.start().await.unwrap();
    let mut reader = session.reader();

    // 1000 frames of the 1..=10 cycle go in; the window keeps the
    // newest 250, ending exactly on a cycle boundary.
    sleep(Duration::from_millis(1010)).await;
    session.stop().await.unwrap();

    assert_eq!(reader.pending(), 1010);
    let block = reader.since_last();
    assert_eq!(block.frames(), 250);
    assert_eq!(block.data()[0], 1.0);
    assert_eq!(block.data()[249], 10.0);

    assert_eq!(reader.latest(5).data(), &[6.0, 7.0, 8.0, 9.0, 10.0]);
}

#[tokio::test(start_paused = true)]
async fn test_checkpointed_readers_pace_independently() {
    let source = Arc::new(RandomSource::new(1, 1000));
    let mut session =
        CaptureSession::new(source, &pipeline_config(BufferMode::Overwrite, 4096));

    session.start().await.unwrap();
    let mut fast = session.reader();
    let mut slow = session.reader();

    let mut fast_reads = Vec::new();
    for _ in 0..3 {
        sleep(Duration::from_millis(310)).await;
        fast_reads.push(fast.since_last().frames());
    }
    sleep(Duration::from_millis(80)).await;
    let slow_read = slow.since_last().frames();

    session.stop().await.unwrap();

    // First fast read is clamped to the 300 frames pumped by t=310; the
    // rest match the nominal 310 produced between reads. The slow reader
    // sees the whole kept stream at once.
    assert_eq!(fast_reads, vec![300, 310, 310]);
    assert_eq!(slow_read, 1000);
}

#[tokio::test(start_paused = true)]
async fn test_append_capture_keeps_the_earliest_frames() {
    let source = Arc::new(RandomSource::new(1, 1000));
    let mut session =
        CaptureSession::new(source, &pipeline_config(BufferMode::Append, 250));

    session.start().await.unwrap();
    // 100-frame blocks: the third no longer fits under the 250-frame cap
    // and every block after it is dropped whole.
    sleep(Duration::from_millis(1010)).await;
    session.stop().await.unwrap();

    assert_eq!(session.buffered_frames(), 200);
    let reader = session.reader();
    assert_eq!(reader.latest(1000).frames(), 200);
}
