//! Criterion benchmarks for the sample-store hot paths.
//!
//! The ingestion pump and forwarding worker hit these paths once per
//! interval, with block sizes set by the nominal rate. The numbers to
//! watch:
//! - extend throughput (bytes/sec) per block size, append and overwrite
//! - snapshot read latency (`peek_up_to` / `latest_up_to`)
//! - chunk queue churn and ring rotation
//!
//! Run with: cargo bench --bench buffers

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use daq_stream::buffer::{ChunkRingBuffer, GrowableBuffer, RingBuffer, SampleBlock};

const CHANNELS: usize = 4;

fn block_of(frames: usize) -> SampleBlock {
    SampleBlock::zeros(CHANNELS, frames)
}

/// Extend throughput into a growing store, per block size.
fn growable_extend_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("growable_extend");

    for frames in [64, 256, 1024, 4096] {
        let block = block_of(frames);
        let mut buffer = GrowableBuffer::with_capacity(CHANNELS, 1 << 20);

        group.throughput(Throughput::Bytes((frames * CHANNELS * 8) as u64));
        group.bench_with_input(BenchmarkId::new("extend", frames), &frames, |b, _| {
            b.iter(|| {
                // Stay inside the preallocated region so the growth
                // path is not what gets measured.
                if buffer.len() + frames > 1 << 20 {
                    buffer.clear();
                }
                buffer.extend(black_box(&block)).unwrap();
            });
        });
    }

    group.finish();
}

/// Extend throughput into a fixed window, with every block wrapping.
fn ring_extend_and_wrap(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_extend");

    for frames in [64, 256, 1024, 4096] {
        let block = block_of(frames);
        // Capacity deliberately not a multiple of the block, so writes
        // keep crossing the physical end.
        let mut buffer = RingBuffer::new(CHANNELS, frames * 2 + frames / 2);

        group.throughput(Throughput::Bytes((frames * CHANNELS * 8) as u64));
        group.bench_with_input(BenchmarkId::new("extend", frames), &frames, |b, _| {
            b.iter(|| {
                buffer.extend(black_box(&block)).unwrap();
            });
        });
    }

    group.finish();
}

/// Snapshot read latency on pre-filled stores.
fn read_snapshots(c: &mut Criterion) {
    let mut ring = RingBuffer::new(CHANNELS, 8192);
    ring.extend(&block_of(8192)).unwrap();
    ring.extend(&block_of(4096)).unwrap(); // leave it wrapped

    let mut growable = GrowableBuffer::new(CHANNELS);
    growable.extend(&block_of(8192)).unwrap();

    c.bench_function("ring_peek_up_to_256", |b| {
        b.iter(|| {
            let snapshot = ring.peek_up_to(black_box(256));
            black_box(snapshot);
        });
    });

    c.bench_function("ring_latest_up_to_256", |b| {
        b.iter(|| {
            let snapshot = ring.latest_up_to(black_box(256));
            black_box(snapshot);
        });
    });

    c.bench_function("growable_peek_up_to_256", |b| {
        b.iter(|| {
            let snapshot = growable.peek_up_to(black_box(256));
            black_box(snapshot);
        });
    });
}

/// Steady-state chunk queue: one block in, one read out, with the
/// read landing inside a chunk so the split path is exercised.
fn chunk_ring_churn(c: &mut Criterion) {
    let mut buffer = ChunkRingBuffer::new(CHANNELS, 64);
    let block = block_of(256);

    c.bench_function("chunk_push_read_cycle", |b| {
        b.iter(|| {
            buffer.push(black_box(block.clone())).unwrap();
            let out = buffer.read_up_to(200);
            black_box(out);
        });
    });
}

/// Rotation of a full window (the constant-time origin shift).
fn ring_roll(c: &mut Criterion) {
    let mut buffer = RingBuffer::new(CHANNELS, 8192);
    buffer.extend(&block_of(8192)).unwrap();

    c.bench_function("ring_roll_full", |b| {
        b.iter(|| {
            buffer.roll(black_box(7));
        });
    });
}

criterion_group!(
    benches,
    growable_extend_throughput,
    ring_extend_and_wrap,
    read_snapshots,
    chunk_ring_churn,
    ring_roll
);
criterion_main!(benches);
