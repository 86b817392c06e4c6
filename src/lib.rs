//! # DAQ Stream Core Library
//!
//! Building blocks for buffered sample streaming: bounded time-series
//! stores, wall-clock sample pacing, and small async workers that move
//! blocks from an acquisition source to a sink. The crate is the shared
//! core for the `daq-stream` demo binary and for embedding the pipeline
//! in larger acquisition programs.
//!
//! ## Crate Structure
//!
//! - **`buffer`**: the sample stores. `GrowableBuffer` (contiguous,
//!   doubling growth, optional cap), `RingBuffer` (fixed window, oldest
//!   evicted), and `ChunkRingBuffer` (block queue bounded by chunk
//!   count), all over interleaved `f64` frames.
//! - **`clock`**: `Timer` plus `SamplingClock`, which converts elapsed
//!   wall-clock time into "samples produced" at a nominal rate, and
//!   per-consumer `Checkpoint` cursors over it.
//! - **`source`**: the `DataSource` capability trait and the built-in
//!   `RandomSource` / `PlaybackSource` implementations.
//! - **`sink`**: the `Sink` capability trait and the `UdpSink` datagram
//!   forwarder.
//! - **`worker`**: `PeriodicTask` (cancellable fixed-interval schedule)
//!   and `StreamWorker` (source-to-sink forwarding loop).
//! - **`capture`**: `CaptureSession`, the periodic ingestion pump that
//!   fills a shared buffer and hands out checkpointed readers.
//! - **`config`**: file + environment configuration for the pipeline.
//! - **`error`**: `BufferError` and `StreamError`.
//! - **`telemetry`**: `tracing` subscriber setup.

pub mod buffer;
pub mod capture;
pub mod clock;
pub mod config;
pub mod error;
pub mod sink;
pub mod source;
pub mod telemetry;
pub mod worker;
