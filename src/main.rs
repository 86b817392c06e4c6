//! CLI entry point for the streaming demo.
//!
//! Wires the built-in noise source through a buffered capture session
//! and forwards the captured frames to a UDP sink as little-endian
//! `f64` datagrams.
//!
//! # Usage
//!
//! Stream with the configured (or default) settings until Ctrl-C:
//! ```bash
//! daq-stream
//! ```
//!
//! Override the essentials from the command line:
//! ```bash
//! daq-stream --rate 44100 --channels 2 --addr 127.0.0.1:9000 --duration 10s
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Error, Result};
use clap::Parser;
use tracing::{debug, info};

use daq_stream::capture::CaptureSession;
use daq_stream::config::StreamConfig;
use daq_stream::sink::UdpSink;
use daq_stream::source::RandomSource;
use daq_stream::telemetry::{self, OutputFormat, TelemetryConfig};
use daq_stream::worker::{PeriodicTask, StreamWorker};

#[derive(Parser)]
#[command(name = "daq-stream")]
#[command(about = "Buffered sample streaming over UDP", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, default_value = "config/stream.toml")]
    config: PathBuf,

    /// Stop after this long (e.g. "10s"); default is to run until Ctrl-C
    #[arg(long, value_parser = humantime::parse_duration)]
    duration: Option<Duration>,

    /// Override the configured sample rate
    #[arg(long)]
    rate: Option<u32>,

    /// Override the configured channel count
    #[arg(long)]
    channels: Option<usize>,

    /// Override the configured sink address
    #[arg(long)]
    addr: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log format: pretty, compact, json
    #[arg(long, default_value = "pretty")]
    log_format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = telemetry::parse_level(&cli.log_level).map_err(Error::msg)?;
    let format: OutputFormat = cli.log_format.parse().map_err(Error::msg)?;
    telemetry::init(TelemetryConfig::new(level).with_format(format)).map_err(Error::msg)?;

    let mut config = StreamConfig::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(rate) = cli.rate {
        config.nominal_rate = rate;
    }
    if let Some(channels) = cli.channels {
        config.channels = channels;
    }
    if let Some(addr) = cli.addr {
        config.sink_addr = addr;
    }
    config.validate()?;

    run(config, cli.duration).await
}

async fn run(config: StreamConfig, duration: Option<Duration>) -> Result<()> {
    info!(
        rate = config.nominal_rate,
        channels = config.channels,
        sink = %config.sink_addr,
        mode = ?config.buffer_mode,
        interval = ?config.interval,
        "starting pipeline"
    );

    let source = Arc::new(RandomSource::new(config.channels, config.nominal_rate));
    let mut session = CaptureSession::new(source, &config);

    let sink = UdpSink::connect(&config.sink_addr)
        .await
        .with_context(|| format!("connecting sink to {}", config.sink_addr))?;
    let mut worker = StreamWorker::new(
        Arc::new(session.reader_source()),
        Arc::new(sink),
        config.interval,
    );

    session.start().await?;
    worker.start().await?;

    // Once-a-second stats, visible with --log-level debug.
    let clock = session.clock();
    let mut stats = PeriodicTask::spawn(Duration::from_secs(1), None, move || {
        let clock = clock.clone();
        async move {
            debug!(
                produced = clock.samples_since_start(),
                elapsed = ?clock.elapsed(),
                "pipeline stats"
            );
        }
    });

    match duration {
        Some(limit) => tokio::time::sleep(limit).await,
        None => tokio::signal::ctrl_c()
            .await
            .context("waiting for Ctrl-C")?,
    }

    info!("shutting down");
    stats.stop().await;
    worker.stop().await?;
    session.stop().await?;

    let captured = session.buffered_frames();
    info!(captured, "pipeline stopped");
    Ok(())
}
