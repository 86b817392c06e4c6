//! Strongly-typed pipeline configuration.
//!
//! Configuration merges two layers through Figment:
//! 1. A TOML file (`config/stream.toml` by default).
//! 2. Environment variables prefixed with `DAQ_STREAM_`
//!    (e.g. `DAQ_STREAM_NOMINAL_RATE=48000`).
//!
//! Durations accept humantime strings (`"100ms"`, `"2s 500ms"`). Every
//! field has a default, so an absent file is a valid configuration.

use std::path::Path;
use std::time::Duration;

use anyhow::bail;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Storage policy for the capture buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferMode {
    /// Accumulate until `capacity`; blocks that no longer fit are dropped.
    Append,
    /// Fixed window of the newest `capacity` frames, oldest evicted.
    #[default]
    Overwrite,
}

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Delay between ingestion (and forwarding) passes.
    #[serde(with = "humantime_serde", default = "default_interval")]
    pub interval: Duration,

    /// Capture buffer bound, in frames.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Nominal sample rate of the source, samples per second.
    #[serde(default = "default_nominal_rate")]
    pub nominal_rate: u32,

    /// Channels per frame.
    #[serde(default = "default_channels")]
    pub channels: usize,

    /// Stop ingesting after this long; unset means run until stopped.
    #[serde(default, with = "humantime_serde")]
    pub session_length: Option<Duration>,

    /// Capture buffer storage policy.
    #[serde(default)]
    pub buffer_mode: BufferMode,

    /// Forwarding target, `host:port`.
    #[serde(default = "default_sink_addr")]
    pub sink_addr: String,
}

fn default_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_capacity() -> usize {
    65536
}

fn default_nominal_rate() -> u32 {
    1000
}

fn default_channels() -> usize {
    16
}

fn default_sink_addr() -> String {
    "127.0.0.1:9000".to_owned()
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            capacity: default_capacity(),
            nominal_rate: default_nominal_rate(),
            channels: default_channels(),
            session_length: None,
            buffer_mode: BufferMode::default(),
            sink_addr: default_sink_addr(),
        }
    }
}

impl StreamConfig {
    /// Load from `config/stream.toml` plus `DAQ_STREAM_` env overrides.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from("config/stream.toml")
    }

    /// Load from a specific TOML file plus `DAQ_STREAM_` env overrides.
    ///
    /// A missing file contributes nothing; defaults fill the gaps.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("DAQ_STREAM_"))
            .extract()
    }

    /// Validate values that parse fine but cannot work.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.interval.is_zero() {
            bail!("interval must be greater than zero");
        }
        if self.capacity == 0 {
            bail!("capacity must be at least 1 frame");
        }
        if self.nominal_rate == 0 {
            bail!("nominal_rate must be at least 1 sample/s");
        }
        if self.channels == 0 {
            bail!("channels must be at least 1");
        }
        if let Some(session) = self.session_length {
            if session.is_zero() {
                bail!("session_length, when set, must be greater than zero");
            }
        }
        if self.sink_addr.parse::<std::net::SocketAddr>().is_err() {
            bail!("sink_addr '{}' is not a valid host:port address", self.sink_addr);
        }
        Ok(())
    }
}
