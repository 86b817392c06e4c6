//! Background pull-and-forward loop between a source and a sink.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, trace, warn};

use crate::error::StreamResult;
use crate::sink::Sink;
use crate::source::DataSource;

/// Forwards blocks from one [`DataSource`] to one [`Sink`] at a fixed
/// interval.
///
/// The source and sink are injected at construction; the worker owns no
/// transport or acquisition behavior of its own. At most one background
/// loop exists per worker: `start()` on a running worker and `stop()` on
/// an idle one are logged no-ops. `stop()` signals the loop and waits for
/// it to exit, so no send is in flight once it returns.
///
/// Within the loop, pulls and sends are strictly sequential. Send and
/// pull failures are logged and the loop keeps going; delivery is best
/// effort with no retry queue.
pub struct StreamWorker {
    source: Arc<dyn DataSource>,
    sink: Arc<dyn Sink>,
    interval: Duration,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl StreamWorker {
    /// Worker pulling from `source` and forwarding to `sink` every
    /// `interval`.
    pub fn new(source: Arc<dyn DataSource>, sink: Arc<dyn Sink>, interval: Duration) -> Self {
        Self {
            source,
            sink,
            interval,
            shutdown_tx: None,
            handle: None,
        }
    }

    /// Interval between forwarding passes.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True while the background loop is alive.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Start the source and spawn the forwarding loop.
    ///
    /// Already running: logs a warning and returns `Ok`, leaving the
    /// existing loop untouched. A source that fails to open propagates
    /// as an error and the worker stays idle.
    pub async fn start(&mut self) -> StreamResult<()> {
        if self.handle.is_some() {
            warn!("stream worker already running; start ignored");
            return Ok(());
        }
        self.source.start().await?;

        let source = Arc::clone(&self.source);
        let sink = Arc::clone(&self.sink);
        let interval = self.interval;
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);

        self.handle = Some(tokio::spawn(async move {
            loop {
                match source.get_data(None).await {
                    Ok(block) if block.is_empty() => {
                        trace!("no new samples this pass");
                    }
                    Ok(block) => {
                        let payload = block.to_le_bytes();
                        if let Err(err) = sink.send(&payload).await {
                            warn!(
                                error = %err,
                                address = sink.address(),
                                frames = block.frames(),
                                "send failed; continuing"
                            );
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "source read failed; continuing");
                    }
                }
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        debug!("stream worker shutdown requested");
                        break;
                    }
                    _ = sleep(interval) => {}
                }
            }
        }));

        info!(
            interval_ms = self.interval.as_millis() as u64,
            address = self.sink.address(),
            "stream worker started"
        );
        Ok(())
    }

    /// Signal the loop, wait for it to exit, then stop the source.
    ///
    /// Not running: logs a warning and returns `Ok`.
    pub async fn stop(&mut self) -> StreamResult<()> {
        if self.handle.is_none() {
            warn!("stream worker not running; stop ignored");
            return Ok(());
        }
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        self.source.stop().await?;
        info!("stream worker stopped");
        Ok(())
    }
}
