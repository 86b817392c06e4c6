//! Re-arming interval scheduler with cooperative cancellation.

use std::future::Future;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

/// Periodic driver for an async callback, bounded by an optional session.
///
/// The schedule is an explicit loop owned by one spawned task, not a
/// callback that re-arms itself: each iteration waits `interval`, invokes
/// the callback, and only then arms the next wait. A slow callback
/// therefore delays subsequent fires instead of stacking them, and two
/// invocations never overlap.
///
/// Cancellation is a watch signal checked at every suspension point, so
/// `cancel()` takes effect with bounded latency even mid-interval. With a
/// `session_length`, the loop ends once the deadline has passed at
/// re-arm time; the fire already in flight completes.
pub struct PeriodicTask {
    interval: Duration,
    cancel_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Arm the first fire at `now + interval` and keep re-arming.
    ///
    /// `session_length`, when set, bounds the schedule from the moment of
    /// spawning.
    pub fn spawn<F, Fut>(interval: Duration, session_length: Option<Duration>, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let deadline = session_length.map(|session| Instant::now() + session);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel_rx.changed() => {
                        debug!("periodic task cancelled while armed");
                        break;
                    }
                    _ = sleep(interval) => {}
                }
                tick().await;
                if let Some(deadline) = deadline {
                    if Instant::now() >= deadline {
                        debug!("periodic task session elapsed");
                        break;
                    }
                }
            }
        });

        Self {
            interval,
            cancel_tx,
            handle: Some(handle),
        }
    }

    /// Interval between the end of one fire and the start of the next.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Prevent any further fires. Safe from any context, idempotent, and
    /// effective even while a fire is in flight.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// Cancel and wait for the loop to exit.
    ///
    /// No callback invocation is in flight once this returns.
    pub async fn stop(&mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    /// True once the loop has exited, by cancellation or session expiry.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}
