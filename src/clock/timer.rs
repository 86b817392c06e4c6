//! Start/stop wall-clock timer.

use tokio::time::{Duration, Instant};

/// Monotonic start/stop timer.
///
/// Elapsed time is measured from the last `start()` to now while running,
/// or to the `stop()` instant once stopped. A timer that was never
/// started reports zero. Restarting begins a fresh interval.
///
/// Built on [`tokio::time::Instant`], so tests under a paused runtime can
/// advance time deterministically.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    started: Option<Instant>,
    stopped: Option<Instant>,
}

impl Timer {
    /// A timer that has never been started.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin (or restart) the measured interval at the current instant.
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
        self.stopped = None;
    }

    /// Freeze the measured interval at the current instant.
    ///
    /// No-op if the timer is not running, so the recorded interval
    /// survives repeated calls.
    pub fn stop(&mut self) {
        if self.is_running() {
            self.stopped = Some(Instant::now());
        }
    }

    /// Forget any recorded interval.
    pub fn reset(&mut self) {
        self.started = None;
        self.stopped = None;
    }

    /// True between `start()` and `stop()`.
    pub fn is_running(&self) -> bool {
        self.started.is_some() && self.stopped.is_none()
    }

    /// Instant the current interval began, if any.
    pub fn started_at(&self) -> Option<Instant> {
        self.started
    }

    /// The instant elapsed time is measured to: now while running, the
    /// stop instant once stopped, nothing if never started.
    pub(crate) fn reference_instant(&self) -> Option<Instant> {
        self.started?;
        Some(match self.stopped {
            Some(stopped) => stopped,
            None => Instant::now(),
        })
    }

    /// Time covered by the measured interval so far.
    pub fn elapsed(&self) -> Duration {
        match (self.started, self.reference_instant()) {
            (Some(started), Some(reference)) => reference.saturating_duration_since(started),
            _ => Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[test]
    fn never_started_reports_zero() {
        let timer = Timer::new();
        assert_eq!(timer.elapsed(), Duration::ZERO);
        assert!(!timer.is_running());
        assert!(timer.started_at().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_tracks_while_running() {
        let mut timer = Timer::new();
        timer.start();
        assert!(timer.is_running());
        advance(Duration::from_millis(750)).await;
        assert_eq!(timer.elapsed(), Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_freezes_the_interval() {
        let mut timer = Timer::new();
        timer.start();
        advance(Duration::from_millis(500)).await;
        timer.stop();
        advance(Duration::from_secs(3)).await;
        assert_eq!(timer.elapsed(), Duration::from_millis(500));
        assert!(!timer.is_running());

        // A second stop does not move the recorded interval.
        timer.stop();
        assert_eq!(timer.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_begins_a_fresh_interval() {
        let mut timer = Timer::new();
        timer.start();
        advance(Duration::from_secs(2)).await;
        timer.stop();

        timer.start();
        advance(Duration::from_millis(100)).await;
        assert_eq!(timer.elapsed(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_clears_everything() {
        let mut timer = Timer::new();
        timer.start();
        advance(Duration::from_secs(1)).await;
        timer.reset();
        assert_eq!(timer.elapsed(), Duration::ZERO);
        assert!(!timer.is_running());
    }
}
