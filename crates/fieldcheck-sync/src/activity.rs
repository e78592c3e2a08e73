//! Last-local-mutation timestamp
//!
//! Read through `tokio::time::Instant` so paused-time tests control it.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Tracks when the auditor last changed the draft
#[derive(Debug)]
pub struct ActivityTracker {
    last: Mutex<Instant>,
}

impl ActivityTracker {
    /// Tracker that counts "now" as the last activity
    #[must_use]
    pub fn new() -> Self {
        Self {
            last: Mutex::new(Instant::now()),
        }
    }

    /// Record a local mutation
    #[inline]
    pub fn touch(&self) {
        *self.last.lock() = Instant::now();
    }

    /// Instant of the last local mutation
    #[inline]
    #[must_use]
    pub fn last_activity(&self) -> Instant {
        *self.last.lock()
    }

    /// Time since the last local mutation
    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.last_activity().elapsed()
    }

    /// True once `timeout` has passed without a mutation
    #[inline]
    #[must_use]
    pub fn is_idle(&self, timeout: Duration) -> bool {
        self.elapsed() >= timeout
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn idle_after_timeout() {
        let tracker = ActivityTracker::new();
        let timeout = Duration::from_millis(5000);
        assert!(!tracker.is_idle(timeout));

        tokio::time::advance(Duration::from_millis(4999)).await;
        assert!(!tracker.is_idle(timeout));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(tracker.is_idle(timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn touch_resets_elapsed() {
        let tracker = ActivityTracker::new();
        tokio::time::advance(Duration::from_secs(10)).await;
        tracker.touch();
        assert_eq!(tracker.elapsed(), Duration::ZERO);
    }
}
