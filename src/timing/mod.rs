//! Monotonic recording clock
//!
//! Elapsed recording time is always derived from the start instant rather
//! than counted, so it cannot drift from the real recording.

use tokio::time::{Duration, Instant};

/// Start instant of an active recording.
///
/// Built on `tokio::time::Instant` so paused-clock tests can step it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingClock {
    started_at: Instant,
}

impl RecordingClock {
    /// Start the clock now
    pub fn start() -> Self {
        Self {
            started_at: Instant::now(),
        }
    }

    pub fn from_instant(started_at: Instant) -> Self {
        Self { started_at }
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    /// Elapsed time at `now`; zero if `now` precedes the start.
    #[inline]
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    /// Whole seconds elapsed, for the recording counter
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed().as_secs()
    }

    /// Whether the recording has run for at least `dwell`.
    pub fn has_dwelled(&self, dwell: Duration) -> bool {
        self.elapsed() >= dwell
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_follows_clock() {
        let clock = RecordingClock::start();
        assert_eq!(clock.elapsed(), Duration::ZERO);

        tokio::time::advance(Duration::from_millis(2_500)).await;
        assert_eq!(clock.elapsed(), Duration::from_millis(2_500));
        assert_eq!(clock.elapsed_secs(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dwell_boundary_is_inclusive() {
        let clock = RecordingClock::start();
        let dwell = Duration::from_millis(1_000);

        tokio::time::advance(Duration::from_millis(999)).await;
        assert!(!clock.has_dwelled(dwell));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(clock.has_dwelled(dwell));
    }

    #[test]
    fn test_elapsed_at_before_start_is_zero() {
        let now = Instant::now();
        let clock = RecordingClock::from_instant(now + Duration::from_secs(1));
        assert_eq!(clock.elapsed_at(now), Duration::ZERO);
    }
}
