//! Clock abstraction for navigation backoff.
//!
//! Backoff waits go through [`Clock`] so that retry timing can be exercised
//! deterministically: [`FakeClock`] advances virtual time instead of blocking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Source of monotonic time and blocking waits
pub trait Clock {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Duration;

    /// Block for `duration`
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// Wall clock backed by [`Instant`] and [`std::thread::sleep`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Fake clock for deterministic testing
///
/// `sleep` fast-forwards virtual time and records the requested duration.
#[derive(Debug, Default)]
pub struct FakeClock {
    current_ms: AtomicU64,
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    /// Create a fake clock at time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shareable fake clock
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Current virtual time in milliseconds
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.current_ms.load(Ordering::SeqCst)
    }

    /// Advance virtual time without recording a sleep
    pub fn fast_forward(&self, duration: Duration) {
        let _ = self
            .current_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }

    /// Every sleep requested so far, in order
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sum of all requested sleeps
    #[must_use]
    pub fn total_slept(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.now_ms())
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
        self.fast_forward(duration);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_clock_starts_at_zero() {
        let clock = FakeClock::new();
        assert_eq!(clock.now(), Duration::ZERO);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_fake_sleep_advances_time() {
        let clock = FakeClock::new();
        clock.sleep(Duration::from_millis(500));
        clock.sleep(Duration::from_millis(1000));
        assert_eq!(clock.now_ms(), 1500);
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_millis(500), Duration::from_millis(1000)]
        );
        assert_eq!(clock.total_slept(), Duration::from_millis(1500));
    }

    #[test]
    fn test_fast_forward_is_not_a_sleep() {
        let clock = FakeClock::new();
        clock.fast_forward(Duration::from_secs(2));
        assert_eq!(clock.now(), Duration::from_secs(2));
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_shared_clock_through_arc() {
        let clock = FakeClock::shared();
        let handle = Arc::clone(&clock);
        handle.sleep(Duration::from_millis(20));
        assert_eq!(clock.now_ms(), 20);
    }

    #[test]
    fn test_system_clock_sleep_is_monotonic() {
        let clock = SystemClock::new();
        let before = clock.now();
        clock.sleep(Duration::from_millis(2));
        assert!(clock.now() >= before + Duration::from_millis(2));
    }
}
