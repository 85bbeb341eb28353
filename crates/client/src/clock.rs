//! Time sources injectable for deterministic testing.
//!
//! The connection actor never calls `Instant::now`/`SystemTime::now`
//! directly; it goes through a [`Clock`] so tests can advance time
//! explicitly instead of racing a real timer.

use std::time::{Duration, Instant, SystemTime};

/// A source of the current time.
///
/// Two clocks are exposed because TTL conversion needs both: a monotonic
/// [`Instant`] for "seconds from now" arithmetic, and wall-clock
/// [`SystemTime`] for the absolute-Unix-timestamp fallback used once a TTL
/// exceeds 30 days (§6's `T<n>` grammar). Implementations must advance both
/// in lockstep.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current instant.
    fn now(&self) -> Instant;

    /// Returns the current wall-clock time.
    fn unix_now(&self) -> SystemTime;
}

/// The real system clock, backed by [`Instant::now`]/[`SystemTime::now`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn unix_now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock that only advances when told to, for deterministic tests of
/// timeout and TTL-conversion behavior.
#[derive(Debug)]
pub struct ManualClock {
    instant_epoch: Instant,
    system_epoch: SystemTime,
    elapsed: std::sync::Mutex<Duration>,
}

impl ManualClock {
    /// Creates a manual clock starting at the current real instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            instant_epoch: Instant::now(),
            system_epoch: SystemTime::now(),
            elapsed: std::sync::Mutex::new(Duration::ZERO),
        }
    }

    /// Advances the clock by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut elapsed = self.elapsed.lock().expect("clock mutex poisoned");
        *elapsed += duration;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let elapsed = *self.elapsed.lock().expect("clock mutex poisoned");
        self.instant_epoch + elapsed
    }

    fn unix_now(&self) -> SystemTime {
        let elapsed = *self.elapsed.lock().expect("clock mutex poisoned");
        self.system_epoch + elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_starts_unmoved() {
        let clock = ManualClock::new();
        let first = clock.now();
        let second = clock.now();
        assert_eq!(first, second);
    }

    #[test]
    fn manual_clock_advances_by_requested_duration() {
        let clock = ManualClock::new();
        let before = clock.now();
        clock.advance(Duration::from_secs(30));
        let after = clock.now();
        assert_eq!(after - before, Duration::from_secs(30));
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let before = clock.now();
        std::thread::sleep(Duration::from_millis(1));
        let after = clock.now();
        assert!(after >= before);
    }

    #[test]
    fn manual_clock_advances_instant_and_system_time_together() {
        let clock = ManualClock::new();
        let before_wall = clock.unix_now();
        clock.advance(Duration::from_secs(10));
        let after_wall = clock.unix_now();
        assert_eq!(
            after_wall.duration_since(before_wall).unwrap(),
            Duration::from_secs(10)
        );
    }
}
