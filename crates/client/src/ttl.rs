//! User-facing time-to-live, and its conversion to/from the wire's `T<n>`
//! flag and echoed `t<n>` remaining-seconds flag.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::clock::Clock;

/// The longest TTL, in seconds, the server accepts as a relative offset.
/// Beyond this the value must be sent as an absolute Unix timestamp.
pub const MAX_RELATIVE_TTL_SECS: u64 = 60 * 60 * 24 * 30;

/// A requested expiration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeToLive {
    /// Never expires. Serializes to `T0`.
    Indefinitely,
    /// Expires at the given monotonic instant.
    ExpiresAt(Instant),
}

impl TimeToLive {
    /// Converts to the wire's `T<n>` payload: `0` for [`Self::Indefinitely`],
    /// otherwise either the number of seconds until expiry (if within
    /// [`MAX_RELATIVE_TTL_SECS`]) or an absolute Unix timestamp.
    #[must_use]
    pub fn to_wire_value(self, clock: &dyn Clock) -> u64 {
        match self {
            Self::Indefinitely => 0,
            Self::ExpiresAt(instant) => {
                let seconds = instant.saturating_duration_since(clock.now()).as_secs();
                if seconds <= MAX_RELATIVE_TTL_SECS {
                    seconds
                } else {
                    let wall_now = clock
                        .unix_now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap_or(Duration::ZERO);
                    (wall_now + Duration::from_secs(seconds)).as_secs()
                }
            }
        }
    }

    /// Reconstructs a [`TimeToLive`] from the server's echoed `t<n>` value:
    /// `None` or `-1` means indefinite, anything else is seconds remaining.
    #[must_use]
    pub fn from_ttl_remaining(ttl_remaining: Option<i64>, clock: &dyn Clock) -> Self {
        match ttl_remaining {
            None | Some(-1) => Self::Indefinitely,
            Some(seconds) => {
                let seconds = seconds.max(0) as u64;
                Self::ExpiresAt(clock.now() + Duration::from_secs(seconds))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn indefinitely_serializes_to_zero() {
        let clock = ManualClock::new();
        assert_eq!(TimeToLive::Indefinitely.to_wire_value(&clock), 0);
    }

    #[test]
    fn near_expiry_serializes_as_relative_seconds() {
        let clock = ManualClock::new();
        let ttl = TimeToLive::ExpiresAt(clock.now() + Duration::from_secs(90));
        let value = ttl.to_wire_value(&clock);
        assert!(value <= 90);
        assert!(value >= 85);
    }

    #[test]
    fn far_expiry_serializes_as_absolute_unix_timestamp() {
        let clock = ManualClock::new();
        let far_future = Duration::from_secs(MAX_RELATIVE_TTL_SECS + 1);
        let ttl = TimeToLive::ExpiresAt(clock.now() + far_future);
        let value = ttl.to_wire_value(&clock);
        assert!(value > MAX_RELATIVE_TTL_SECS);

        let expected_wall = clock
            .unix_now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
            + far_future.as_secs();
        assert_eq!(value, expected_wall);
    }

    #[test]
    fn from_ttl_remaining_none_is_indefinite() {
        let clock = ManualClock::new();
        assert_eq!(
            TimeToLive::from_ttl_remaining(None, &clock),
            TimeToLive::Indefinitely
        );
    }

    #[test]
    fn from_ttl_remaining_negative_one_is_indefinite() {
        let clock = ManualClock::new();
        assert_eq!(
            TimeToLive::from_ttl_remaining(Some(-1), &clock),
            TimeToLive::Indefinitely
        );
    }

    #[test]
    fn from_ttl_remaining_positive_is_expires_at() {
        let clock = ManualClock::new();
        let ttl = TimeToLive::from_ttl_remaining(Some(3600), &clock);
        assert_eq!(
            ttl,
            TimeToLive::ExpiresAt(clock.now() + Duration::from_secs(3600))
        );
    }
}
