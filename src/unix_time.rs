//! Conversion between the NTP timestamp format and absolute Unix time.
//!
//! The conversions are pure functions with no shared state. Truncation direction matters for
//! interoperability: seconds truncate toward zero and the fraction is an implicit floor in both
//! directions, so a round trip recovers the input to within one nanosecond.

use crate::protocol;
use std::time;

/// The number of seconds from 1st January 1900 UTC to the start of the Unix epoch.
pub const EPOCH_DELTA: i64 = 2_208_988_800;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Describes an instant relative to the `UNIX_EPOCH` - 00:00:00 Coordinated Universal Time (UTC),
/// Thursday, 1 January 1970 in seconds with the fractional part in nanoseconds.
///
/// If the **Instant** describes some moment prior to `UNIX_EPOCH`, both the `secs` and
/// `subsec_nanos` components will be negative, so ordering by `(secs, subsec_nanos)` is correct
/// on both sides of the epoch.
///
/// The sole purpose of this type is retrieving the "current" time using the `std::time` module
/// and converting to and from the NTP timestamp format. If you are interested in converting unix
/// time to some more human readable format, perhaps see the [chrono
/// crate](https://crates.io/crates/chrono).
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Instant {
    secs: i64,
    subsec_nanos: i32,
}

impl Instant {
    /// The Unix epoch itself: zero seconds, zero nanoseconds.
    pub const UNIX_EPOCH: Instant = Instant {
        secs: 0,
        subsec_nanos: 0,
    };

    /// Create a new **Instant** given its `secs` and `subsec_nanos` components.
    ///
    /// To indicate a time following `UNIX_EPOCH`, both `secs` and `subsec_nanos` must be positive.
    /// To indicate a time prior to `UNIX_EPOCH`, both `secs` and `subsec_nanos` must be negative.
    /// Violating these invariants will result in a **panic!**.
    pub fn new(secs: i64, subsec_nanos: i32) -> Instant {
        if secs > 0 && subsec_nanos < 0 {
            panic!("invalid instant: secs was positive but subsec_nanos was negative");
        }
        if secs < 0 && subsec_nanos > 0 {
            panic!("invalid instant: secs was negative but subsec_nanos was positive");
        }
        Instant { secs, subsec_nanos }
    }

    /// Uses `std::time::SystemTime::now` and `std::time::UNIX_EPOCH` to determine the current
    /// **Instant**.
    pub fn now() -> Self {
        match time::SystemTime::now().duration_since(time::UNIX_EPOCH) {
            Ok(duration) => {
                let secs = duration.as_secs() as i64;
                let subsec_nanos = duration.subsec_nanos() as i32;
                Instant::new(secs, subsec_nanos)
            }
            Err(sys_time_err) => {
                let duration_pre_unix_epoch = sys_time_err.duration();
                let secs = -(duration_pre_unix_epoch.as_secs() as i64);
                let subsec_nanos = -(duration_pre_unix_epoch.subsec_nanos() as i32);
                Instant::new(secs, subsec_nanos)
            }
        }
    }

    /// The "seconds" component of the **Instant**.
    pub fn secs(&self) -> i64 {
        self.secs
    }

    /// The fractional component of the **Instant** in nanoseconds.
    pub fn subsec_nanos(&self) -> i32 {
        self.subsec_nanos
    }

    /// The signed wall-clock span from `earlier` to `self`.
    ///
    /// Negative when `self` precedes `earlier`. Spans are bounded by the NTP timestamp range
    /// (~136 years), well within `i64` nanoseconds.
    pub fn duration_since(&self, earlier: &Instant) -> chrono::Duration {
        let nanos = (self.secs - earlier.secs) * NANOS_PER_SEC
            + (self.subsec_nanos - earlier.subsec_nanos) as i64;
        chrono::Duration::nanoseconds(nanos)
    }
}

// Conversion implementations.

impl From<protocol::TimestampFormat> for Instant {
    /// Converts an NTP timestamp to a Unix [`Instant`].
    ///
    /// The elapsed time since the prime epoch is computed in integer arithmetic as
    /// `seconds * 1e9 + (fraction * 1e9 >> 32)` nanoseconds, then rebased onto the Unix epoch.
    /// The 32-bit seconds field is taken at face value within era 0 (1900-2036); the 2036
    /// rollover is out of scope.
    fn from(t: protocol::TimestampFormat) -> Self {
        let nsec =
            t.seconds as u64 * NANOS_PER_SEC as u64 + ((t.fraction as u64 * NANOS_PER_SEC as u64) >> 32);
        let total = nsec as i64 - EPOCH_DELTA * NANOS_PER_SEC;
        // Rust division truncates toward zero and the remainder takes the sign of the dividend,
        // so the two components always agree in sign.
        Instant::new(total / NANOS_PER_SEC, (total % NANOS_PER_SEC) as i32)
    }
}

impl From<Instant> for protocol::TimestampFormat {
    /// Converts a Unix [`Instant`] to an NTP timestamp.
    ///
    /// The seconds field truncates toward zero and the fraction is `nanos * 2^32 / 1e9`, also
    /// truncated, never rounded. Instants before 1900 or beyond the 2^32-second range wrap; no
    /// range validation is performed here.
    fn from(t: Instant) -> Self {
        let mut sec = t.secs() + EPOCH_DELTA;
        let mut nanos = t.subsec_nanos() as i64;
        if nanos < 0 {
            sec -= 1;
            nanos += NANOS_PER_SEC;
        }
        let fraction = ((nanos as u64) << 32) / NANOS_PER_SEC as u64;
        protocol::TimestampFormat {
            seconds: sec as u32,
            fraction: fraction as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector_2024_06_01() {
        // 2024-06-01 00:00:00 UTC: Unix=1717200000, NTP=3926188800
        let ts = protocol::TimestampFormat {
            seconds: 3_926_188_800,
            fraction: 0,
        };
        let instant = Instant::from(ts);
        assert_eq!(instant.secs(), 1_717_200_000);
        assert_eq!(instant.subsec_nanos(), 0);
    }

    #[test]
    fn known_vector_unix_epoch() {
        // 1970-01-01 00:00:00 UTC is exactly EPOCH_DELTA seconds into the NTP era.
        let ts = protocol::TimestampFormat {
            seconds: EPOCH_DELTA as u32,
            fraction: 0,
        };
        assert_eq!(Instant::from(ts), Instant::UNIX_EPOCH);
    }

    #[test]
    fn known_vector_prime_epoch() {
        // The all-zero timestamp is 1900-01-01, EPOCH_DELTA seconds before the Unix epoch.
        let instant = Instant::from(protocol::TimestampFormat::default());
        assert_eq!(instant.secs(), -EPOCH_DELTA);
        assert_eq!(instant.subsec_nanos(), 0);
        assert!(instant < Instant::UNIX_EPOCH);
    }

    #[test]
    fn half_second_fraction() {
        let ts: protocol::TimestampFormat = Instant::new(1_717_200_000, 500_000_000).into();
        assert_eq!(ts.seconds, 3_926_188_800);
        // 0.5s is exactly 2^31 fractional units.
        assert_eq!(ts.fraction, 1 << 31);
        let back = Instant::from(ts);
        assert_eq!(back.secs(), 1_717_200_000);
        assert_eq!(back.subsec_nanos(), 500_000_000);
    }

    #[test]
    fn round_trip_within_one_nanosecond() {
        let cases = [
            (0i64, 0i32),
            (1_717_200_000, 1),
            (1_717_200_000, 999_999_999),
            (2_000_000_000, 123_456_789),
            (1, 0),
        ];
        for (secs, nanos) in cases {
            let original = Instant::new(secs, nanos);
            let ts: protocol::TimestampFormat = original.into();
            let restored = Instant::from(ts);
            assert_eq!(restored.secs(), original.secs(), "secs for {secs}.{nanos}");
            let drift = (restored.subsec_nanos() - original.subsec_nanos()).abs();
            assert!(drift <= 1, "nanos drifted by {drift} for {secs}.{nanos}");
        }
    }

    #[test]
    fn fraction_truncates_toward_zero() {
        // One nanosecond is ~4.29 fractional units; truncation keeps the floor.
        let ts: protocol::TimestampFormat = Instant::new(0, 1).into();
        assert_eq!(ts.fraction, 4);
    }

    #[test]
    fn duration_since_is_signed() {
        let earlier = Instant::new(100, 0);
        let later = Instant::new(102, 500_000_000);
        assert_eq!(
            later.duration_since(&earlier),
            chrono::Duration::milliseconds(2500)
        );
        assert_eq!(
            earlier.duration_since(&later),
            chrono::Duration::milliseconds(-2500)
        );
    }
}
