use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{Error, Result};

/// Default epoch: Monday, January 1, 2018 00:00:00 UTC+8
/// (Sunday, December 31, 2017 16:00:00 UTC).
///
/// This is part of the ID format. Moving it changes the meaning of every ID
/// issued before, and moving it backward can reissue old IDs.
pub const EPOCH: Duration = Duration::from_millis(1_514_736_000_000);

/// A trait for time sources that return a millisecond timestamp.
///
/// This abstraction allows you to plug in the system clock or a mocked time
/// source in tests.
///
/// The unit is **milliseconds** relative to an origin chosen by the
/// implementation. Generators pack the returned value directly into the
/// timestamp field.
///
/// # Example
///
/// ```
/// use snowmint::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the configured epoch.
    fn current_millis(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

/// A wall-clock time source offset from a fixed epoch.
///
/// Every call reads `SystemTime::now()`, so adjustments to the system clock
/// (NTP steps, manual changes) are observed. Generators detect backward
/// motion and refuse to issue IDs until the clock catches up.
///
/// Readings earlier than the epoch saturate to zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemClock {
    epoch_millis: u64,
}

impl Default for SystemClock {
    /// Constructs a clock aligned to [`EPOCH`].
    fn default() -> Self {
        Self::with_epoch(EPOCH)
    }
}

impl SystemClock {
    /// Constructs a clock using `epoch` (a [`Duration`] since 1970-01-01 UTC)
    /// as the origin (t = 0).
    ///
    /// An epoch that has not been reached yet reads as 0 until it arrives, and
    /// a generator on such a clock stalls after one tick. Use
    /// [`Self::try_with_epoch`] for epochs that come from configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use snowmint::{SystemClock, TimeSource};
    /// use std::time::Duration;
    ///
    /// let unix = SystemClock::with_epoch(Duration::ZERO);
    /// let shifted = SystemClock::with_epoch(Duration::from_secs(1));
    /// assert!(unix.current_millis() >= shifted.current_millis() + 1000);
    /// ```
    #[must_use]
    pub const fn with_epoch(epoch: Duration) -> Self {
        Self {
            epoch_millis: duration_millis(epoch),
        }
    }

    /// Like [`Self::with_epoch`], but rejects an epoch later than the current
    /// system time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EpochInFuture`] if `epoch` has not been reached yet.
    ///
    /// # Example
    ///
    /// ```
    /// use snowmint::{EPOCH, SystemClock};
    /// use std::time::Duration;
    ///
    /// assert!(SystemClock::try_with_epoch(EPOCH).is_ok());
    /// assert!(SystemClock::try_with_epoch(Duration::from_millis(u64::MAX)).is_err());
    /// ```
    pub fn try_with_epoch(epoch: Duration) -> Result<Self> {
        let clock = Self::with_epoch(epoch);
        let now_millis = unix_millis();
        if now_millis < clock.epoch_millis {
            return Err(Error::EpochInFuture {
                epoch_millis: clock.epoch_millis,
                now_millis,
            });
        }
        Ok(clock)
    }

    /// Returns the epoch in milliseconds since the Unix epoch.
    #[must_use]
    pub const fn epoch(&self) -> Duration {
        Duration::from_millis(self.epoch_millis)
    }
}

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        unix_millis().saturating_sub(self.epoch_millis)
    }
}

/// Whole milliseconds in `duration`, clamped to `u64::MAX`.
pub(crate) const fn duration_millis(duration: Duration) -> u64 {
    let millis = duration.as_millis();
    if millis > u64::MAX as u128 {
        u64::MAX
    } else {
        millis as u64
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, duration_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_relative_to_epoch() {
        let clock = SystemClock::default();
        let unix_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let now = clock.current_millis();

        assert!(now > 0);
        assert!(now <= unix_millis - 1_514_736_000_000 + 1_000);
        assert!(now + 1_000 >= unix_millis - 1_514_736_000_000);
        assert_eq!(clock.epoch(), EPOCH);
    }

    #[test]
    fn system_clock_before_epoch_saturates() {
        let clock = SystemClock::with_epoch(Duration::from_millis(u64::MAX));
        assert_eq!(clock.current_millis(), 0);
    }

    #[test]
    fn oversized_epoch_clamps_instead_of_wrapping() {
        assert_eq!(duration_millis(Duration::MAX), u64::MAX);
        assert_eq!(SystemClock::with_epoch(Duration::MAX).current_millis(), 0);
        assert!(SystemClock::try_with_epoch(Duration::MAX).is_err());
    }

    #[test]
    fn future_epoch_is_rejected() {
        let epoch = Duration::from_millis(4_000_000_000_000);
        assert!(matches!(
            SystemClock::try_with_epoch(epoch),
            Err(Error::EpochInFuture {
                epoch_millis: 4_000_000_000_000,
                ..
            })
        ));
        assert_eq!(
            SystemClock::try_with_epoch(Duration::ZERO),
            Ok(SystemClock::with_epoch(Duration::ZERO))
        );
    }

    #[test]
    fn system_clock_advances() {
        let clock = SystemClock::default();
        let start = clock.current_millis();
        std::thread::sleep(Duration::from_millis(3));
        assert!(clock.current_millis() > start);
    }
}
