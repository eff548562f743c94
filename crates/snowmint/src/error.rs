use core::fmt;

/// A result type defaulting to [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// The identifier field a configuration error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdField {
    /// The 5-bit worker identifier.
    WorkerId,
    /// The 5-bit datacenter identifier.
    DatacenterId,
}

impl fmt::Display for IdField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WorkerId => f.write_str("worker id"),
            Self::DatacenterId => f.write_str("datacenter id"),
        }
    }
}

/// All error variants that `snowmint` can emit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A worker or datacenter identifier was outside `0..=max`.
    ///
    /// Only returned at construction. No generator is created.
    #[error("{field} can't be greater than {max} or less than 0 (got {value})")]
    InvalidConfiguration {
        /// Which identifier was rejected.
        field: IdField,
        /// The rejected value.
        value: i64,
        /// The largest accepted value.
        max: u8,
    },

    /// The clock returned a time earlier than the last issued timestamp.
    ///
    /// Nothing was generated and the generator state is untouched. Calls
    /// succeed again once the clock passes `last_timestamp`.
    #[error(
        "clock moved backwards. Rejecting requests until {last_timestamp}. \
         Refusing to generate id for {behind_by} milliseconds"
    )]
    ClockMovedBackward {
        /// The last timestamp an ID was issued for, in milliseconds since the
        /// epoch.
        last_timestamp: u64,
        /// How far behind `last_timestamp` the clock read was.
        behind_by: u64,
    },

    /// The elapsed time since the epoch no longer fits the 41-bit timestamp
    /// field.
    #[error("timestamp {timestamp} exceeds the maximum encodable value {max}")]
    TimestampOverflow {
        /// The rejected clock reading, in milliseconds since the epoch.
        timestamp: u64,
        /// The largest encodable timestamp.
        max: u64,
    },

    /// A clock epoch lies after the current system time.
    ///
    /// Such a clock would report zero until the epoch arrives, so a generator
    /// on it would stall once the first tick is exhausted.
    #[error("epoch {epoch_millis} is later than the current time {now_millis}")]
    EpochInFuture {
        /// The rejected epoch, in milliseconds since the Unix epoch.
        epoch_millis: u64,
        /// The system time it was checked against, in milliseconds since the
        /// Unix epoch.
        now_millis: u64,
    },

    /// The operation failed because the lock was **poisoned**.
    ///
    /// This occurs when a thread panics while holding the lock. When the
    /// `parking-lot` feature is enabled, mutexes do **not** poison, so this
    /// variant is not available.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("generator lock poisoned")]
    LockPoisoned,
}

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
