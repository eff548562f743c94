use core::fmt;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::state::State;
use crate::{
    MachineId, Poll, Result, SnowflakeGenerator, SnowflakeId, SystemClock, TimeSource,
    generator::{Mutex, MutexGuard},
};

/// A lock-based Snowflake ID generator suitable for multi-threaded
/// environments.
///
/// The generator state lives in an `Arc<Mutex<_>>` that is held for the
/// whole of [`Self::next_id`], including the spin through an exhausted tick.
/// Clones share the same state, so handing a clone to each thread is
/// equivalent to sharing one generator by reference.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Clones are cheap handles onto one sequence
///
/// ## Recommended When
/// - You're in a multi-threaded environment
/// - Several threads must draw from one worker/datacenter pair
///
/// ## See Also
/// - [`BasicSnowflakeGenerator`]
///
/// [`BasicSnowflakeGenerator`]: crate::BasicSnowflakeGenerator
pub struct LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    pub(crate) state: Arc<crossbeam_utils::CachePadded<Mutex<State>>>,
    #[cfg(not(feature = "cache-padded"))]
    pub(crate) state: Arc<Mutex<State>>,
    pub(crate) machine: MachineId,
    pub(crate) time: T,
}

impl LockSnowflakeGenerator<SystemClock> {
    /// Creates a generator on the system clock at the default [`EPOCH`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfiguration`] if either identifier is
    /// outside `0..=31`.
    ///
    /// # Example
    /// ```
    /// use snowmint::LockSnowflakeGenerator;
    ///
    /// let generator = LockSnowflakeGenerator::try_default(1, 1).unwrap();
    /// let a = generator.next_id().unwrap();
    /// let b = generator.next_id().unwrap();
    /// assert!(b > a);
    /// ```
    ///
    /// [`EPOCH`]: crate::EPOCH
    pub fn try_default(worker_id: i64, datacenter_id: i64) -> Result<Self> {
        Self::new(worker_id, datacenter_id, SystemClock::default())
    }
}

impl<T> LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new [`LockSnowflakeGenerator`] for the given identifiers.
    ///
    /// The last timestamp starts unset and the sequence at zero; the first
    /// call to [`Self::next_id`] takes whatever `time` reports.
    ///
    /// # Parameters
    ///
    /// - `worker_id`: worker identifier, `0..=31`.
    /// - `datacenter_id`: datacenter identifier, `0..=31`.
    /// - `time`: A [`TimeSource`] implementation (e.g., [`SystemClock`]) that
    ///   determines how timestamps are generated.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfiguration`] if either identifier is
    /// outside `0..=31`.
    ///
    /// # Example
    /// ```
    /// use snowmint::{LockSnowflakeGenerator, SystemClock};
    ///
    /// let generator = LockSnowflakeGenerator::new(31, 31, SystemClock::default()).unwrap();
    /// assert_eq!(generator.worker_id(), 31);
    ///
    /// assert!(LockSnowflakeGenerator::new(32, 0, SystemClock::default()).is_err());
    /// ```
    pub fn new(worker_id: i64, datacenter_id: i64, time: T) -> Result<Self> {
        Ok(Self::from_machine_id(
            MachineId::new(worker_id, datacenter_id)?,
            time,
        ))
    }

    /// Creates a generator from already validated identifiers.
    pub fn from_machine_id(machine: MachineId, time: T) -> Self {
        Self {
            #[cfg(feature = "cache-padded")]
            state: Arc::new(crossbeam_utils::CachePadded::new(Mutex::new(State::new()))),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(Mutex::new(State::new())),
            machine,
            time,
        }
    }

    /// Generates the next ID.
    ///
    /// Returns a new, time-ordered, unique ID. If 4096 IDs were already
    /// issued in the current millisecond, this spins (holding the lock) until
    /// the clock reaches the next one.
    ///
    /// # Errors
    /// - [`crate::Error::ClockMovedBackward`] if the clock is behind the last
    ///   issued timestamp. No state changes; retry once the clock recovers.
    /// - [`crate::Error::TimestampOverflow`] if the clock is past the 41-bit
    ///   range.
    /// - [`crate::Error::LockPoisoned`] if another thread panicked while
    ///   holding the lock (not with `parking-lot`).
    ///
    /// # Example
    /// ```
    /// use snowmint::{LockSnowflakeGenerator, SystemClock};
    ///
    /// let generator = LockSnowflakeGenerator::new(1, 2, SystemClock::default()).unwrap();
    /// let id = generator.next_id().unwrap();
    /// assert_eq!(id.worker_id(), 1);
    /// assert_eq!(id.datacenter_id(), 2);
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<SnowflakeId> {
        let mut state = self.lock()?;
        state.next(self.machine, &self.time)
    }

    /// Attempts to generate the next ID without blocking.
    ///
    /// Returns [`Poll::Pending`] instead of spinning when the current tick is
    /// exhausted. The lock is released before returning.
    ///
    /// # Errors
    /// Same as [`Self::next_id`].
    ///
    /// # Example
    /// ```
    /// use snowmint::{LockSnowflakeGenerator, Poll, SnowflakeId};
    ///
    /// let generator = LockSnowflakeGenerator::try_default(0, 0).unwrap();
    ///
    /// let id: SnowflakeId = loop {
    ///     match generator.poll_id().unwrap() {
    ///         Poll::Ready { id } => break id,
    ///         Poll::Pending { .. } => std::thread::yield_now(),
    ///     }
    /// };
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn poll_id(&self) -> Result<Poll> {
        let mut state = self.lock()?;
        state.poll(self.machine, self.time.current_millis())
    }

    /// The configured worker identifier.
    pub fn worker_id(&self) -> u8 {
        self.machine.worker_id()
    }

    /// The configured datacenter identifier.
    pub fn datacenter_id(&self) -> u8 {
        self.machine.datacenter_id()
    }

    /// The timestamp of the last issued ID, if any.
    ///
    /// # Errors
    /// Returns [`crate::Error::LockPoisoned`] if the lock is poisoned.
    pub fn last_timestamp(&self) -> Result<Option<u64>> {
        Ok(self.lock()?.last_timestamp())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        #[cfg(feature = "parking-lot")]
        {
            Ok(self.state.lock())
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            Ok(self.state.lock()?)
        }
    }
}

impl<T> Clone for LockSnowflakeGenerator<T>
where
    T: TimeSource + Clone,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            machine: self.machine,
            time: self.time.clone(),
        }
    }
}

impl<T> fmt::Display for LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.machine, f)
    }
}

impl<T> fmt::Debug for LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockSnowflakeGenerator")
            .field("machine", &self.machine)
            .finish_non_exhaustive()
    }
}

impl<T> SnowflakeGenerator<T> for LockSnowflakeGenerator<T>
where
    T: TimeSource,
{
    fn new(worker_id: i64, datacenter_id: i64, time: T) -> Result<Self> {
        Self::new(worker_id, datacenter_id, time)
    }

    fn next_id(&self) -> Result<SnowflakeId> {
        self.next_id()
    }

    fn poll_id(&self) -> Result<Poll> {
        self.poll_id()
    }

    fn machine_id(&self) -> MachineId {
        self.machine
    }
}
