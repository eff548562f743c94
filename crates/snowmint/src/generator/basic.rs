use core::{cell::Cell, fmt};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::state::State;
use crate::{MachineId, Poll, Result, SnowflakeGenerator, SnowflakeId, SystemClock, TimeSource};

/// A non-concurrent Snowflake ID generator suitable for single-threaded
/// environments.
///
/// This generator is lightweight and fast, but **not thread-safe**. It can be
/// moved to another thread but not shared between threads, which the
/// compiler enforces (`Send`, not `Sync`). Run one per thread or shard, each
/// with its own worker/datacenter pair.
///
/// ## Features
/// - ❌ Not thread-safe
/// - ✅ No locking on the hot path
///
/// ## Recommended When
/// - You're in a single-threaded environment (no shared access)
/// - You want the fastest generator
///
/// ## See Also
/// - [`LockSnowflakeGenerator`]
///
/// [`LockSnowflakeGenerator`]: crate::LockSnowflakeGenerator
pub struct BasicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    state: Cell<State>,
    machine: MachineId,
    time: T,
}

impl BasicSnowflakeGenerator<SystemClock> {
    /// Creates a generator on the system clock at the default [`EPOCH`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfiguration`] if either identifier is
    /// outside `0..=31`.
    ///
    /// [`EPOCH`]: crate::EPOCH
    pub fn try_default(worker_id: i64, datacenter_id: i64) -> Result<Self> {
        Self::new(worker_id, datacenter_id, SystemClock::default())
    }
}

impl<T> BasicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new [`BasicSnowflakeGenerator`] for the given identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfiguration`] if either identifier is
    /// outside `0..=31`.
    ///
    /// # Example
    /// ```
    /// use snowmint::{BasicSnowflakeGenerator, SystemClock};
    ///
    /// let generator = BasicSnowflakeGenerator::new(0, 1, SystemClock::default()).unwrap();
    /// let id = generator.next_id().unwrap();
    /// assert_eq!(id.datacenter_id(), 1);
    /// ```
    pub fn new(worker_id: i64, datacenter_id: i64, time: T) -> Result<Self> {
        Ok(Self::from_machine_id(
            MachineId::new(worker_id, datacenter_id)?,
            time,
        ))
    }

    /// Creates a generator from already validated identifiers.
    pub const fn from_machine_id(machine: MachineId, time: T) -> Self {
        Self {
            state: Cell::new(State::new()),
            machine,
            time,
        }
    }

    /// Generates the next ID, spinning into the next tick if the current one
    /// is exhausted.
    ///
    /// # Errors
    /// - [`crate::Error::ClockMovedBackward`] if the clock is behind the last
    ///   issued timestamp.
    /// - [`crate::Error::TimestampOverflow`] if the clock is past the 41-bit
    ///   range.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<SnowflakeId> {
        let mut state = self.state.get();
        let id = state.next(self.machine, &self.time)?;
        self.state.set(state);
        Ok(id)
    }

    /// Attempts to generate the next ID without blocking.
    ///
    /// # Errors
    /// Same as [`Self::next_id`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn poll_id(&self) -> Result<Poll> {
        let mut state = self.state.get();
        let status = state.poll(self.machine, self.time.current_millis())?;
        self.state.set(state);
        Ok(status)
    }

    /// The configured worker identifier.
    pub const fn worker_id(&self) -> u8 {
        self.machine.worker_id()
    }

    /// The configured datacenter identifier.
    pub const fn datacenter_id(&self) -> u8 {
        self.machine.datacenter_id()
    }

    /// The timestamp of the last issued ID, if any.
    pub fn last_timestamp(&self) -> Option<u64> {
        self.state.get().last_timestamp()
    }
}

impl<T> fmt::Display for BasicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.machine, f)
    }
}

impl<T> fmt::Debug for BasicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicSnowflakeGenerator")
            .field("machine", &self.machine)
            .field("last_timestamp", &self.last_timestamp())
            .finish_non_exhaustive()
    }
}

impl<T> SnowflakeGenerator<T> for BasicSnowflakeGenerator<T>
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
