use crate::{MachineId, Poll, Result, SnowflakeId, TimeSource};

/// A minimal interface for generating Snowflake IDs.
pub trait SnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new generator, validating both identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfiguration`] if either identifier is
    /// outside `0..=31`.
    fn new(worker_id: i64, datacenter_id: i64, time: T) -> Result<Self>
    where
        Self: Sized;

    /// Generates the next ID, spinning into the next tick if the current
    /// one is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ClockMovedBackward`] if the clock is behind the
    /// last issued timestamp. Implementations may add their own failure
    /// modes (e.g. lock poisoning).
    fn next_id(&self) -> Result<SnowflakeId>;

    /// Attempts to generate the next ID without blocking.
    ///
    /// # Errors
    ///
    /// Same as [`SnowflakeGenerator::next_id`].
    fn poll_id(&self) -> Result<Poll>;

    /// The validated identifiers this generator stamps into every ID.
    fn machine_id(&self) -> MachineId;

    /// The configured worker identifier.
    fn worker_id(&self) -> u8 {
        self.machine_id().worker_id()
    }

    /// The configured datacenter identifier.
    fn datacenter_id(&self) -> u8 {
        self.machine_id().datacenter_id()
    }
}
