use core::{fmt, time::Duration};

use crate::{
    BasicSnowflakeGenerator, EPOCH, Error, IdField, LockSnowflakeGenerator, Result, SnowflakeId,
    SystemClock,
};

/// A validated `(worker_id, datacenter_id)` pair.
///
/// Both identifiers are checked once, here, and never again. Assigning
/// distinct pairs to distinct instances is up to the deployment (static
/// config, orchestrator, registration service).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MachineId {
    worker_id: u8,
    datacenter_id: u8,
}

impl MachineId {
    /// Validates both identifiers against their 5-bit ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] naming the first field outside
    /// `0..=31`. The worker ID is checked first.
    ///
    /// # Example
    ///
    /// ```
    /// use snowmint::{Error, IdField, MachineId};
    ///
    /// let machine = MachineId::new(31, 0).unwrap();
    /// assert_eq!(machine.worker_id(), 31);
    ///
    /// let err = MachineId::new(32, 0).unwrap_err();
    /// assert!(matches!(
    ///     err,
    ///     Error::InvalidConfiguration { field: IdField::WorkerId, value: 32, max: 31 }
    /// ));
    /// ```
    pub fn new(worker_id: i64, datacenter_id: i64) -> Result<Self> {
        Ok(Self {
            worker_id: check(IdField::WorkerId, worker_id, SnowflakeId::max_worker_id())?,
            datacenter_id: check(
                IdField::DatacenterId,
                datacenter_id,
                SnowflakeId::max_datacenter_id(),
            )?,
        })
    }

    /// The worker identifier.
    #[must_use]
    pub const fn worker_id(&self) -> u8 {
        self.worker_id
    }

    /// The datacenter identifier.
    #[must_use]
    pub const fn datacenter_id(&self) -> u8 {
        self.datacenter_id
    }

    /// The first ID this machine can issue at `timestamp`.
    pub(crate) const fn first_id(&self, timestamp: u64) -> SnowflakeId {
        SnowflakeId::from_components(
            timestamp,
            self.datacenter_id as u64,
            self.worker_id as u64,
            0,
        )
    }
}

fn check(field: IdField, value: i64, max: u64) -> Result<u8> {
    match u8::try_from(value) {
        Ok(id) if u64::from(id) <= max => Ok(id),
        _ => Err(Error::InvalidConfiguration {
            field,
            value,
            max: max as u8,
        }),
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timestamp left shift {}, datacenter id bits {}, worker id bits {}, sequence bits {}, workerid {}, datacenterId {}",
            SnowflakeId::TIMESTAMP_SHIFT,
            SnowflakeId::DATACENTER_ID_BITS,
            SnowflakeId::WORKER_ID_BITS,
            SnowflakeId::SEQUENCE_BITS,
            self.worker_id,
            self.datacenter_id,
        )
    }
}

/// Deserializable generator settings.
///
/// With the `serde` feature this can be read straight from a config file or
/// an orchestrator payload:
///
/// ```
/// # #[cfg(feature = "serde")] {
/// use snowmint::GeneratorConfig;
///
/// let config: GeneratorConfig =
///     serde_json::from_str(r#"{ "worker_id": 3, "datacenter_id": 1 }"#).unwrap();
/// let generator = config.build().unwrap();
/// assert_eq!(generator.worker_id(), 3);
/// # }
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Worker identifier, `0..=31`.
    pub worker_id: i64,
    /// Datacenter identifier, `0..=31`.
    pub datacenter_id: i64,
    /// Epoch in milliseconds since the Unix epoch. Defaults to [`EPOCH`].
    #[cfg_attr(feature = "serde", serde(default = "default_epoch_millis"))]
    pub epoch_millis: u64,
}

const fn default_epoch_millis() -> u64 {
    EPOCH.as_millis() as u64
}

impl GeneratorConfig {
    /// Settings for the given identifiers at the default [`EPOCH`].
    #[must_use]
    pub const fn new(worker_id: i64, datacenter_id: i64) -> Self {
        Self {
            worker_id,
            datacenter_id,
            epoch_millis: default_epoch_millis(),
        }
    }

    /// Validates the identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if either identifier is out of
    /// range.
    pub fn machine_id(&self) -> Result<MachineId> {
        MachineId::new(self.worker_id, self.datacenter_id)
    }

    /// The wall clock these settings describe.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EpochInFuture`] if `epoch_millis` is later than the
    /// current system time.
    pub fn clock(&self) -> Result<SystemClock> {
        SystemClock::try_with_epoch(Duration::from_millis(self.epoch_millis))
    }

    /// Builds a thread-safe generator on the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if either identifier is out of
    /// range, or [`Error::EpochInFuture`] if the epoch has not been reached.
    pub fn build(&self) -> Result<LockSnowflakeGenerator<SystemClock>> {
        Ok(LockSnowflakeGenerator::from_machine_id(
            self.machine_id()?,
            self.clock()?,
        ))
    }

    /// Builds a single-threaded generator on the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if either identifier is out of
    /// range, or [`Error::EpochInFuture`] if the epoch has not been reached.
    pub fn build_basic(&self) -> Result<BasicSnowflakeGenerator<SystemClock>> {
        Ok(BasicSnowflakeGenerator::from_machine_id(
            self.machine_id()?,
            self.clock()?,
        ))
    }
}
