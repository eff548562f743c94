use core::cmp::Ordering;

use crate::{Error, MachineId, Poll, Result, SnowflakeId, TimeSource};

/// The mutable half of a generator: the last ID handed out.
///
/// `None` until the first successful generation. The last timestamp and the
/// sequence are both read back out of the stored ID.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct State {
    last: Option<SnowflakeId>,
}

impl State {
    pub(crate) const fn new() -> Self {
        Self { last: None }
    }

    pub(crate) fn last_timestamp(&self) -> Option<u64> {
        self.last.map(|id| id.timestamp())
    }

    /// One step of the generation state machine at time `now`.
    ///
    /// Never mutates on `Pending` or `Err`.
    pub(crate) fn poll(&mut self, machine: MachineId, now: u64) -> Result<Poll> {
        let Some(last) = self.last else {
            return self.rollover(machine, now).map(|id| Poll::Ready { id });
        };

        match now.cmp(&last.timestamp()) {
            Ordering::Equal if last.has_sequence_room() => {
                let id = last.increment_sequence();
                self.last = Some(id);
                Ok(Poll::Ready { id })
            }
            Ordering::Equal => Ok(Poll::Pending { yield_for: 1 }),
            Ordering::Greater => self.rollover(machine, now).map(|id| Poll::Ready { id }),
            Ordering::Less => Err(cold_clock_behind(now, last.timestamp())),
        }
    }

    /// Generates an ID, spinning on `time` through sequence exhaustion.
    ///
    /// The caller must hold exclusive access for the whole call.
    pub(crate) fn next<T>(&mut self, machine: MachineId, time: &T) -> Result<SnowflakeId>
    where
        T: TimeSource + ?Sized,
    {
        match self.poll(machine, time.current_millis())? {
            Poll::Ready { id } => Ok(id),
            Poll::Pending { .. } => {
                let last = self.last_timestamp().unwrap_or_default();
                #[cfg(feature = "tracing")]
                tracing::debug!(last_timestamp = last, "sequence exhausted, spinning for next tick");
                let now = til_next_millis(time, last);
                self.rollover(machine, now)
            }
        }
    }

    fn rollover(&mut self, machine: MachineId, now: u64) -> Result<SnowflakeId> {
        if now > SnowflakeId::max_timestamp() {
            return Err(cold_timestamp_overflow(now));
        }
        let id = machine.first_id(now);
        self.last = Some(id);
        Ok(id)
    }
}

fn til_next_millis<T>(time: &T, last: u64) -> u64
where
    T: TimeSource + ?Sized,
{
    loop {
        let now = time.current_millis();
        if now > last {
            break now;
        }
        core::hint::spin_loop();
    }
}

#[cold]
#[inline(never)]
fn cold_clock_behind(now: u64, last_timestamp: u64) -> Error {
    let behind_by = last_timestamp - now;
    #[cfg(feature = "tracing")]
    tracing::warn!(last_timestamp, behind_by, "clock moved backwards, refusing to generate id");
    Error::ClockMovedBackward {
        last_timestamp,
        behind_by,
    }
}

#[cold]
#[inline(never)]
fn cold_timestamp_overflow(timestamp: u64) -> Error {
    #[cfg(feature = "tracing")]
    tracing::error!(timestamp, "timestamp no longer fits the id layout");
    Error::TimestampOverflow {
        timestamp,
        max: SnowflakeId::max_timestamp(),
    }
}
