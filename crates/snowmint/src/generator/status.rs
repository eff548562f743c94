use crate::SnowflakeId;

/// Represents the result of a single non-blocking generation attempt.
///
/// This type models the outcome of `poll_id()`:
///
/// - [`Poll::Ready`] indicates a new ID was successfully generated.
/// - [`Poll::Pending`] means all 4096 sequence numbers of the current tick
///   are spent and the caller should back off for `yield_for` milliseconds.
///
/// This allows non-blocking generation loops and clean backoff strategies.
///
/// # Example
///
/// ```
/// use snowmint::{BasicSnowflakeGenerator, Poll, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1
///     }
/// }
///
/// let generator = BasicSnowflakeGenerator::new(0, 0, FixedTime).unwrap();
/// match generator.poll_id().unwrap() {
///     Poll::Ready { id } => println!("ID: {}", id.timestamp()),
///     Poll::Pending { yield_for } => println!("Back off for: {yield_for}ms"),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated Snowflake ID.
        id: SnowflakeId,
    },
    /// No ID could be generated because the sequence has been exhausted for
    /// the current tick.
    Pending {
        /// Milliseconds to wait before trying again.
        yield_for: u64,
    },
}
