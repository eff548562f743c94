//! Snowflake-style 64-bit ID generation.
//!
//! Every ID packs a 41-bit millisecond timestamp, a 5-bit datacenter ID, a
//! 5-bit worker ID and a 12-bit sequence under a clear sign bit. IDs from one
//! generator are strictly increasing; IDs from generators with distinct
//! `(worker_id, datacenter_id)` pairs never collide.
//!
//! ```
//! use snowmint::{LockSnowflakeGenerator, SnowflakeId};
//!
//! let generator = LockSnowflakeGenerator::try_default(1, 1)?;
//! let id: SnowflakeId = generator.next_id()?;
//!
//! assert_eq!(id.worker_id(), 1);
//! assert_eq!(id.datacenter_id(), 1);
//! assert!(generator.next_id()? > id);
//! # Ok::<(), snowmint::Error>(())
//! ```
//!
//! If the system clock steps backwards, generation fails with
//! [`Error::ClockMovedBackward`] until the clock catches up. Retrying is left
//! to the caller.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod error;
mod generator;
mod id;
mod time;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::time::*;
