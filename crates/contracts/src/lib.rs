//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the dashboard.
//! Business crates depend on this crate only, never on each other's internals.
//!
//! ## Data model
//! - [`Snapshot`]: one immutable telemetry record emitted by the producer
//! - [`OverrideValue`]: operator-forced value for a single sensor
//! - [`Command`]: line-delimited control message sent back to the producer

mod command;
mod config;
mod error;
mod sensor;
mod sink;
mod snapshot;

pub use command::*;
pub use config::*;
pub use error::*;
pub use sensor::*;
pub use sink::{CommandSink, LocalCommandSink};
pub use snapshot::*;
