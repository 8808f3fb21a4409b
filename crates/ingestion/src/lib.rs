//! # Ingestion
//!
//! Producer stream consumption.
//!
//! Responsibilities:
//! - Split the producer's byte stream into lines, keeping partial tails
//! - Parse each line as a `Snapshot`, discarding malformed ones
//! - Hold the latest snapshot and serve it without blocking

pub mod error;
pub mod framer;
pub mod pump;
pub mod store;

pub use error::{IngestionError, Result};
pub use framer::{FramedLine, LineFramer};
pub use pump::{pump, PumpSummary};
pub use store::{parse_line, IngestReport, SnapshotStore, StoreStatus};
