//! # Producer
//!
//! Lifecycle of the telemetry producer child process.
//!
//! The process is spawned with all three standard streams piped. Its stdout
//! feeds the snapshot store, its stderr goes to the log, and its stdin is
//! handed out for the command relay. An unexpected exit freezes the store
//! on its last snapshot and flags it stale.

pub mod error;
pub mod process;

pub use error::{ProducerError, Result};
pub use process::{ProducerExit, ProducerProcess};
