//! # Relay
//!
//! One-way command channel from the operator to the producer.
//!
//! Responsibilities:
//! - Encode override/clear commands as single JSON lines
//! - Queue them without blocking the caller (fire-and-forget)
//! - Write them in order from one worker task, one write per line
//! - Log and count failures instead of propagating them

pub mod codec;
pub mod error;
pub mod metrics;
pub mod relay;
pub mod sinks;

pub use codec::encode_line;
pub use contracts::{Command, CommandSink};
pub use error::RelayError;
pub use metrics::{RelayMetrics, RelayMetricsSnapshot};
pub use relay::CommandRelay;
pub use sinks::{LogSink, PipeSink};
