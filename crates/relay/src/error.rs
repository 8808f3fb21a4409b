//! Relay error types

use thiserror::Error;

/// Relay-specific errors
#[derive(Debug, Error)]
pub enum RelayError {
    /// Queue full - command dropped
    #[error("queue full for sink '{sink_name}', {kind} command dropped")]
    QueueFull {
        sink_name: String,
        kind: &'static str,
    },

    /// Worker gone - command dropped
    #[error("relay '{sink_name}' is closed")]
    Closed { sink_name: String },

    /// Command could not be encoded
    #[error("failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),

    /// Sink error (from contract)
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),
}
