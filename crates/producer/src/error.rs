//! Producer error types

use thiserror::Error;

/// Producer lifecycle errors
#[derive(Debug, Error)]
pub enum ProducerError {
    /// Process could not be started
    #[error("failed to spawn producer '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A standard stream was not piped
    #[error("producer {pipe} is not available")]
    MissingPipe { pipe: &'static str },

    /// Process was not reaped in time
    #[error("producer did not exit within {timeout_ms}ms")]
    ShutdownTimeout { timeout_ms: u64 },

    /// Supervisor task failed
    #[error("producer supervisor failed: {message}")]
    Supervisor { message: String },
}

impl ProducerError {
    /// Create spawn error
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, ProducerError>;
