//! Ingestion error types

use thiserror::Error;

/// Ingestion error
///
/// Always contained: the offending line is discarded and the last good
/// snapshot keeps being served.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Line is not a valid snapshot (malformed JSON or missing field)
    #[error("failed to parse snapshot line: {message}")]
    Parse {
        /// Error message
        message: String,
        /// Leading part of the offending line
        excerpt: String,
    },

    /// Line exceeded the configured maximum length
    #[error("line too long: {len} bytes exceeds limit of {max} bytes")]
    LineTooLong {
        /// Bytes seen before the line was dropped
        len: usize,
        /// Configured limit
        max: usize,
    },
}

impl IngestionError {
    /// Create parse error, keeping a short excerpt of the input
    pub fn parse(message: impl Into<String>, line: &str) -> Self {
        const EXCERPT_CHARS: usize = 120;
        Self::Parse {
            message: message.into(),
            excerpt: line.chars().take(EXCERPT_CHARS).collect(),
        }
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
