//! Dashboard error types

use contracts::ContractError;
use thiserror::Error;

/// Errors surfaced to the display
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Effective state could not be computed
    #[error("state unavailable: {message}")]
    StateUnavailable { message: String },

    /// Override request rejected
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl DashboardError {
    /// Create state unavailable error
    pub fn state_unavailable(message: impl Into<String>) -> Self {
        Self::StateUnavailable {
            message: message.into(),
        }
    }
}

/// Operator console parse errors
#[derive(Debug, Error, PartialEq)]
pub enum ConsoleError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),

    #[error("'{command}' needs a {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("'{command}' takes no more arguments, got '{extra}'")]
    UnexpectedArgument { command: &'static str, extra: String },

    #[error("'{value}' is not a number")]
    InvalidNumber { value: String },

    #[error("unknown sensor '{0}'")]
    UnknownSensor(String),
}
