//! CommandSink trait - relay output interface
//!
//! Defines where override/clear commands end up.

use crate::{Command, ContractError};

/// Command output trait
///
/// Every relay destination implements this trait.
#[trait_variant::make(CommandSink: Send)]
pub trait LocalCommandSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one command as a single line
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, command: &Command) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
