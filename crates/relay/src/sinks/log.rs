//! LogSink - logs commands via tracing instead of delivering them

use contracts::{Command, CommandSink, ContractError};
use tracing::{info, instrument};

/// Sink used when there is no producer to receive commands (replay runs)
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl CommandSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, command),
        fields(sink = %self.name, kind = command.kind())
    )]
    async fn write(&mut self, command: &Command) -> Result<(), ContractError> {
        let line = serde_json::to_string(command)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        info!(sink = %self.name, sensor = %command.sensor(), command = %line, "Command not delivered (no producer)");
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SensorName;

    #[tokio::test]
    async fn test_log_sink_write() {
        let mut sink = LogSink::new("test_log");
        let result = sink.write(&Command::clear(SensorName::Light)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
