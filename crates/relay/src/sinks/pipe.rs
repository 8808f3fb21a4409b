//! PipeSink - writes command lines into the producer's input stream

use contracts::{Command, CommandSink, ContractError};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, instrument};

use crate::codec::encode_line;

/// Sink over any async writer (child stdin, duplex pipe, file)
///
/// Each command goes out as one `write_all` of a complete line followed by
/// a flush, so the reader never sees a partial command.
pub struct PipeSink<W> {
    name: String,
    writer: Option<W>,
    lines_written: u64,
}

impl<W> PipeSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Wrap a writer
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer: Some(writer),
            lines_written: 0,
        }
    }

    /// Lines successfully written so far
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }
}

impl<W> CommandSink for PipeSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "pipe_sink_write",
        skip(self, command),
        fields(sink = %self.name, kind = command.kind())
    )]
    async fn write(&mut self, command: &Command) -> Result<(), ContractError> {
        let line =
            encode_line(command).map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| ContractError::sink_write(&self.name, "pipe already closed"))?;

        writer
            .write_all(&line)
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;

        self.lines_written += 1;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        if let Some(writer) = self.writer.as_mut() {
            writer
                .flush()
                .await
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        }
        Ok(())
    }

    #[instrument(name = "pipe_sink_close", skip(self), fields(sink = %self.name))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut writer) = self.writer.take() {
            // Closing the producer's stdin is its end-of-input signal
            writer
                .shutdown()
                .await
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
            debug!(sink = %self.name, lines = self.lines_written, "PipeSink closed");
        }
        Ok(())
    }
}
