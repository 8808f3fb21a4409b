//! CommandRelay - one queue and one writer task per producer input

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{Command, CommandSink, OverrideValue, SensorName};

use crate::error::RelayError;
use crate::metrics::RelayMetrics;

/// Handle to a running relay worker
///
/// Sends never block: a full queue drops the command and reports it.
/// Commands that make it into the queue are written in submission order.
pub struct CommandRelay {
    name: String,
    tx: mpsc::Sender<Command>,
    metrics: Arc<RelayMetrics>,
    worker_handle: JoinHandle<()>,
}

impl CommandRelay {
    /// Spawn the worker task that drains the queue into `sink`
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S: CommandSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(RelayMetrics::new(name.as_str()));

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            relay_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    /// Sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared metrics
    pub fn metrics(&self) -> &Arc<RelayMetrics> {
        &self.metrics
    }

    /// Ask the producer to pin `sensor` at `value`
    pub fn send_override(&self, sensor: SensorName, value: f64) -> Result<(), RelayError> {
        self.send(Command::set(sensor, OverrideValue::constant(value)))
    }

    /// Ask the producer to keep `sensor` within `[min, max]`
    pub fn send_override_range(
        &self,
        sensor: SensorName,
        min: f64,
        max: f64,
    ) -> Result<(), RelayError> {
        self.send(Command::set(sensor, OverrideValue::range(min, max)))
    }

    /// Ask the producer to drop its override of `sensor`
    pub fn send_clear(&self, sensor: SensorName) -> Result<(), RelayError> {
        self.send(Command::clear(sensor))
    }

    /// Queue a command (non-blocking)
    pub fn send(&self, command: Command) -> Result<(), RelayError> {
        let kind = command.kind();
        match self.tx.try_send(command) {
            Ok(()) => {
                self.metrics
                    .observe_queue(self.tx.max_capacity() - self.tx.capacity());
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(cmd)) => {
                self.metrics.record_dropped(kind, "full");
                warn!(
                    sink = %self.name,
                    kind,
                    sensor = %cmd.sensor(),
                    "Queue full, command dropped"
                );
                Err(RelayError::QueueFull {
                    sink_name: self.name.clone(),
                    kind,
                })
            }
            Err(mpsc::error::TrySendError::Closed(cmd)) => {
                self.metrics.record_dropped(kind, "closed");
                error!(
                    sink = %self.name,
                    kind,
                    sensor = %cmd.sensor(),
                    "Relay worker closed, command dropped"
                );
                Err(RelayError::Closed {
                    sink_name: self.name.clone(),
                })
            }
        }
    }

    /// Drain pending commands, close the sink and stop the worker
    ///
    /// A sink that stays blocked past `timeout` (e.g. a producer that stopped
    /// reading its stdin) is abandoned: the worker is aborted and whatever is
    /// still queued is lost. Returns `true` when the drain completed.
    #[instrument(name = "command_relay_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self, timeout: Duration) -> bool {
        drop(self.tx);
        let mut worker = self.worker_handle;
        match tokio::time::timeout(timeout, &mut worker).await {
            Ok(Ok(())) => {
                debug!(sink = %self.name, "CommandRelay shutdown complete");
                true
            }
            Ok(Err(e)) => {
                error!(sink = %self.name, error = ?e, "Relay worker panicked");
                false
            }
            Err(_) => {
                worker.abort();
                warn!(
                    sink = %self.name,
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    pending = self.metrics.snapshot().queue_len,
                    "Relay drain timed out, worker aborted"
                );
                false
            }
        }
    }
}

#[instrument(
    name = "command_relay_worker",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn relay_worker<S: CommandSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<Command>,
    metrics: Arc<RelayMetrics>,
    name: String,
) {
    debug!(sink = %name, "Relay worker started");

    while let Some(command) = rx.recv().await {
        metrics.observe_queue(rx.len());

        match sink.write(&command).await {
            Ok(()) => {
                metrics.record_written(command.kind());
                debug!(sink = %name, kind = command.kind(), sensor = %command.sensor(), "Command written");
            }
            Err(e) => {
                // No retry: the next command gets a fresh attempt
                metrics.record_failed(command.kind());
                error!(
                    sink = %name,
                    kind = command.kind(),
                    sensor = %command.sensor(),
                    error = %e,
                    "Command write failed"
                );
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Relay worker stopped");
}
