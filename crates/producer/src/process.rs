//! Producer process spawning and supervision

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use contracts::{ProducerConfig, StreamConfig, TelemetryBackendConfig};
use ingestion::{pump, PumpSummary, SnapshotStore};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{ProducerError, Result};

/// Upper bound for draining stdout after the process is gone
const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// How the producer process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProducerExit {
    /// Exited on its own
    Exited(ExitStatus),
    /// Killed during shutdown
    Killed(ExitStatus),
    /// Could not be waited on
    Lost(String),
}

impl ProducerExit {
    /// True when the process ended without being asked to
    pub fn is_unexpected(&self) -> bool {
        !matches!(self, ProducerExit::Killed(_))
    }

    /// Reason recorded on the store when the exit was unexpected
    fn stale_reason(&self) -> Option<String> {
        match self {
            ProducerExit::Exited(status) => Some(format!("producer exited ({status})")),
            ProducerExit::Lost(message) => Some(format!("producer lost: {message}")),
            ProducerExit::Killed(_) => None,
        }
    }
}

/// Running producer
///
/// Dropping the handle without calling [`ProducerProcess::shutdown`] still
/// kills the child.
pub struct ProducerProcess {
    pid: Option<u32>,
    stdin: Option<ChildStdin>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    supervisor: JoinHandle<ProducerExit>,
    shutdown_timeout: Duration,
}

impl ProducerProcess {
    /// Start the producer and wire its streams
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(
        name = "producer_spawn",
        skip_all,
        fields(program = %config.program)
    )]
    pub fn spawn(
        config: &ProducerConfig,
        backend: &TelemetryBackendConfig,
        stream: &StreamConfig,
        store: Arc<SnapshotStore>,
    ) -> Result<Self> {
        let mut command = Command::new(&config.program);
        command
            .args(&config.args)
            .envs(backend.env_vars())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref dir) = config.working_dir {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .map_err(|e| ProducerError::spawn(&config.program, e))?;
        let pid = child.id();

        let stdin = child
            .stdin
            .take()
            .ok_or(ProducerError::MissingPipe { pipe: "stdin" })?;
        let stdout = child
            .stdout
            .take()
            .ok_or(ProducerError::MissingPipe { pipe: "stdout" })?;
        let stderr = child
            .stderr
            .take()
            .ok_or(ProducerError::MissingPipe { pipe: "stderr" })?;

        let pump_store = Arc::clone(&store);
        let read_buffer_bytes = stream.read_buffer_bytes;
        let stdout_task =
            tokio::spawn(async move { pump(stdout, &pump_store, read_buffer_bytes).await });

        tokio::spawn(log_stderr(stderr));

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let supervisor = tokio::spawn(supervise(child, shutdown_rx, stdout_task, store));

        info!(pid = ?pid, args = ?config.args, "Producer started");

        Ok(Self {
            pid,
            stdin: Some(stdin),
            shutdown_tx: Some(shutdown_tx),
            supervisor,
            shutdown_timeout: Duration::from_millis(config.shutdown_timeout_ms),
        })
    }

    /// OS process id, if still known
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    /// Take the write end of the producer's stdin (once)
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.stdin.take()
    }

    /// Grace period configured for [`ProducerProcess::shutdown`]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Whether the supervisor still sees the process alive
    pub fn is_running(&self) -> bool {
        !self.supervisor.is_finished()
    }

    /// Kill the process and wait for it to be reaped
    ///
    /// A process that already exited on its own is reported as such.
    #[instrument(name = "producer_shutdown", skip(self), fields(pid = ?self.pid))]
    pub async fn shutdown(mut self) -> Result<ProducerExit> {
        drop(self.stdin.take());
        if let Some(tx) = self.shutdown_tx.take() {
            // Err means the supervisor already finished
            let _ = tx.send(());
        }

        let timeout_ms = saturating_millis(self.shutdown_timeout);
        match tokio::time::timeout(self.shutdown_timeout, &mut self.supervisor).await {
            Ok(Ok(exit)) => {
                debug!(exit = ?exit, "Producer shutdown complete");
                Ok(exit)
            }
            Ok(Err(e)) => Err(ProducerError::Supervisor {
                message: e.to_string(),
            }),
            Err(_) => {
                self.supervisor.abort();
                error!(timeout_ms, "Producer did not exit in time");
                Err(ProducerError::ShutdownTimeout { timeout_ms })
            }
        }
    }
}

impl Drop for ProducerProcess {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Wait for the child to exit on its own or for a shutdown request
async fn supervise(
    mut child: Child,
    mut shutdown_rx: oneshot::Receiver<()>,
    mut stdout_task: JoinHandle<std::io::Result<PumpSummary>>,
    store: Arc<SnapshotStore>,
) -> ProducerExit {
    let exit = tokio::select! {
        status = child.wait() => match status {
            Ok(status) => ProducerExit::Exited(status),
            Err(e) => ProducerExit::Lost(e.to_string()),
        },
        _ = &mut shutdown_rx => {
            if let Err(e) = child.start_kill() {
                warn!(error = %e, "Failed to signal producer");
            }
            match child.wait().await {
                Ok(status) => ProducerExit::Killed(status),
                Err(e) => ProducerExit::Lost(e.to_string()),
            }
        }
    };

    // Let the pump commit whatever the process wrote before it went away
    match tokio::time::timeout(DRAIN_TIMEOUT, &mut stdout_task).await {
        Ok(Ok(Ok(summary))) => debug!(lines = summary.lines, "Producer stdout drained"),
        Ok(Ok(Err(e))) => warn!(error = %e, "Producer stdout read failed"),
        Ok(Err(e)) => error!(error = %e, "Producer stdout task panicked"),
        Err(_) => {
            // A leftover grandchild may still hold stdout; stop reading it
            stdout_task.abort();
            warn!("Producer stdout still open after exit, pump stopped");
        }
    }

    if let Some(reason) = exit.stale_reason() {
        metrics::counter!("greenhouse_producer_exits_total").increment(1);
        error!(exit = ?exit, "Producer exited unexpectedly");
        store.mark_stale(reason);
    }

    exit
}

async fn log_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => warn!(target: "producer", line = %line, "Producer stderr"),
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "Producer stderr closed");
                break;
            }
        }
    }
}
