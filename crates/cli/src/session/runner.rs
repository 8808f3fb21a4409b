//! Session runner.

use std::future::Future;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{DashboardConfig, OverridePolicy, TelemetryBackendConfig};
use dashboard::{execute, ConsoleReply, DashboardService, DashboardView, OperatorCommand};
use ingestion::{pump, PumpSummary, SnapshotStore};
use producer::ProducerProcess;
use relay::{CommandRelay, LogSink, PipeSink};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use super::SessionStats;
use crate::error::CliError;

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Validated dashboard configuration
    pub config: DashboardConfig,

    /// Telemetry backend settings handed to the producer
    pub backend: TelemetryBackendConfig,

    /// Recorded producer output to read instead of spawning the producer
    pub replay_path: Option<PathBuf>,

    /// Stop after this long (None = until quit or signal)
    pub timeout: Option<Duration>,

    /// Read operator commands from stdin
    pub console: bool,
}

/// Where snapshots come from
enum Source {
    Producer(ProducerProcess),
    Replay(JoinHandle<std::io::Result<PumpSummary>>),
}

/// One run of the dashboard
pub struct Session {
    config: SessionConfig,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Run until the operator quits, `shutdown` resolves or the timeout hits
    ///
    /// The producer is terminated on every exit path: explicitly here, or by
    /// the process handle's drop if an error unwinds first.
    #[instrument(name = "dashboard_session", skip_all)]
    pub async fn run<F>(self, shutdown: F) -> Result<SessionStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let config = &self.config.config;

        let store = Arc::new(SnapshotStore::new(&config.stream));
        let (source, relay) = self.start_source(&store)?;

        let service = match relay {
            Some(relay) => DashboardService::forwarding(Arc::clone(&store), relay),
            None => DashboardService::local(Arc::clone(&store)),
        };
        let view = DashboardView::new(config.display.gauges);

        let mut console = if self.config.console {
            spawn_console()
        } else {
            None
        };
        if console.is_some() {
            println!("{}", dashboard::console::HELP);
        }

        let mut stats = SessionStats::default();
        let mut last_render = String::new();

        let mut ticker =
            tokio::time::interval(Duration::from_millis(config.display.poll_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let timeout = self.config.timeout;
        let deadline = async move {
            match timeout {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(shutdown);
        tokio::pin!(deadline);

        info!(policy = ?service.policy(), "Dashboard running");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    refresh(&service, &view, &mut stats, &mut last_render);
                }
                line = next_console_line(&mut console) => match line {
                    Some(line) => {
                        if handle_console_line(&service, &line) {
                            info!("Operator requested quit");
                            break;
                        }
                    }
                    None => {
                        debug!("Console input closed");
                        console = None;
                    }
                },
                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping dashboard...");
                    break;
                }
                _ = &mut deadline => {
                    info!("Timeout reached, stopping dashboard");
                    break;
                }
            }
        }

        stats.relay = service.status().relay;
        // Drain queued commands before the producer's stdin goes away,
        // bounded: a producer that stopped reading stdin blocks the writes
        let drain_timeout = Duration::from_millis(config.producer.shutdown_timeout_ms);
        if !service.shutdown(drain_timeout).await {
            warn!("Queued commands abandoned during shutdown");
        }

        match source {
            Source::Producer(producer) => match producer.shutdown().await {
                Ok(exit) => {
                    info!(exit = ?exit, "Producer stopped");
                    stats.producer_exit = Some(format!("{exit:?}"));
                }
                Err(e) => {
                    warn!(error = %e, "Producer shutdown incomplete");
                    stats.producer_exit = Some(e.to_string());
                }
            },
            Source::Replay(handle) => {
                if !handle.is_finished() {
                    handle.abort();
                }
            }
        }

        stats.store = store.status();
        stats.duration = start_time.elapsed();
        Ok(stats)
    }

    /// Start the snapshot source and, under the forward policy, a relay to it
    fn start_source(&self, store: &Arc<SnapshotStore>) -> Result<(Source, Option<CommandRelay>)> {
        let config = &self.config.config;
        let forward = config.overrides.policy == OverridePolicy::Forward;
        let capacity = config.relay.queue_capacity;

        if let Some(ref path) = self.config.replay_path {
            let file = std::fs::File::open(path).map_err(|source| CliError::ReplayOpen {
                path: path.clone(),
                source,
            })?;
            let file = tokio::fs::File::from_std(file);
            let replay_store = Arc::clone(store);
            let read_buffer_bytes = config.stream.read_buffer_bytes;

            info!(path = %path.display(), "Replaying recorded producer output");
            let handle =
                tokio::spawn(async move { pump(file, &replay_store, read_buffer_bytes).await });

            // Nobody reads commands during a replay; log what would have been sent
            let relay = forward.then(|| CommandRelay::spawn(LogSink::new("replay"), capacity));
            return Ok((Source::Replay(handle), relay));
        }

        let mut producer = ProducerProcess::spawn(
            &config.producer,
            &self.config.backend,
            &config.stream,
            Arc::clone(store),
        )
        .context("Failed to start producer")?;

        let relay = if forward {
            producer
                .take_stdin()
                .map(|stdin| CommandRelay::spawn(PipeSink::new("producer_stdin", stdin), capacity))
        } else {
            None
        };

        Ok((Source::Producer(producer), relay))
    }
}

/// Render one frame; print it only when it differs from the previous one
fn refresh(
    service: &DashboardService,
    view: &DashboardView,
    stats: &mut SessionStats,
    last_render: &mut String,
) {
    let raw = service.store().read();
    if stats.readings.update(&raw) {
        observability::record_snapshot(&raw);
    }

    let frame = service.frame();
    observability::record_frame_rendered(frame.store.is_stale());
    stats.frames_rendered += 1;

    let text = view.render(&frame);
    if text != *last_render {
        println!("{text}");
        *last_render = text;
    }
}

/// Returns true when the operator asked to quit
fn handle_console_line(service: &DashboardService, line: &str) -> bool {
    if line.trim().is_empty() {
        return false;
    }
    match line.parse::<OperatorCommand>() {
        Ok(command) => match execute(service, command) {
            Ok(ConsoleReply::Quit) => return true,
            Ok(ConsoleReply::Message(message)) => println!("> {message}"),
            Err(e) => println!("! {e}"),
        },
        Err(e) => println!("! {e}"),
    }
    false
}

/// Read stdin on a plain thread; a blocked read must not hold up shutdown
fn spawn_console() -> Option<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(16);
    let spawned = std::thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        });

    match spawned {
        Ok(_) => Some(rx),
        Err(e) => {
            warn!(error = %e, "Operator console unavailable");
            None
        }
    }
}

async fn next_console_line(console: &mut Option<mpsc::Receiver<String>>) -> Option<String> {
    match console {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SensorName;
    use std::io::Write;

    const LINES: &str = concat!(
        r#"{"sensors":{"temperature":21.0,"moisture":40,"light":300,"co2":450,"timestamp":"T1"}}"#,
        "\n",
        "Starting PLC-1 collector\n",
        r#"{"sensors":{"temperature":23.0,"moisture":41,"light":310,"co2":455,"timestamp":"T2"}}"#,
        "\n",
    );

    fn session_config(replay: PathBuf, policy: OverridePolicy) -> SessionConfig {
        let mut config = DashboardConfig::default();
        config.overrides.policy = policy;
        config.display.poll_interval_ms = 10;
        SessionConfig {
            config,
            backend: TelemetryBackendConfig::default(),
            replay_path: Some(replay),
            timeout: Some(Duration::from_millis(200)),
            console: false,
        }
    }

    #[tokio::test]
    async fn test_replay_session_until_timeout() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LINES.as_bytes()).unwrap();

        let session = Session::new(session_config(
            file.path().to_path_buf(),
            OverridePolicy::Forward,
        ));
        let stats = session.run(std::future::pending()).await.unwrap();

        assert_eq!(stats.store.snapshots_accepted, 2);
        assert_eq!(stats.store.lines_rejected, 1);
        assert!(stats.frames_rendered > 0);
        assert!(stats.relay.is_some());
        assert_eq!(
            stats.readings.readings[&SensorName::Temperature].max(),
            23.0
        );
    }

    #[tokio::test]
    async fn test_shutdown_signal_stops_session() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LINES.as_bytes()).unwrap();

        let mut config = session_config(file.path().to_path_buf(), OverridePolicy::Local);
        config.timeout = None;
        let stats = Session::new(config)
            .run(tokio::time::sleep(Duration::from_millis(50)))
            .await
            .unwrap();

        assert!(stats.relay.is_none());
    }

    #[tokio::test]
    async fn test_missing_replay_file() {
        let session = Session::new(session_config(
            PathBuf::from("/nonexistent/replay.jsonl"),
            OverridePolicy::Local,
        ));
        let err = session.run(std::future::pending()).await.unwrap_err();
        assert!(err.downcast_ref::<CliError>().is_some());
    }

    #[test]
    fn test_console_line_handling() {
        let service = DashboardService::local(Arc::new(SnapshotStore::default()));
        assert!(!handle_console_line(&service, "set temp 30"));
        assert!(!handle_console_line(&service, "bogus"));
        assert!(!handle_console_line(&service, "   "));
        assert_eq!(
            service
                .effective_state()
                .unwrap()
                .sensors
                .get(SensorName::Temperature),
            30.0
        );
        assert!(handle_console_line(&service, "quit"));
    }
}
