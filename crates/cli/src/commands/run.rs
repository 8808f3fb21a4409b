//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use config_loader::{backend_from_env, ConfigLoader, DashboardConfig};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::session::{Session, SessionConfig};

/// Execute the `run` command
pub async fn run_dashboard(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let mut config = ConfigLoader::load_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_cli_overrides(&mut config, args);
    ConfigLoader::validate(&config).map_err(CliError::from)?;

    let backend = backend_from_env();
    if backend.token.is_none() {
        warn!("INFLUXDB_TOKEN is not set; the producer's telemetry writes may be rejected");
    }

    info!(
        program = %config.producer.program,
        args = ?config.producer.args,
        policy = ?config.overrides.policy,
        poll_interval_ms = config.display.poll_interval_ms,
        backend_url = %backend.url,
        bucket = %backend.bucket,
        replay = ?args.replay,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let session = Session::new(SessionConfig {
        config,
        backend,
        replay_path: args.replay.clone(),
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        console: !args.no_console,
    });

    let stats = session
        .run(setup_shutdown_signal())
        .await
        .context("Dashboard session failed")?;

    info!(
        snapshots = stats.readings.total_snapshots,
        frames_rendered = stats.frames_rendered,
        duration_secs = stats.duration.as_secs_f64(),
        "Dashboard stopped"
    );
    stats.print_summary();

    Ok(())
}

/// Apply command-line overrides on top of the loaded configuration
fn apply_cli_overrides(config: &mut DashboardConfig, args: &RunArgs) {
    if let Some(ref program) = args.producer {
        info!(program = %program, "Overriding producer program from CLI");
        config.producer.program = program.clone();
    }
    if !args.producer_args.is_empty() {
        info!(args = ?args.producer_args, "Overriding producer arguments from CLI");
        config.producer.args = args.producer_args.clone();
    }
    if let Some(policy) = args.policy {
        info!(policy = ?policy, "Overriding override policy from CLI");
        config.overrides.policy = policy.into();
    }
    if let Some(poll_ms) = args.poll_ms {
        info!(poll_ms, "Overriding poll interval from CLI");
        config.display.poll_interval_ms = poll_ms;
    }
}

/// Resolve on Ctrl+C or SIGTERM
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &DashboardConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Producer:");
    println!(
        "  Command: {} {}",
        config.producer.program,
        config.producer.args.join(" ")
    );
    if let Some(ref dir) = config.producer.working_dir {
        println!("  Working dir: {}", dir);
    }
    println!("  Shutdown timeout: {} ms", config.producer.shutdown_timeout_ms);
    println!("\nOverrides: {:?}", config.overrides.policy);
    println!(
        "Display: every {} ms, gauges {:?}",
        config.display.poll_interval_ms, config.display.gauges
    );
    println!();
}
