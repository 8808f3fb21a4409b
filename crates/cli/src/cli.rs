//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use contracts::OverridePolicy;

/// Greenhouse dashboard - live telemetry view with operator overrides
#[derive(Parser, Debug)]
#[command(
    name = "greenhouse-dash",
    author,
    version,
    about = "Greenhouse telemetry dashboard",
    long_about = "Runs the greenhouse telemetry producer, keeps the latest snapshot it \n\
                  reports, merges operator overrides into the displayed state and \n\
                  forwards override commands back to the producer."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "GREENHOUSE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (logs go to stderr)
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "GREENHOUSE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the dashboard
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults apply if absent
    #[arg(
        short,
        long,
        default_value = "greenhouse.toml",
        env = "GREENHOUSE_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the producer executable from configuration
    #[arg(long, env = "GREENHOUSE_PRODUCER")]
    pub producer: Option<String>,

    /// Override the producer arguments (repeatable)
    #[arg(long = "producer-arg", allow_hyphen_values = true)]
    pub producer_args: Vec<String>,

    /// Override where operator overrides take effect
    #[arg(long, value_enum, env = "GREENHOUSE_OVERRIDE_POLICY")]
    pub policy: Option<PolicyArg>,

    /// Override the display polling interval in milliseconds
    #[arg(long, env = "GREENHOUSE_POLL_MS")]
    pub poll_ms: Option<u64>,

    /// Read producer output recorded in a file instead of spawning the producer
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Stop after this many seconds (0 = until quit or signal)
    #[arg(long, default_value = "0", env = "GREENHOUSE_TIMEOUT")]
    pub timeout: u64,

    /// Do not read operator commands from stdin
    #[arg(long)]
    pub no_console: bool,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "GREENHOUSE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "greenhouse.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; defaults apply if absent
    #[arg(short, long, default_value = "greenhouse.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the environment handed to the producer
    #[arg(long)]
    pub env: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

/// Override policy as a CLI value
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyArg {
    /// Overrides only change what is displayed
    Local,
    /// Overrides are also sent to the producer
    Forward,
}

impl From<PolicyArg> for OverridePolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Local => OverridePolicy::Local,
            PolicyArg::Forward => OverridePolicy::Forward,
        }
    }
}
