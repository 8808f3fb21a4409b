//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use config_loader::{ConfigLoader, DashboardConfig};
use contracts::{OverridePolicy, TelemetryBackendConfig};

use crate::cli::ValidateArgs;
use crate::error::CliError;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    producer: String,
    policy: OverridePolicy,
    poll_interval_ms: u64,
    queue_capacity: usize,
    max_line_bytes: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args, &config_loader::backend_from_env());

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs, backend: &TelemetryBackendConfig) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(CliError::config_not_found(&args.config).to_string()),
            warnings: None,
            summary: None,
        };
    }

    match ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config, backend);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    producer: format!(
                        "{} {}",
                        config.producer.program,
                        config.producer.args.join(" ")
                    )
                    .trim_end()
                    .to_string(),
                    policy: config.overrides.policy,
                    poll_interval_ms: config.display.poll_interval_ms,
                    queue_capacity: config.relay.queue_capacity,
                    max_line_bytes: config.stream.max_line_bytes,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &DashboardConfig, backend: &TelemetryBackendConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.overrides.policy == OverridePolicy::Local {
        warnings.push("overrides.policy is 'local' - the producer will never see overrides".to_string());
    }

    if config.stream.read_buffer_bytes > config.stream.max_line_bytes {
        warnings.push(
            "stream.read_buffer_bytes exceeds stream.max_line_bytes - one read may hold several oversized lines"
                .to_string(),
        );
    }

    if config.display.poll_interval_ms < 50 {
        warnings.push(format!(
            "display.poll_interval_ms is {} - the display will mostly redraw unchanged data",
            config.display.poll_interval_ms
        ));
    }

    if backend.token.is_none() {
        warnings.push("INFLUXDB_TOKEN is not set - producer writes may be rejected".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Producer: {}", summary.producer);
            println!("  Override policy: {:?}", summary.policy);
            println!("  Poll interval: {} ms", summary.poll_interval_ms);
            println!("  Relay queue: {}", summary.queue_capacity);
            println!("  Max line: {} bytes", summary.max_line_bytes);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
