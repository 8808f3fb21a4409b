//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use config_loader::{backend_from_env, ConfigLoader, DashboardConfig};
use contracts::{GaugeScale, OverridePolicy, PartialLinePolicy, SensorName, TelemetryBackendConfig};

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    source: String,
    producer: ProducerInfo,
    stream: StreamInfo,
    policy: OverridePolicy,
    queue_capacity: usize,
    poll_interval_ms: u64,
    gauges: GaugeScale,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    environment: Vec<EnvInfo>,
}

#[derive(Serialize)]
struct ProducerInfo {
    program: String,
    args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    working_dir: Option<String>,
    shutdown_timeout_ms: u64,
}

#[derive(Serialize)]
struct StreamInfo {
    max_line_bytes: usize,
    read_buffer_bytes: usize,
    partial_line_policy: PartialLinePolicy,
}

#[derive(Serialize)]
struct EnvInfo {
    name: &'static str,
    value: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let config = ConfigLoader::load_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    let source = if args.config.exists() {
        args.config.display().to_string()
    } else {
        "(defaults)".to_string()
    };
    let backend = backend_from_env();

    let info = build_config_info(&config, &backend, source, args);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(
    config: &DashboardConfig,
    backend: &TelemetryBackendConfig,
    source: String,
    args: &InfoArgs,
) -> ConfigInfo {
    let environment = if args.env {
        backend
            .env_vars()
            .into_iter()
            .map(|(name, value)| EnvInfo {
                name,
                value: if name == "INFLUXDB_TOKEN" {
                    "********".to_string()
                } else {
                    value
                },
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        source,
        producer: ProducerInfo {
            program: config.producer.program.clone(),
            args: config.producer.args.clone(),
            working_dir: config.producer.working_dir.clone(),
            shutdown_timeout_ms: config.producer.shutdown_timeout_ms,
        },
        stream: StreamInfo {
            max_line_bytes: config.stream.max_line_bytes,
            read_buffer_bytes: config.stream.read_buffer_bytes,
            partial_line_policy: config.stream.partial_line_policy,
        },
        policy: config.overrides.policy,
        queue_capacity: config.relay.queue_capacity,
        poll_interval_ms: config.display.poll_interval_ms,
        gauges: config.display.gauges,
        environment,
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Greenhouse Dashboard Configuration             ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📄 Source: {}", info.source);

    println!("\n🌱 Producer");
    println!(
        "   ├─ Command: {} {}",
        info.producer.program,
        info.producer.args.join(" ")
    );
    if let Some(ref dir) = info.producer.working_dir {
        println!("   ├─ Working dir: {}", dir);
    }
    println!("   └─ Shutdown timeout: {} ms", info.producer.shutdown_timeout_ms);

    println!("\n📥 Stream");
    println!("   ├─ Max line: {} bytes", info.stream.max_line_bytes);
    println!("   ├─ Read buffer: {} bytes", info.stream.read_buffer_bytes);
    println!("   └─ Partial line: {:?}", info.stream.partial_line_policy);

    println!("\n🎛  Overrides");
    println!("   ├─ Policy: {:?}", info.policy);
    println!("   └─ Relay queue: {}", info.queue_capacity);

    println!("\n📊 Display (every {} ms)", info.poll_interval_ms);
    for (i, sensor) in SensorName::ALL.iter().enumerate() {
        let prefix = if i == SensorName::ALL.len() - 1 {
            "└─"
        } else {
            "├─"
        };
        println!(
            "   {} {}: 0..{} {}",
            prefix,
            sensor,
            info.gauges.full_scale(*sensor),
            sensor.unit()
        );
    }

    if !info.environment.is_empty() {
        println!("\n🔑 Producer environment");
        for (i, var) in info.environment.iter().enumerate() {
            let prefix = if i == info.environment.len() - 1 {
                "└─"
            } else {
                "├─"
            };
            println!("   {} {}={}", prefix, var.name, var.value);
        }
    }

    println!();
}
