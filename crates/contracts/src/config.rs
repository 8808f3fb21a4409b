//! DashboardConfig - Config Loader output
//!
//! Describes the producer process, stream framing, override policy, relay and
//! display settings. Every section is optional and falls back to defaults.

use serde::{Deserialize, Serialize};

use crate::SensorName;

/// Complete dashboard configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Producer process settings
    #[serde(default)]
    pub producer: ProducerConfig,

    /// Producer stdout framing
    #[serde(default)]
    pub stream: StreamConfig,

    /// Override handling
    #[serde(default)]
    pub overrides: OverrideConfig,

    /// Command relay settings
    #[serde(default)]
    pub relay: RelayConfig,

    /// Display polling and gauge scaling
    #[serde(default)]
    pub display: DisplayConfig,
}

/// How the producer process is launched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducerConfig {
    /// Executable to spawn
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments passed to the executable
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Working directory (inherits ours when absent)
    #[serde(default)]
    pub working_dir: Option<String>,

    /// How long to wait for the killed process to be reaped
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
}

fn default_program() -> String {
    "python3".to_string()
}

fn default_args() -> Vec<String> {
    vec!["-u".to_string(), "plc1_collector.py".to_string()]
}

fn default_shutdown_timeout_ms() -> u64 {
    2000
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            working_dir: None,
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
        }
    }
}

/// Line framing of the producer's output stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Lines longer than this are dropped
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,

    /// Size of each read from the stream
    #[serde(default = "default_read_buffer_bytes")]
    pub read_buffer_bytes: usize,

    /// What to do with an unterminated tail at end of stream
    #[serde(default)]
    pub partial_line_policy: PartialLinePolicy,
}

fn default_max_line_bytes() -> usize {
    64 * 1024
}

fn default_read_buffer_bytes() -> usize {
    8 * 1024
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_line_bytes: default_max_line_bytes(),
            read_buffer_bytes: default_read_buffer_bytes(),
            partial_line_policy: PartialLinePolicy::default(),
        }
    }
}

/// Handling of trailing bytes without a line terminator at end of stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialLinePolicy {
    /// Drop the fragment
    #[default]
    Discard,
    /// Treat the fragment as a final line
    FlushOnEof,
}

/// Override handling
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverrideConfig {
    /// Whether overrides stay local or are also sent to the producer
    #[serde(default)]
    pub policy: OverridePolicy,
}

/// Where operator overrides take effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverridePolicy {
    /// Applied to the effective state only
    Local,
    /// Applied locally and forwarded to the producer
    #[default]
    Forward,
}

/// Command relay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Pending commands before new ones are dropped
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    64
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Polling interval of the display loop
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Full-scale value of each sensor gauge
    #[serde(default)]
    pub gauges: GaugeScale,
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            gauges: GaugeScale::default(),
        }
    }
}

/// Full-scale values used to turn readings into gauge percentages
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaugeScale {
    pub temperature: f64,
    pub moisture: f64,
    pub light: f64,
    pub co2: f64,
}

impl GaugeScale {
    /// Full-scale value for one sensor
    pub fn full_scale(&self, sensor: SensorName) -> f64 {
        match sensor {
            SensorName::Temperature => self.temperature,
            SensorName::Moisture => self.moisture,
            SensorName::Light => self.light,
            SensorName::Co2 => self.co2,
        }
    }
}

impl Default for GaugeScale {
    fn default() -> Self {
        Self {
            temperature: 50.0,
            moisture: 100.0,
            light: 1000.0,
            co2: 1000.0,
        }
    }
}

/// External telemetry backend settings
///
/// Opaque to the dashboard; handed to the producer through its environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryBackendConfig {
    pub url: String,
    pub org: String,
    pub bucket: String,
    pub token: Option<String>,
}

impl Default for TelemetryBackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8086".to_string(),
            org: "SUTD".to_string(),
            bucket: "greenhouse".to_string(),
            token: None,
        }
    }
}

impl TelemetryBackendConfig {
    /// Environment variables exported to the producer
    pub fn env_vars(&self) -> Vec<(&'static str, String)> {
        let mut vars = vec![
            ("INFLUXDB_URL", self.url.clone()),
            ("INFLUXDB_ORG", self.org.clone()),
            ("INFLUXDB_BUCKET", self.bucket.clone()),
        ];
        if let Some(ref token) = self.token {
            vars.push(("INFLUXDB_TOKEN", token.clone()));
        }
        vars
    }
}
