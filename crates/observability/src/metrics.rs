//! Snapshot metrics
//!
//! Gauges for the latest readings and an in-memory session summary.

use std::collections::BTreeMap;

use contracts::{SensorName, Snapshot};
use metrics::{counter, gauge};

/// Publish the readings of one snapshot
pub fn record_snapshot(snapshot: &Snapshot) {
    for sensor in SensorName::ALL {
        gauge!("greenhouse_sensor_value", "sensor" => sensor.as_str())
            .set(snapshot.sensors.get(sensor));
    }

    for (actuator, value) in &snapshot.actuators {
        if let Some(pct) = value.as_percent() {
            gauge!("greenhouse_actuator_pct", "actuator" => actuator.label()).set(pct);
        }
    }

    gauge!("greenhouse_alerts_active").set(snapshot.alerts.len() as f64);
}

/// Count one display refresh
pub fn record_frame_rendered(stale: bool) {
    counter!("greenhouse_frames_rendered_total").increment(1);
    gauge!("greenhouse_store_stale").set(if stale { 1.0 } else { 0.0 });
}

/// Per-sensor statistics over the distinct snapshots seen in a session
#[derive(Debug, Clone, Default)]
pub struct ReadingStatsAggregator {
    /// Distinct snapshots counted
    pub total_snapshots: u64,

    /// Snapshots carrying at least one alert
    pub snapshots_with_alerts: u64,

    /// Reading statistics per sensor
    pub readings: BTreeMap<SensorName, RunningStats>,

    /// How often each alert category fired
    pub alert_counts: BTreeMap<String, u64>,

    last_timestamp: Option<String>,
}

impl ReadingStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in a snapshot; repeats of the previous timestamp are ignored
    ///
    /// Returns true when the snapshot was counted.
    pub fn update(&mut self, snapshot: &Snapshot) -> bool {
        let timestamp = &snapshot.sensors.timestamp;
        if timestamp.is_empty() || self.last_timestamp.as_deref() == Some(timestamp.as_str()) {
            return false;
        }
        self.last_timestamp = Some(timestamp.clone());

        self.total_snapshots += 1;
        for sensor in SensorName::ALL {
            self.readings
                .entry(sensor)
                .or_default()
                .push(snapshot.sensors.get(sensor));
        }

        if !snapshot.alerts.is_empty() {
            self.snapshots_with_alerts += 1;
            for category in snapshot.alerts.keys() {
                *self.alert_counts.entry(category.clone()).or_insert(0) += 1;
            }
        }
        true
    }

    /// Build the summary report
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            total_snapshots: self.total_snapshots,
            alert_rate: if self.total_snapshots > 0 {
                self.snapshots_with_alerts as f64 / self.total_snapshots as f64 * 100.0
            } else {
                0.0
            },
            readings: self
                .readings
                .iter()
                .map(|(sensor, stats)| (*sensor, StatsSummary::from(stats)))
                .collect(),
            alert_counts: self.alert_counts.clone(),
        }
    }
}

/// Session summary
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    pub total_snapshots: u64,
    pub alert_rate: f64,
    pub readings: BTreeMap<SensorName, StatsSummary>,
    pub alert_counts: BTreeMap<String, u64>,
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Session Summary ===")?;
        writeln!(f, "Snapshots: {}", self.total_snapshots)?;
        writeln!(f, "With alerts: {:.2}%", self.alert_rate)?;
        for (sensor, stats) in &self.readings {
            writeln!(f, "{} ({}): {}", sensor, sensor.unit(), stats)?;
        }
        if !self.alert_counts.is_empty() {
            writeln!(f, "Alert counts:")?;
            for (category, count) in &self.alert_counts {
                writeln!(f, "  {}: {}", category, count)?;
            }
        }
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.2}, max={:.2}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
