//! Plain-text display of one frame

use std::fmt::Write;

use contracts::{ActuatorName, GaugeScale, OverrideValue, SensorName, Snapshot};

use crate::service::DisplayFrame;

/// Gauge fill for `value` on a `[0, full_scale]` dial, in whole percent
///
/// Truncated toward zero and clamped to `[0, 100]`; a non-positive full
/// scale reads 0.
pub fn gauge_percent(value: f64, full_scale: f64) -> u8 {
    if full_scale.is_nan() || full_scale <= 0.0 || !value.is_finite() {
        return 0;
    }
    (value / full_scale * 100.0).clamp(0.0, 100.0) as u8
}

/// Text renderer
#[derive(Debug, Clone)]
pub struct DashboardView {
    gauges: GaugeScale,
}

impl DashboardView {
    pub fn new(gauges: GaugeScale) -> Self {
        Self { gauges }
    }

    /// Render a full frame: header, sensor panels, alerts, status line
    pub fn render(&self, frame: &DisplayFrame) -> String {
        let mut out = String::new();

        match &frame.state {
            Ok(snapshot) => {
                self.render_header(&mut out, &snapshot.sensors.timestamp);
                for sensor in SensorName::ALL {
                    let active = frame
                        .overrides
                        .iter()
                        .find(|(s, _)| *s == sensor)
                        .map(|(_, v)| *v);
                    self.render_sensor(&mut out, snapshot, sensor, active);
                }
                render_alerts(&mut out, snapshot);
            }
            Err(e) => {
                self.render_header(&mut out, "");
                for sensor in SensorName::ALL {
                    let _ = writeln!(out, "{:<12} {:>9}", sensor_label(sensor), "--");
                }
                let _ = writeln!(out, "Alerts");
                let _ = writeln!(out, "  Error: {e}");
            }
        }

        if let Some(reason) = &frame.store.stale_reason {
            let _ = writeln!(out, "STALE: {reason}");
        } else if frame.store.received_at.is_none() {
            let _ = writeln!(out, "Waiting for producer data...");
        }
        if let Some(err) = &frame.store.last_error {
            let _ = writeln!(out, "Last rejected line: {err}");
        }

        out
    }

    fn render_header(&self, out: &mut String, timestamp: &str) {
        let shown = if timestamp.is_empty() { "--" } else { timestamp };
        let _ = writeln!(out, "Greenhouse  [{shown}]");
    }

    fn render_sensor(
        &self,
        out: &mut String,
        snapshot: &Snapshot,
        sensor: SensorName,
        active: Option<OverrideValue>,
    ) {
        let value = snapshot.sensors.get(sensor);
        let pct = gauge_percent(value, self.gauges.full_scale(sensor));
        let marker = match active {
            Some(OverrideValue::Constant { .. }) => " (override)",
            Some(OverrideValue::Range { .. }) => " (range)",
            None => "",
        };
        let _ = write!(
            out,
            "{:<12} {:>9.1} {:<4} {:>3}%{marker} ",
            sensor_label(sensor),
            value,
            sensor.unit(),
            pct
        );

        let [a, b] = ActuatorName::for_sensor(sensor);
        for actuator in [a, b] {
            let shown = snapshot
                .actuators
                .get(&actuator)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "--".to_string());
            let _ = write!(out, " | {} {}", actuator.label(), shown);
        }
        out.push('\n');
    }
}

fn render_alerts(out: &mut String, snapshot: &Snapshot) {
    let _ = writeln!(out, "Alerts");
    if snapshot.alerts.is_empty() {
        let _ = writeln!(out, "  All normal");
        return;
    }
    for (category, alert) in &snapshot.alerts {
        let _ = writeln!(out, "  - {}: {} -> {}", category, alert.value, alert.status);
    }
}

fn sensor_label(sensor: SensorName) -> &'static str {
    match sensor {
        SensorName::Temperature => "Temperature",
        SensorName::Moisture => "Moisture",
        SensorName::Light => "Light",
        SensorName::Co2 => "CO2",
    }
}
