//! Snapshot - producer output
//!
//! One complete telemetry record: sensors, actuators and alerts at one instant.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{SensorName, SensorReadings};

/// Telemetry snapshot
///
/// Immutable once constructed; the store replaces whole snapshots and never
/// edits one in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Sensor readings (required on the wire)
    pub sensors: SensorReadings,

    /// Actuator outputs
    #[serde(default)]
    pub actuators: BTreeMap<ActuatorName, ActuatorValue>,

    /// Out-of-range conditions, keyed by category; empty means all normal
    #[serde(default)]
    pub alerts: BTreeMap<String, Alert>,
}

/// Actuator driven by one of the PLCs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActuatorName {
    #[serde(rename = "heater_pct")]
    Heater,
    #[serde(rename = "cooler_pct")]
    Cooler,
    #[serde(rename = "pump_pct")]
    Pump,
    #[serde(rename = "drain_pct")]
    Drain,
    #[serde(rename = "lamp_pct")]
    Lamp,
    #[serde(rename = "shutter_pct")]
    Shutter,
    #[serde(rename = "co2_pump_pct")]
    Co2Pump,
    #[serde(rename = "co2_vent_pct")]
    Co2Vent,
}

impl ActuatorName {
    /// The two actuators controlling a sensor, in panel order
    pub fn for_sensor(sensor: SensorName) -> [ActuatorName; 2] {
        match sensor {
            SensorName::Temperature => [Self::Heater, Self::Cooler],
            SensorName::Moisture => [Self::Pump, Self::Drain],
            SensorName::Light => [Self::Lamp, Self::Shutter],
            SensorName::Co2 => [Self::Co2Pump, Self::Co2Vent],
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Heater => "Heater",
            Self::Cooler => "Cooler",
            Self::Pump => "Pump",
            Self::Drain => "Drain",
            Self::Lamp => "Lamp",
            Self::Shutter => "Shutter",
            Self::Co2Pump => "CO₂ Pump",
            Self::Co2Vent => "Vent",
        }
    }
}

/// Actuator output: a percentage in [0, 100] or a discrete level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActuatorValue {
    Percent(f64),
    Label(ActuatorLabel),
}

impl ActuatorValue {
    /// Percentage, if numeric
    pub fn as_percent(&self) -> Option<f64> {
        match self {
            Self::Percent(p) => Some(*p),
            Self::Label(_) => None,
        }
    }
}

impl fmt::Display for ActuatorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent(p) => write!(f, "{:.0}%", p),
            Self::Label(label) => write!(f, "{}", label),
        }
    }
}

/// Discrete actuator level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActuatorLabel {
    High,
    Low,
    Off,
}

impl fmt::Display for ActuatorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "HIGH",
            Self::Low => "LOW",
            Self::Off => "OFF",
        };
        f.write_str(s)
    }
}

/// Out-of-range condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Offending reading
    pub value: f64,

    /// Status label (e.g. "ALERT")
    pub status: String,

    /// PLC responsible for correcting the condition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}
