//! Sensor identifiers and the sensor half of a snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ContractError;

/// Greenhouse sensor
///
/// Each sensor is owned by one PLC in the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorName {
    Temperature,
    Moisture,
    Light,
    Co2,
}

impl SensorName {
    /// All sensors, in panel order
    pub const ALL: [SensorName; 4] = [
        SensorName::Temperature,
        SensorName::Moisture,
        SensorName::Light,
        SensorName::Co2,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Moisture => "moisture",
            Self::Light => "light",
            Self::Co2 => "co2",
        }
    }

    /// Display unit
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Moisture => "%",
            Self::Light => "lux",
            Self::Co2 => "ppm",
        }
    }
}

impl fmt::Display for SensorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorName {
    type Err = ContractError;

    /// Accepts the wire names plus the aliases the producer understands.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "temperature" | "temp" => Ok(Self::Temperature),
            "moisture" | "moist" | "irrigation" => Ok(Self::Moisture),
            "light" => Ok(Self::Light),
            "co2" | "carbon" | "carbon_dioxide" => Ok(Self::Co2),
            other => Err(ContractError::UnknownSensor {
                name: other.to_string(),
            }),
        }
    }
}

/// Sensor readings of one snapshot
///
/// All five keys are required on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings {
    /// Air temperature (°C)
    pub temperature: f64,

    /// Soil moisture (%)
    pub moisture: f64,

    /// Light level (lux)
    pub light: f64,

    /// CO₂ concentration (ppm)
    pub co2: f64,

    /// Producer wall-clock marker, monotonically non-decreasing
    pub timestamp: String,
}

impl SensorReadings {
    /// Reading for one sensor
    pub fn get(&self, sensor: SensorName) -> f64 {
        match sensor {
            SensorName::Temperature => self.temperature,
            SensorName::Moisture => self.moisture,
            SensorName::Light => self.light,
            SensorName::Co2 => self.co2,
        }
    }

    /// Replace the reading for one sensor
    pub fn set(&mut self, sensor: SensorName, value: f64) {
        match sensor {
            SensorName::Temperature => self.temperature = value,
            SensorName::Moisture => self.moisture = value,
            SensorName::Light => self.light = value,
            SensorName::Co2 => self.co2 = value,
        }
    }
}

impl Default for SensorReadings {
    /// Baseline before any PLC has reported
    fn default() -> Self {
        Self {
            temperature: 0.0,
            moisture: 0.0,
            light: 0.0,
            co2: 0.0,
            timestamp: String::new(),
        }
    }
}
