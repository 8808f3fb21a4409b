//! Operator overrides and the command lines relayed to the producer.

use serde::{Deserialize, Serialize};

use crate::SensorName;

/// Operator-imposed value for one sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverrideValue {
    /// Force the reading to a fixed value
    Constant { value: f64 },

    /// Keep the reading inside `[min, max]`
    Range { min: f64, max: f64 },
}

impl OverrideValue {
    /// Constant override
    pub fn constant(value: f64) -> Self {
        Self::Constant { value }
    }

    /// Range override; bounds given in reverse order are swapped
    pub fn range(min: f64, max: f64) -> Self {
        if min > max {
            Self::Range { min: max, max: min }
        } else {
            Self::Range { min, max }
        }
    }

    /// Effective reading given the raw producer reading
    pub fn resolve(&self, raw: f64) -> f64 {
        match *self {
            Self::Constant { value } => value,
            // max/min instead of clamp: clamp panics on NaN bounds
            Self::Range { min, max } => raw.max(min).min(max),
        }
    }

    /// True if every bound is a finite number
    pub fn is_finite(&self) -> bool {
        match *self {
            Self::Constant { value } => value.is_finite(),
            Self::Range { min, max } => min.is_finite() && max.is_finite(),
        }
    }
}

/// Control command, one JSON object per line on the producer's stdin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// `{"type":"override","sensor":..,"value":..}`
    Override { sensor: SensorName, value: f64 },

    /// `{"type":"override_range","sensor":..,"min":..,"max":..}`
    OverrideRange {
        sensor: SensorName,
        min: f64,
        max: f64,
    },

    /// `{"type":"clear_override","sensor":..}`
    ClearOverride { sensor: SensorName },
}

impl Command {
    /// Build the command that imposes `value` on `sensor`
    pub fn set(sensor: SensorName, value: OverrideValue) -> Self {
        match value {
            OverrideValue::Constant { value } => Self::Override { sensor, value },
            OverrideValue::Range { min, max } => Self::OverrideRange { sensor, min, max },
        }
    }

    /// Build the command that clears any override on `sensor`
    pub fn clear(sensor: SensorName) -> Self {
        Self::ClearOverride { sensor }
    }

    /// Sensor targeted by this command
    pub fn sensor(&self) -> SensorName {
        match self {
            Self::Override { sensor, .. }
            | Self::OverrideRange { sensor, .. }
            | Self::ClearOverride { sensor } => *sensor,
        }
    }

    /// Wire type tag
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Override { .. } => "override",
            Self::OverrideRange { .. } => "override_range",
            Self::ClearOverride { .. } => "clear_override",
        }
    }
}
