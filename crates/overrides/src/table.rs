//! OverrideTable - at most one active override per sensor

use std::collections::BTreeMap;

use contracts::{ContractError, OverrideValue, SensorName, Snapshot};
use tracing::debug;

/// Active operator overrides
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideTable {
    active: BTreeMap<SensorName, OverrideValue>,
}

impl OverrideTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Force `sensor` to `value`, replacing any prior override
    pub fn set(&mut self, sensor: SensorName, value: f64) -> Result<(), ContractError> {
        self.set_value(sensor, OverrideValue::constant(value))
    }

    /// Impose any override kind on `sensor`, replacing any prior override
    ///
    /// # Errors
    /// Non-finite values are rejected and the table is left unchanged.
    pub fn set_value(
        &mut self,
        sensor: SensorName,
        value: OverrideValue,
    ) -> Result<(), ContractError> {
        if !value.is_finite() {
            return Err(ContractError::invalid_override(
                sensor.as_str(),
                "value must be a finite number",
            ));
        }
        let previous = self.active.insert(sensor, value);
        debug!(sensor = %sensor, value = ?value, previous = ?previous, "Override set");
        Ok(())
    }

    /// Remove the override on `sensor`, returning it if one was active
    pub fn clear(&mut self, sensor: SensorName) -> Option<OverrideValue> {
        let removed = self.active.remove(&sensor);
        debug!(sensor = %sensor, removed = removed.is_some(), "Override cleared");
        removed
    }

    /// Active override for `sensor`
    pub fn get(&self, sensor: SensorName) -> Option<OverrideValue> {
        self.active.get(&sensor).copied()
    }

    /// Active overrides in sensor order
    pub fn iter(&self) -> impl Iterator<Item = (SensorName, OverrideValue)> + '_ {
        self.active.iter().map(|(s, v)| (*s, *v))
    }

    /// Number of active overrides
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// True when no override is active
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Effective state: `snapshot` with every overridden sensor replaced
    ///
    /// Pure; the input is not modified.
    pub fn apply(&self, snapshot: &Snapshot) -> Snapshot {
        let mut effective = snapshot.clone();
        for (sensor, value) in &self.active {
            let raw = snapshot.sensors.get(*sensor);
            effective.sensors.set(*sensor, value.resolve(raw));
        }
        effective
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ActuatorName, ActuatorValue, Alert};

    fn snapshot() -> Snapshot {
        serde_json::from_str(
            r#"{"sensors":{"temperature":22.5,"moisture":40,"light":300,"co2":450,"timestamp":"T1"},
                "actuators":{"heater_pct":10},
                "alerts":{"co2":{"value":450,"status":"ALERT"}}}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_table_is_identity() {
        let table = OverrideTable::new();
        let raw = snapshot();
        assert_eq!(table.apply(&raw), raw);
    }

    #[test]
    fn test_set_then_clear_temperature() {
        let raw = snapshot();
        let mut table = OverrideTable::new();

        table.set(SensorName::Temperature, 99.0).unwrap();
        assert_eq!(table.apply(&raw).sensors.temperature, 99.0);

        assert_eq!(
            table.clear(SensorName::Temperature),
            Some(OverrideValue::constant(99.0))
        );
        assert_eq!(table.apply(&raw).sensors.temperature, 22.5);
    }

    #[test]
    fn test_apply_is_pure() {
        let raw = snapshot();
        let before = raw.clone();
        let mut table = OverrideTable::new();
        table.set(SensorName::Co2, 1500.0).unwrap();

        let first = table.apply(&raw);
        let second = table.apply(&raw);
        assert_eq!(first, second);
        assert_eq!(raw, before);
    }

    #[test]
    fn test_only_sensors_are_overridden() {
        let raw = snapshot();
        let mut table = OverrideTable::new();
        for sensor in SensorName::ALL {
            table.set(sensor, 1.0).unwrap();
        }
        let effective = table.apply(&raw);

        assert_eq!(effective.sensors.timestamp, "T1");
        assert_eq!(
            effective.actuators.get(&ActuatorName::Heater),
            Some(&ActuatorValue::Percent(10.0))
        );
        assert_eq!(
            effective.alerts.get("co2"),
            Some(&Alert {
                value: 450.0,
                status: "ALERT".to_string(),
                target: None
            })
        );
    }

    #[test]
    fn test_new_override_replaces_prior() {
        let mut table = OverrideTable::new();
        table.set(SensorName::Light, 100.0).unwrap();
        table
            .set_value(SensorName::Light, OverrideValue::range(400.0, 600.0))
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.apply(&snapshot()).sensors.light, 400.0);
    }

    #[test]
    fn test_zero_override_differs_from_cleared() {
        let raw = snapshot();
        let mut table = OverrideTable::new();
        table.set(SensorName::Moisture, 0.0).unwrap();
        assert_eq!(table.apply(&raw).sensors.moisture, 0.0);
        table.clear(SensorName::Moisture);
        assert_eq!(table.apply(&raw).sensors.moisture, 40.0);
    }

    #[test]
    fn test_clear_missing_is_noop() {
        let mut table = OverrideTable::new();
        assert_eq!(table.clear(SensorName::Co2), None);
        assert!(table.is_empty());
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut table = OverrideTable::new();
        assert!(table.set(SensorName::Temperature, f64::NAN).is_err());
        assert!(table
            .set_value(SensorName::Temperature, OverrideValue::range(0.0, f64::INFINITY))
            .is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_overrides_survive_snapshot_replacement() {
        let mut table = OverrideTable::new();
        table.set(SensorName::Temperature, 30.0).unwrap();

        let mut next = snapshot();
        next.sensors.temperature = 18.0;
        next.sensors.timestamp = "T2".to_string();

        let effective = table.apply(&next);
        assert_eq!(effective.sensors.temperature, 30.0);
        assert_eq!(effective.sensors.timestamp, "T2");
    }
}
