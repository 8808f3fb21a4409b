//! Telemetry backend settings from the environment
//!
//! `INFLUXDB_*` variables take precedence over the shorter `INFLUX_*` aliases.

use contracts::TelemetryBackendConfig;

/// Read backend settings from the process environment
pub fn backend_from_env() -> TelemetryBackendConfig {
    backend_from_lookup(|key| std::env::var(key).ok())
}

/// Read backend settings through an arbitrary lookup
pub fn backend_from_lookup<F>(lookup: F) -> TelemetryBackendConfig
where
    F: Fn(&str) -> Option<String>,
{
    let read = |primary: &str, alias: &str| {
        lookup(primary)
            .filter(|v| !v.is_empty())
            .or_else(|| lookup(alias).filter(|v| !v.is_empty()))
    };

    let defaults = TelemetryBackendConfig::default();
    TelemetryBackendConfig {
        url: read("INFLUXDB_URL", "INFLUX_URL").unwrap_or(defaults.url),
        org: read("INFLUXDB_ORG", "INFLUX_ORG").unwrap_or(defaults.org),
        bucket: read("INFLUXDB_BUCKET", "INFLUX_BUCKET").unwrap_or(defaults.bucket),
        token: read("INFLUXDB_TOKEN", "INFLUX_TOKEN"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let backend = backend_from_lookup(lookup_from(&[]));
        assert_eq!(backend, TelemetryBackendConfig::default());
    }

    #[test]
    fn test_primary_beats_alias() {
        let backend = backend_from_lookup(lookup_from(&[
            ("INFLUXDB_URL", "http://influx:8086"),
            ("INFLUX_URL", "http://other:8086"),
            ("INFLUX_TOKEN", "secret"),
            ("INFLUXDB_ORG", ""),
            ("INFLUX_ORG", "greenhouse-lab"),
        ]));
        assert_eq!(backend.url, "http://influx:8086");
        assert_eq!(backend.token.as_deref(), Some("secret"));
        assert_eq!(backend.org, "greenhouse-lab");
        assert_eq!(backend.bucket, "greenhouse");
    }
}
