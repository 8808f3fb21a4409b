//! Configuration validation
//!
//! Rules:
//! - producer program is not empty
//! - stream sizes are > 0
//! - relay queue capacity is > 0
//! - display poll interval is > 0
//! - every gauge full-scale value is finite and > 0

use contracts::{ContractError, DashboardConfig, SensorName};

/// Validate a DashboardConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &DashboardConfig) -> Result<(), ContractError> {
    validate_producer(config)?;
    validate_stream(config)?;
    validate_relay(config)?;
    validate_display(config)?;
    Ok(())
}

fn validate_producer(config: &DashboardConfig) -> Result<(), ContractError> {
    if config.producer.program.trim().is_empty() {
        return Err(ContractError::config_validation(
            "producer.program",
            "program cannot be empty",
        ));
    }
    Ok(())
}

fn validate_stream(config: &DashboardConfig) -> Result<(), ContractError> {
    if config.stream.max_line_bytes == 0 {
        return Err(ContractError::config_validation(
            "stream.max_line_bytes",
            "max_line_bytes must be > 0",
        ));
    }
    if config.stream.read_buffer_bytes == 0 {
        return Err(ContractError::config_validation(
            "stream.read_buffer_bytes",
            "read_buffer_bytes must be > 0",
        ));
    }
    Ok(())
}

fn validate_relay(config: &DashboardConfig) -> Result<(), ContractError> {
    if config.relay.queue_capacity == 0 {
        return Err(ContractError::config_validation(
            "relay.queue_capacity",
            "queue_capacity must be > 0",
        ));
    }
    Ok(())
}

fn validate_display(config: &DashboardConfig) -> Result<(), ContractError> {
    if config.display.poll_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "display.poll_interval_ms",
            "poll_interval_ms must be > 0",
        ));
    }

    for sensor in SensorName::ALL {
        let full_scale = config.display.gauges.full_scale(sensor);
        if !full_scale.is_finite() || full_scale <= 0.0 {
            return Err(ContractError::config_validation(
                format!("display.gauges.{}", sensor),
                format!("full-scale value must be > 0, got {}", full_scale),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&DashboardConfig::default()).is_ok());
    }

    #[test]
    fn test_empty_program_rejected() {
        let mut config = DashboardConfig::default();
        config.producer.program = "  ".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("producer.program"));
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let mut config = DashboardConfig::default();
        config.stream.max_line_bytes = 0;
        assert!(validate(&config).is_err());

        let mut config = DashboardConfig::default();
        config.relay.queue_capacity = 0;
        assert!(validate(&config).is_err());

        let mut config = DashboardConfig::default();
        config.display.poll_interval_ms = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_gauge_scale_rejected() {
        let mut config = DashboardConfig::default();
        config.display.gauges.co2 = 0.0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("display.gauges.co2"));

        let mut config = DashboardConfig::default();
        config.display.gauges.light = f64::NAN;
        assert!(validate(&config).is_err());
    }
}
