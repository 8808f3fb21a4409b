//! Command line encoding

use contracts::Command;

use crate::error::RelayError;

/// Encode a command as one JSON object followed by `\n`
///
/// The result is written with a single write so lines never interleave.
pub fn encode_line(command: &Command) -> Result<Vec<u8>, RelayError> {
    let mut line = serde_json::to_vec(command)?;
    line.push(b'\n');
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{OverrideValue, SensorName};

    #[test]
    fn test_encode_override_line() {
        let line = encode_line(&Command::set(
            SensorName::Co2,
            OverrideValue::constant(1500.0),
        ))
        .unwrap();
        assert_eq!(line.last(), Some(&b'\n'));
        assert_eq!(line.iter().filter(|b| **b == b'\n').count(), 1);

        let parsed: serde_json::Value = serde_json::from_slice(&line[..line.len() - 1]).unwrap();
        assert_eq!(parsed["type"], "override");
        assert_eq!(parsed["sensor"], "co2");
        assert_eq!(parsed["value"], 1500.0);
    }

    #[test]
    fn test_encode_range_line() {
        let line = encode_line(&Command::set(
            SensorName::Temperature,
            OverrideValue::range(27.0, 20.0),
        ))
        .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&line).unwrap();
        assert_eq!(parsed["type"], "override_range");
        assert_eq!(parsed["min"], 20.0);
        assert_eq!(parsed["max"], 27.0);
    }
}
