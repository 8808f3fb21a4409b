//! Operator console commands
//!
//! ```text
//! set <sensor> <value>
//! range <sensor> <min> <max>
//! clear <sensor>
//! status
//! help
//! quit
//! ```

use std::fmt::Write;
use std::str::FromStr;

use contracts::{OverrideValue, SensorName};

use crate::error::{ConsoleError, DashboardError};
use crate::service::DashboardService;

/// One parsed console line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperatorCommand {
    Set { sensor: SensorName, value: f64 },
    Range { sensor: SensorName, min: f64, max: f64 },
    Clear { sensor: SensorName },
    Status,
    Help,
    Quit,
}

/// Result of executing a console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleReply {
    Message(String),
    Quit,
}

pub const HELP: &str = "commands: set <sensor> <value> | range <sensor> <min> <max> | clear <sensor> | status | quit";

impl FromStr for OperatorCommand {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(ConsoleError::Empty)?.to_lowercase();

        let command = match verb.as_str() {
            "set" => OperatorCommand::Set {
                sensor: sensor_arg(words.next(), "set")?,
                value: number_arg(words.next(), "set", "value")?,
            },
            "range" => OperatorCommand::Range {
                sensor: sensor_arg(words.next(), "range")?,
                min: number_arg(words.next(), "range", "min")?,
                max: number_arg(words.next(), "range", "max")?,
            },
            "clear" => OperatorCommand::Clear {
                sensor: sensor_arg(words.next(), "clear")?,
            },
            "status" => OperatorCommand::Status,
            "help" | "?" => OperatorCommand::Help,
            "quit" | "exit" => OperatorCommand::Quit,
            _ => return Err(ConsoleError::UnknownCommand(verb)),
        };

        if let Some(extra) = words.next() {
            return Err(ConsoleError::UnexpectedArgument {
                command: command.verb(),
                extra: extra.to_string(),
            });
        }
        Ok(command)
    }
}

impl OperatorCommand {
    fn verb(&self) -> &'static str {
        match self {
            OperatorCommand::Set { .. } => "set",
            OperatorCommand::Range { .. } => "range",
            OperatorCommand::Clear { .. } => "clear",
            OperatorCommand::Status => "status",
            OperatorCommand::Help => "help",
            OperatorCommand::Quit => "quit",
        }
    }
}

fn sensor_arg(word: Option<&str>, command: &'static str) -> Result<SensorName, ConsoleError> {
    let word = word.ok_or(ConsoleError::MissingArgument {
        command,
        argument: "sensor",
    })?;
    word.parse()
        .map_err(|_| ConsoleError::UnknownSensor(word.to_string()))
}

fn number_arg(
    word: Option<&str>,
    command: &'static str,
    argument: &'static str,
) -> Result<f64, ConsoleError> {
    let word = word.ok_or(ConsoleError::MissingArgument { command, argument })?;
    match word.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ConsoleError::InvalidNumber {
            value: word.to_string(),
        }),
    }
}

/// Run a command against the service
pub fn execute(
    service: &DashboardService,
    command: OperatorCommand,
) -> Result<ConsoleReply, DashboardError> {
    let message = match command {
        OperatorCommand::Set { sensor, value } => {
            service.set_override(sensor, value)?;
            format!("{sensor} forced to {value}")
        }
        OperatorCommand::Range { sensor, min, max } => {
            service.set_override_range(sensor, min, max)?;
            let (min, max) = (min.min(max), min.max(max));
            format!("{sensor} held within [{min}, {max}]")
        }
        OperatorCommand::Clear { sensor } => match service.clear_override(sensor)? {
            Some(_) => format!("{sensor} override cleared"),
            None => format!("{sensor} had no override"),
        },
        OperatorCommand::Status => status_message(service),
        OperatorCommand::Help => HELP.to_string(),
        OperatorCommand::Quit => return Ok(ConsoleReply::Quit),
    };
    Ok(ConsoleReply::Message(message))
}

fn status_message(service: &DashboardService) -> String {
    let status = service.status();
    let mut out = String::new();
    let _ = write!(
        out,
        "policy={:?} accepted={} rejected={} overrides={}",
        status.policy,
        status.store.snapshots_accepted,
        status.store.lines_rejected,
        status.active_overrides
    );
    if let Some(relay) = status.relay {
        let _ = write!(
            out,
            " relay_written={} relay_failed={} relay_dropped={}",
            relay.write_count, relay.failure_count, relay.dropped_count
        );
    }
    if let Some(at) = status.store.received_at {
        let _ = write!(out, " last_snapshot={}", at.format("%H:%M:%S"));
    }
    if let Some(reason) = status.store.stale_reason {
        let _ = write!(out, " stale=\"{reason}\"");
    }
    for (sensor, value) in service.overrides().unwrap_or_default() {
        match value {
            OverrideValue::Constant { value } => {
                let _ = write!(out, "\n  {sensor} = {value}");
            }
            OverrideValue::Range { min, max } => {
                let _ = write!(out, "\n  {sensor} in [{min}, {max}]");
            }
        }
    }
    out
}
