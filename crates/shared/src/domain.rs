use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Snapshot of the bottling line as last reported by the controller.
///
/// Field names on the wire are camelCase. The four actuator fields were
/// added after the first controller firmware shipped, so reports that
/// omit them are still accepted and those fields fall back to 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineState {
    pub status: String,
    pub pulse_count: u32,
    pub target_pulses: u32,
    pub tank_level_percent: i32,
    pub bottle_present: u8,
    pub emergency_stop_ok: u8,
    #[serde(default)]
    pub conveyor_on: u8,
    #[serde(default)]
    pub pump_on: u8,
    #[serde(default)]
    pub green_led_on: u8,
    #[serde(default)]
    pub red_led_on: u8,
}

impl Default for MachineState {
    fn default() -> Self {
        Self {
            status: "IDLE".to_string(),
            pulse_count: 0,
            target_pulses: 0,
            tank_level_percent: 100,
            bottle_present: 0,
            emergency_stop_ok: 0,
            conveyor_on: 0,
            pump_on: 0,
            green_led_on: 0,
            red_led_on: 0,
        }
    }
}

/// Wire names of the fields every controller report must carry.
pub const REQUIRED_FIELDS: [&str; 6] = [
    "status",
    "pulseCount",
    "targetPulses",
    "tankLevelPercent",
    "bottlePresent",
    "emergencyStopOk",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
    #[error("field values have the wrong types")]
    WrongTypes,
}

impl MachineState {
    /// Builds a snapshot from a raw controller report.
    ///
    /// Presence of every required field is checked first, so a report
    /// that is both incomplete and mistyped is reported as incomplete.
    /// Counters must be non-negative integers; the tank level is taken
    /// as-is, including values outside 0..=100.
    pub fn from_payload(payload: &Value) -> Result<Self, SnapshotError> {
        let Some(report) = payload.as_object() else {
            return Err(SnapshotError::MissingFields(
                REQUIRED_FIELDS.iter().map(|name| name.to_string()).collect(),
            ));
        };

        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|name| !report.contains_key(**name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SnapshotError::MissingFields(missing));
        }

        let status = report
            .get("status")
            .and_then(Value::as_str)
            .ok_or(SnapshotError::WrongTypes)?;

        Ok(Self {
            status: status.to_string(),
            pulse_count: counter_field(report, "pulseCount")?,
            target_pulses: counter_field(report, "targetPulses")?,
            tank_level_percent: level_field(report, "tankLevelPercent")?,
            bottle_present: flag_field(report, "bottlePresent")?,
            emergency_stop_ok: flag_field(report, "emergencyStopOk")?,
            conveyor_on: optional_flag_field(report, "conveyorOn")?,
            pump_on: optional_flag_field(report, "pumpOn")?,
            green_led_on: optional_flag_field(report, "greenLedOn")?,
            red_led_on: optional_flag_field(report, "redLedOn")?,
        })
    }
}

fn counter_field(report: &Map<String, Value>, name: &str) -> Result<u32, SnapshotError> {
    report
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|raw| u32::try_from(raw).ok())
        .ok_or(SnapshotError::WrongTypes)
}

fn level_field(report: &Map<String, Value>, name: &str) -> Result<i32, SnapshotError> {
    report
        .get(name)
        .and_then(Value::as_i64)
        .and_then(|raw| i32::try_from(raw).ok())
        .ok_or(SnapshotError::WrongTypes)
}

fn flag_field(report: &Map<String, Value>, name: &str) -> Result<u8, SnapshotError> {
    report
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|raw| u8::try_from(raw).ok())
        .ok_or(SnapshotError::WrongTypes)
}

fn optional_flag_field(report: &Map<String, Value>, name: &str) -> Result<u8, SnapshotError> {
    match report.get(name) {
        None => Ok(0),
        Some(_) => flag_field(report, name),
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
