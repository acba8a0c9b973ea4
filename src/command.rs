// MIT License - Copyright (c) 2026 Peter Wright
// Lares4 WebSocket client

//! Outbound commands and the envelope builder.

use std::fmt;

use serde_json::{json, Map, Value};

use crate::constants::{
    BUS_HAS, CFG_THERMOSTATS, CMD_LOGIN, CMD_READ, CMD_REALTIME, CMD_USER, CMD_WRITE_CFG,
    CRC_PLACEHOLDER, LOGIN_FLAG, OUTPUTS, PIN_FLAG, PRG_OUTPUTS, PT_CFG_ALL, PT_EXE_SCENARIO,
    PT_MULTI_TYPES, PT_REGISTER, PT_SET_OUTPUT, PT_UNKNOWN, SCENARIOS, STATUS_BUS_HA_SENSORS,
    STATUS_OUTPUTS, STATUS_SYSTEM, STATUS_TEMPERATURES,
};
use crate::crc;
use crate::error::Result;
use crate::protocol::Envelope;
use crate::session::Session;

/// Value written to an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputValue {
    On,
    Off,
    /// Shutter up
    Up,
    /// Shutter down
    Down,
    /// Stop a moving shutter
    Stop,
    /// Dimmer level or shutter position, 0-100
    Level(u8),
}

impl fmt::Display for OutputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("ON"),
            Self::Off => f.write_str("OFF"),
            Self::Up => f.write_str("UP"),
            Self::Down => f.write_str("DOWN"),
            Self::Stop => f.write_str("STOP"),
            Self::Level(level) => write!(f, "{level}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermostatMode {
    Off,
    Manual,
    ManualTimer,
    Weekly,
    SpecialDay1,
    SpecialDay2,
}

impl ThermostatMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Manual => "MAN",
            Self::ManualTimer => "MAN_TMR",
            Self::Weekly => "WEEKLY",
            Self::SpecialDay1 => "SD1",
            Self::SpecialDay2 => "SD2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Winter,
    Summer,
}

impl Season {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Winter => "WIN",
            Self::Summer => "SUM",
        }
    }
}

/// Every request this client knows how to issue.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login,
    ReadAccessories,
    RegisterStatus,
    ReadConfiguration,
    SetOutput { id: String, value: OutputValue },
    TriggerScenario { id: String },
    SetThermostatMode { id: String, mode: ThermostatMode },
    /// `hours` is the panel's `MAN_HRS` string.
    SetThermostatManualEnding { id: String, hours: String },
    SetThermostatSeason { id: String, season: Season },
    SetThermostatTarget { id: String, season: Season, target: f64 },
}

impl Command {
    /// Wire `CMD` field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login => CMD_LOGIN,
            Self::ReadAccessories | Self::ReadConfiguration => CMD_READ,
            Self::RegisterStatus => CMD_REALTIME,
            Self::SetOutput { .. } | Self::TriggerScenario { .. } => CMD_USER,
            Self::SetThermostatMode { .. }
            | Self::SetThermostatManualEnding { .. }
            | Self::SetThermostatSeason { .. }
            | Self::SetThermostatTarget { .. } => CMD_WRITE_CFG,
        }
    }

    /// Wire `PAYLOAD_TYPE` field.
    pub fn payload_type(&self) -> &'static str {
        match self {
            Self::Login => PT_UNKNOWN,
            Self::ReadAccessories | Self::ReadConfiguration => PT_MULTI_TYPES,
            Self::RegisterStatus => PT_REGISTER,
            Self::SetOutput { .. } => PT_SET_OUTPUT,
            Self::TriggerScenario { .. } => PT_EXE_SCENARIO,
            Self::SetThermostatMode { .. }
            | Self::SetThermostatManualEnding { .. }
            | Self::SetThermostatSeason { .. }
            | Self::SetThermostatTarget { .. } => PT_CFG_ALL,
        }
    }

    /// Payload with credential flags still in place.
    pub fn payload(&self) -> Map<String, Value> {
        let payload = match self {
            Self::Login => json!({ PIN_FLAG: true }),
            Self::ReadAccessories => json!({
                LOGIN_FLAG: true,
                "ID_READ": "1",
                "TYPES": [OUTPUTS, BUS_HAS],
            }),
            Self::RegisterStatus => json!({
                LOGIN_FLAG: true,
                "TYPES": [STATUS_OUTPUTS, STATUS_SYSTEM, STATUS_BUS_HA_SENSORS, STATUS_TEMPERATURES],
            }),
            Self::ReadConfiguration => json!({
                LOGIN_FLAG: true,
                "ID_READ": "1",
                "TYPES": [CFG_THERMOSTATS, SCENARIOS, PRG_OUTPUTS],
            }),
            Self::SetOutput { id, value } => json!({
                LOGIN_FLAG: true,
                PIN_FLAG: true,
                "OUTPUT": { "ID": id, "STA": value.to_string() },
            }),
            Self::TriggerScenario { id } => json!({
                LOGIN_FLAG: true,
                PIN_FLAG: true,
                "SCENARIO": { "ID": id },
            }),
            Self::SetThermostatMode { id, mode } => thermostat_write(json!({
                "ID": id,
                "ACT_MODE": mode.as_str(),
                "MAN_HRS": "00",
            })),
            Self::SetThermostatManualEnding { id, hours } => thermostat_write(json!({
                "ID": id,
                "MAN_HRS": hours,
            })),
            Self::SetThermostatSeason { id, season } => thermostat_write(json!({
                "ID": id,
                "ACT_SEA": season.as_str(),
            })),
            Self::SetThermostatTarget { id, season, target } => {
                let mut entry = Map::new();
                entry.insert("ID".to_string(), Value::String(id.clone()));
                entry.insert(season.as_str().to_string(), json!({ "TM": target.to_string() }));
                thermostat_write(Value::Object(entry))
            }
        };
        match payload {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

fn thermostat_write(entry: Value) -> Value {
    json!({
        LOGIN_FLAG: true,
        CFG_THERMOSTATS: [entry],
    })
}

/// Builds checksummed envelopes on behalf of a [`Session`].
#[derive(Debug)]
pub struct CommandBuilder {
    session: Session,
}

impl CommandBuilder {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Store the token returned by a successful login.
    pub fn set_login_token(&mut self, token: impl Into<String>) {
        self.session.set_login_token(token);
    }

    /// Build the envelope for a typed command.
    pub fn command(&mut self, command: &Command) -> Result<Envelope> {
        self.build(command.name(), command.payload_type(), command.payload())
    }

    /// Build an envelope stamped with the current time.
    pub fn build(
        &mut self,
        command: &str,
        payload_type: &str,
        payload: Map<String, Value>,
    ) -> Result<Envelope> {
        self.build_at(command, payload_type, payload, chrono::Utc::now().timestamp())
    }

    /// Build an envelope as if the clock read `now` (unix seconds).
    ///
    /// Consumes exactly one command ID. The panel expects the timestamp one
    /// second behind its own clock.
    pub fn build_at(
        &mut self,
        command: &str,
        payload_type: &str,
        payload: Map<String, Value>,
        now: i64,
    ) -> Result<Envelope> {
        let id = self.session.take_id();
        let mut envelope = Envelope {
            sender: self.session.sender().to_string(),
            receiver: String::new(),
            command: command.to_string(),
            id: id.to_string(),
            payload_type: payload_type.to_string(),
            payload: self.inject_credentials(payload),
            timestamp: (now - 1).to_string(),
            crc: CRC_PLACEHOLDER.to_string(),
        };
        envelope.crc = crc::checksum(&envelope.to_json()?)?;
        Ok(envelope)
    }

    /// Replace `ID_LOGIN: true` and `PIN: true` flags with the real values.
    /// Keys keep their position; other values are left alone.
    fn inject_credentials(&self, payload: Map<String, Value>) -> Map<String, Value> {
        payload
            .into_iter()
            .map(|(key, value)| {
                let value = match (key.as_str(), &value) {
                    (LOGIN_FLAG, Value::Bool(true)) => {
                        Value::String(self.session.login_token().to_string())
                    }
                    (PIN_FLAG, Value::Bool(true)) => Value::String(self.session.pin().to_string()),
                    _ => value,
                };
                (key, value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> CommandBuilder {
        CommandBuilder::new(Session::new("monitor", "123456"))
    }

    #[test]
    fn test_login_envelope_wire_format() {
        let mut builder = builder();
        let envelope = builder
            .build_at(CMD_LOGIN, PT_UNKNOWN, Command::Login.payload(), 1_700_000_001)
            .unwrap();
        assert_eq!(
            envelope.to_json().unwrap(),
            r#"{"SENDER":"monitor","RECEIVER":"","CMD":"LOGIN","ID":"1","PAYLOAD_TYPE":"UNKNOWN","PAYLOAD":{"PIN":"123456"},"TIMESTAMP":"1700000000","CRC_16":"0xBB32"}"#
        );
    }

    #[test]
    fn test_ids_are_consecutive() {
        let mut builder = builder();
        let ids: Vec<String> = (0..4)
            .map(|_| builder.command(&Command::ReadAccessories).unwrap().id)
            .collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
        assert_eq!(builder.session().peek_id(), 5);
    }

    #[test]
    fn test_timestamp_is_one_second_behind() {
        let mut builder = builder();
        let envelope = builder.build_at("X", "Y", Map::new(), 100).unwrap();
        assert_eq!(envelope.timestamp, "99");
        assert_eq!(envelope.receiver, "");
    }

    #[test]
    fn test_credentials_replace_flags_in_place() {
        let mut builder = builder();
        builder.set_login_token("42");
        let envelope = builder
            .command(&Command::SetOutput {
                id: "3".to_string(),
                value: OutputValue::On,
            })
            .unwrap();
        let keys: Vec<&str> = envelope.payload.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["ID_LOGIN", "PIN", "OUTPUT"]);
        assert_eq!(envelope.payload["ID_LOGIN"], "42");
        assert_eq!(envelope.payload["PIN"], "123456");
        assert_eq!(envelope.payload["OUTPUT"], json!({"ID": "3", "STA": "ON"}));
    }

    #[test]
    fn test_non_flag_values_untouched() {
        let mut builder = builder();
        let mut payload = Map::new();
        payload.insert("PIN".to_string(), json!(false));
        payload.insert("ID_LOGIN".to_string(), json!("explicit"));
        let envelope = builder.build("X", "Y", payload).unwrap();
        assert_eq!(envelope.payload["PIN"], json!(false));
        assert_eq!(envelope.payload["ID_LOGIN"], "explicit");
    }

    #[test]
    fn test_checksum_matches_serialized_envelope() {
        let mut builder = builder();
        let envelope = builder.command(&Command::RegisterStatus).unwrap();
        let mut placeholder = envelope.clone();
        placeholder.crc = CRC_PLACEHOLDER.to_string();
        assert_eq!(
            crc::checksum(&placeholder.to_json().unwrap()).unwrap(),
            envelope.crc
        );
    }

    #[test]
    fn test_bootstrap_payloads() {
        assert_eq!(
            Value::Object(Command::ReadAccessories.payload()),
            json!({"ID_LOGIN": true, "ID_READ": "1", "TYPES": ["OUTPUTS", "BUS_HAS"]})
        );
        assert_eq!(
            Value::Object(Command::ReadConfiguration.payload()),
            json!({"ID_LOGIN": true, "ID_READ": "1", "TYPES": ["CFG_THERMOSTATS", "SCENARIOS", "PRG_OUTPUTS"]})
        );
        assert_eq!(Command::RegisterStatus.name(), "REALTIME");
        assert_eq!(Command::RegisterStatus.payload_type(), "REGISTER");
    }

    #[test]
    fn test_thermostat_payloads() {
        let mode = Command::SetThermostatMode {
            id: "1".to_string(),
            mode: ThermostatMode::ManualTimer,
        };
        assert_eq!(mode.name(), "WRITE_CFG");
        assert_eq!(mode.payload_type(), "CFG_ALL");
        assert_eq!(
            mode.payload()["CFG_THERMOSTATS"],
            json!([{"ID": "1", "ACT_MODE": "MAN_TMR", "MAN_HRS": "00"}])
        );

        let target = Command::SetThermostatTarget {
            id: "2".to_string(),
            season: Season::Winter,
            target: 21.0,
        };
        assert_eq!(
            target.payload()["CFG_THERMOSTATS"],
            json!([{"ID": "2", "WIN": {"TM": "21"}}])
        );

        let target = Command::SetThermostatTarget {
            id: "2".to_string(),
            season: Season::Summer,
            target: 24.5,
        };
        assert_eq!(
            target.payload()["CFG_THERMOSTATS"],
            json!([{"ID": "2", "SUM": {"TM": "24.5"}}])
        );
    }

    #[test]
    fn test_scenario_and_levels() {
        let scenario = Command::TriggerScenario { id: "7".to_string() };
        assert_eq!(scenario.payload_type(), "CMD_EXE_SCENARIO");
        assert_eq!(scenario.payload()["SCENARIO"], json!({"ID": "7"}));
        assert_eq!(OutputValue::Level(65).to_string(), "65");
        assert_eq!(OutputValue::Stop.to_string(), "STOP");
    }
}
