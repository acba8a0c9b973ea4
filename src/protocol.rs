// MIT License - Copyright (c) 2026 Peter Wright
// Lares4 WebSocket client

//! Wire types.
//!
//! Every panel message is a JSON object. Outbound commands are [`Envelope`]s;
//! inbound messages are first read as an [`InboundFrame`] and their payload is
//! then decoded into one of the typed shapes below. Entity fields are strings
//! on the wire. Fields this crate does not model are kept in `extra` so that
//! replacing an entity with an update does not drop anything.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::constants::{
    BUS_HAS, CFG_THERMOSTATS, OUTPUTS, PRG_OUTPUTS, RESULT_OK, SCENARIOS, STATUS_BUS_HA_SENSORS,
    STATUS_OUTPUTS, STATUS_SYSTEM, STATUS_TEMPERATURES,
};
use crate::error::{Lares4Error, Result};

/// Outbound command envelope.
///
/// Field order is part of the wire contract: the checksum covers the
/// serialized text up to the `CRC_16` key, so `CRC_16` must stay last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "SENDER")]
    pub sender: String,
    #[serde(rename = "RECEIVER")]
    pub receiver: String,
    #[serde(rename = "CMD")]
    pub command: String,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "PAYLOAD_TYPE")]
    pub payload_type: String,
    #[serde(rename = "PAYLOAD")]
    pub payload: Map<String, Value>,
    #[serde(rename = "TIMESTAMP")]
    pub timestamp: String,
    #[serde(rename = "CRC_16")]
    pub crc: String,
}

impl Envelope {
    /// Serialize for transmission.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Any message received from the panel, before payload inspection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InboundFrame {
    #[serde(rename = "SENDER")]
    pub sender: String,
    #[serde(rename = "RECEIVER")]
    pub receiver: String,
    #[serde(rename = "CMD")]
    pub command: String,
    #[serde(rename = "ID", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "PAYLOAD_TYPE")]
    pub payload_type: String,
    #[serde(rename = "PAYLOAD")]
    pub payload: Value,
}

impl InboundFrame {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Accept either a JSON string or a JSON number and keep it as a string.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// Payload of the login response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginReply {
    #[serde(rename = "RESULT")]
    pub result: String,
    #[serde(rename = "RESULT_DETAIL")]
    pub detail: String,
    #[serde(rename = "ID_LOGIN", deserialize_with = "string_or_number")]
    pub login_token: String,
    #[serde(rename = "DESCRIPTION")]
    pub description: String,
}

impl LoginReply {
    /// Decode a login response payload.
    ///
    /// Anything but `RESULT: "OK"` together with a login token is an
    /// authentication failure.
    pub fn from_payload(payload: &Value) -> Result<Self> {
        if !payload.is_object() {
            return Err(Lares4Error::AuthenticationFailed {
                details: format!("unexpected login payload: {payload}"),
            });
        }
        let reply = LoginReply::deserialize(payload).map_err(|e| {
            Lares4Error::AuthenticationFailed {
                details: e.to_string(),
            }
        })?;
        if reply.result != RESULT_OK {
            let result = if reply.result.is_empty() {
                "<missing>"
            } else {
                reply.result.as_str()
            };
            return Err(Lares4Error::AuthenticationFailed {
                details: format!("RESULT={result} {}", reply.detail).trim_end().to_string(),
            });
        }
        if reply.login_token.is_empty() {
            return Err(Lares4Error::AuthenticationFailed {
                details: "no login token in response".to_string(),
            });
        }
        Ok(reply)
    }
}

// ---------------------------------------------------------------------------
// Bootstrap replies
// ---------------------------------------------------------------------------

/// The three queries issued after login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootstrapKind {
    Accessories,
    Status,
    Configuration,
}

impl BootstrapKind {
    /// Decode priority for inbound payloads.
    pub const PRIORITY: [BootstrapKind; 3] = [
        BootstrapKind::Accessories,
        BootstrapKind::Status,
        BootstrapKind::Configuration,
    ];

    /// Top-level payload keys that identify a reply to this query.
    pub fn signature_keys(self) -> &'static [&'static str] {
        match self {
            Self::Accessories => &[OUTPUTS, BUS_HAS],
            Self::Status => &[
                STATUS_OUTPUTS,
                STATUS_SYSTEM,
                STATUS_BUS_HA_SENSORS,
                STATUS_TEMPERATURES,
            ],
            Self::Configuration => &[CFG_THERMOSTATS, SCENARIOS, PRG_OUTPUTS],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accessories => "accessories",
            Self::Status => "status",
            Self::Configuration => "configuration",
        }
    }
}

impl fmt::Display for BootstrapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reply to the accessories query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Accessories {
    #[serde(rename = "OUTPUTS")]
    pub outputs: Vec<OutputConfig>,
    #[serde(rename = "BUS_HAS")]
    pub peripherals: Vec<BusPeripheral>,
}

/// Reply to the realtime status registration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LiveStatus {
    #[serde(rename = "STATUS_OUTPUTS")]
    pub outputs: Vec<OutputStatus>,
    #[serde(rename = "STATUS_SYSTEM")]
    pub systems: Vec<SystemStatus>,
    #[serde(rename = "STATUS_BUS_HA_SENSORS")]
    pub sensors: Vec<SensorStatus>,
    /// Panels without temperature probes leave this out.
    #[serde(rename = "STATUS_TEMPERATURES", default)]
    pub temperatures: Vec<TemperatureStatus>,
}

/// Reply to the configuration query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Configuration {
    #[serde(rename = "CFG_THERMOSTATS")]
    pub thermostats: Vec<ThermostatConfig>,
    #[serde(rename = "SCENARIOS")]
    pub scenarios: Vec<Scenario>,
    #[serde(rename = "PRG_OUTPUTS", default)]
    pub program_outputs: Vec<ProgramOutput>,
}

/// A decoded bootstrap reply.
#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapReply {
    Accessories(Accessories),
    Status(LiveStatus),
    Configuration(Configuration),
}

impl BootstrapReply {
    /// Which query a payload answers, judged by its top-level keys.
    ///
    /// Kinds are tried in [`BootstrapKind::PRIORITY`] order; the first one
    /// with any signature key present wins. `None` means the payload is not
    /// a bootstrap reply at all.
    pub fn classify(payload: &Value) -> Option<BootstrapKind> {
        let object = payload.as_object()?;
        BootstrapKind::PRIORITY.into_iter().find(|kind| {
            kind.signature_keys()
                .iter()
                .any(|key| object.contains_key(*key))
        })
    }

    /// Decode a payload as the reply to `kind`. Missing required keys or
    /// malformed entities fail that query.
    pub fn decode(kind: BootstrapKind, payload: &Value) -> Result<Self> {
        let failed = |e: serde_json::Error| Lares4Error::BootstrapFailed {
            query: kind,
            details: e.to_string(),
        };
        Ok(match kind {
            BootstrapKind::Accessories => {
                Self::Accessories(Accessories::deserialize(payload).map_err(failed)?)
            }
            BootstrapKind::Status => Self::Status(LiveStatus::deserialize(payload).map_err(failed)?),
            BootstrapKind::Configuration => {
                Self::Configuration(Configuration::deserialize(payload).map_err(failed)?)
            }
        })
    }

    pub fn kind(&self) -> BootstrapKind {
        match self {
            Self::Accessories(_) => BootstrapKind::Accessories,
            Self::Status(_) => BootstrapKind::Status,
            Self::Configuration(_) => BootstrapKind::Configuration,
        }
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Anything carrying a panel-assigned protocol ID.
pub trait Entity {
    fn entity_id(&self) -> &str;
}

/// Output definition from the accessories query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "DES")]
    pub description: String,
    #[serde(rename = "CNV")]
    pub conversion: String,
    /// `LIGHT`, `ROLL`, ...
    #[serde(rename = "CAT")]
    pub category: String,
    #[serde(rename = "MOD")]
    pub mode: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Home automation bus peripheral.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusPeripheral {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "DES")]
    pub description: String,
    #[serde(rename = "TYP")]
    pub kind: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputStatus {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "STA")]
    pub state: String,
    /// Present on dimmers and shutters.
    #[serde(rename = "POS", skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(rename = "TPOS", skip_serializing_if = "Option::is_none")]
    pub target_position: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmStatus {
    #[serde(rename = "D")]
    pub description: String,
    #[serde(rename = "S")]
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemTemperature {
    #[serde(rename = "IN")]
    pub inside: String,
    #[serde(rename = "OUT")]
    pub outside: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemTime {
    #[serde(rename = "GMT")]
    pub gmt: String,
    #[serde(rename = "TZ")]
    pub timezone: String,
    #[serde(rename = "TZM")]
    pub timezone_minutes: String,
    #[serde(rename = "DAWN")]
    pub dawn: String,
    #[serde(rename = "DUSK")]
    pub dusk: String,
}

/// Panel-wide status. Alarm, tamper and fault lists stay in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemStatus {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "ARM")]
    pub arm: ArmStatus,
    #[serde(rename = "TEMP")]
    pub temperature: SystemTemperature,
    #[serde(rename = "TIME")]
    pub time: SystemTime,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorLink {
    #[serde(rename = "TYPE")]
    pub link_type: String,
    #[serde(rename = "SN")]
    pub serial: String,
    #[serde(rename = "BUS")]
    pub bus: String,
}

/// Climate readings of a DOMUS room sensor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomusReading {
    #[serde(rename = "TEM")]
    pub temperature: String,
    #[serde(rename = "HUM")]
    pub humidity: String,
    #[serde(rename = "LHT")]
    pub light: String,
    #[serde(rename = "PIR")]
    pub motion: String,
    #[serde(rename = "TL")]
    pub tl: String,
    #[serde(rename = "TH")]
    pub th: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorStatus {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "TYP")]
    pub kind: String,
    #[serde(rename = "STA")]
    pub state: String,
    #[serde(rename = "BUS", skip_serializing_if = "Option::is_none")]
    pub link: Option<SensorLink>,
    #[serde(rename = "DOMUS", skip_serializing_if = "Option::is_none")]
    pub domus: Option<DomusReading>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Threshold {
    #[serde(rename = "T")]
    pub kind: String,
    #[serde(rename = "VAL")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermostatReading {
    #[serde(rename = "ACT_SEA")]
    pub season: String,
    #[serde(rename = "ACT_MODEL")]
    pub mode: String,
    #[serde(rename = "ACT_TOF")]
    pub tof: String,
    #[serde(rename = "TEMP_THR")]
    pub threshold: Threshold,
    #[serde(rename = "OUT_STATUS")]
    pub output_status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureStatus {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "TEMP")]
    pub temperature: String,
    #[serde(rename = "THERM")]
    pub thermostat: ThermostatReading,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Setpoints of one season. The weekly programme (`MON`..`SUN`, `SD1`,
/// `SD2`) is kept as received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonSchedule {
    #[serde(rename = "T1")]
    pub t1: String,
    #[serde(rename = "T2")]
    pub t2: String,
    #[serde(rename = "T3")]
    pub t3: String,
    #[serde(rename = "TM")]
    pub manual: String,
    #[serde(flatten)]
    pub days: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermostatConfig {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "ACT_MODE")]
    pub mode: String,
    #[serde(rename = "ACT_SEA")]
    pub season: String,
    #[serde(rename = "MAN_HRS")]
    pub manual_hours: String,
    #[serde(rename = "WIN", skip_serializing_if = "Option::is_none")]
    pub winter: Option<SeasonSchedule>,
    #[serde(rename = "SUM", skip_serializing_if = "Option::is_none")]
    pub summer: Option<SeasonSchedule>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ThermostatConfig {
    /// Schedule of the currently active season.
    pub fn active_schedule(&self) -> Option<&SeasonSchedule> {
        match self.season.as_str() {
            "WIN" => self.winter.as_ref(),
            "SUM" => self.summer.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "DES")]
    pub description: String,
    #[serde(rename = "PIN")]
    pub pin: String,
    #[serde(rename = "CAT")]
    pub category: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Output programme from the configuration query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramOutput {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

macro_rules! impl_entity {
    ($($ty:ty),* $(,)?) => {
        $(impl Entity for $ty {
            fn entity_id(&self) -> &str {
                &self.id
            }
        })*
    };
}

impl_entity!(
    OutputConfig,
    BusPeripheral,
    OutputStatus,
    SystemStatus,
    SensorStatus,
    TemperatureStatus,
    ThermostatConfig,
    Scenario,
    ProgramOutput,
);

impl fmt::Display for OutputStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Output {} is {}", self.id, self.state)?;
        if let Some(pos) = &self.position {
            write!(f, " at {pos}")?;
        }
        Ok(())
    }
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "System {}: internal temperature {}, external temperature {}",
            self.id, self.temperature.inside, self.temperature.outside
        )
    }
}

impl fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sensor {} ({}): {}", self.id, self.kind, self.state)?;
        if let Some(domus) = &self.domus {
            write!(
                f,
                ", temperature {}, humidity {}, light {}",
                domus.temperature, domus.humidity, domus.light
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for TemperatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Temperature {}: {} (mode {}, season {})",
            self.id, self.temperature, self.thermostat.mode, self.thermostat.season
        )
    }
}
