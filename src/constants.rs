// MIT License - Copyright (c) 2026 Peter Wright
// Lares4 WebSocket client

/// WebSocket endpoint path served by the panel.
pub const WS_PATH: &str = "/KseniaWsock";

/// Application subprotocol requested during the WebSocket handshake.
pub const WS_SUBPROTOCOL: &str = "KS_WSOCK";

/// Envelope key holding the checksum. The codec searches for it with quotes.
pub const CRC_FIELD: &str = "CRC_16";

/// Checksum value serialized before the real one is known.
pub const CRC_PLACEHOLDER: &str = "0x0000";

/// Payload flag replaced by the session login token.
pub const LOGIN_FLAG: &str = "ID_LOGIN";

/// Payload flag replaced by the user PIN.
pub const PIN_FLAG: &str = "PIN";

/// Payload type tag of unsolicited push updates.
pub const PAYLOAD_TYPE_CHANGES: &str = "CHANGES";

/// Login result marker.
pub const RESULT_OK: &str = "OK";

// Command names
pub const CMD_LOGIN: &str = "LOGIN";
pub const CMD_READ: &str = "READ";
pub const CMD_REALTIME: &str = "REALTIME";
pub const CMD_USER: &str = "CMD_USR";
pub const CMD_WRITE_CFG: &str = "WRITE_CFG";

// Payload type tags
pub const PT_UNKNOWN: &str = "UNKNOWN";
pub const PT_MULTI_TYPES: &str = "MULTI_TYPES";
pub const PT_REGISTER: &str = "REGISTER";
pub const PT_SET_OUTPUT: &str = "CMD_SET_OUTPUT";
pub const PT_EXE_SCENARIO: &str = "CMD_EXE_SCENARIO";
pub const PT_CFG_ALL: &str = "CFG_ALL";

// Data type keys, used both in read requests and in response payloads
pub const OUTPUTS: &str = "OUTPUTS";
pub const BUS_HAS: &str = "BUS_HAS";
pub const STATUS_OUTPUTS: &str = "STATUS_OUTPUTS";
pub const STATUS_SYSTEM: &str = "STATUS_SYSTEM";
pub const STATUS_BUS_HA_SENSORS: &str = "STATUS_BUS_HA_SENSORS";
pub const STATUS_TEMPERATURES: &str = "STATUS_TEMPERATURES";
pub const CFG_THERMOSTATS: &str = "CFG_THERMOSTATS";
pub const SCENARIOS: &str = "SCENARIOS";
pub const PRG_OUTPUTS: &str = "PRG_OUTPUTS";

/// Output category of plain and dimmable lights.
pub const CATEGORY_LIGHT: &str = "LIGHT";

/// Output category of roller shutters.
pub const CATEGORY_ROLL: &str = "ROLL";

/// Scenario categories reserved for arming, hidden from user scenario lists.
pub const SCENARIO_ARM_CATEGORIES: [&str; 2] = ["ARM", "DISARM"];
