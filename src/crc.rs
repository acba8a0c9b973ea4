// MIT License - Copyright (c) 2026 Peter Wright
// Lares4 WebSocket client

//! Envelope checksum.
//!
//! The panel checks a CRC over the serialized envelope from its first byte
//! up to and including the `"CRC_16"` key name. The checksum value itself,
//! still holding its placeholder while the CRC is computed, is outside the
//! covered range.

use crate::constants::CRC_FIELD;
use crate::error::{Lares4Error, Result};

const POLYNOMIAL: u16 = 0x1021;
const INITIAL: u16 = 0xFFFF;

/// Bit-serial CRC-16 over `data`.
///
/// For every data bit, MSB first: the register's top bit is saved, the
/// register shifts left taking the data bit into bit 0, and the polynomial
/// is applied when the saved bit was set.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = INITIAL;
    for &byte in data {
        let mut mask: u8 = 0x80;
        while mask != 0 {
            let carry = crc & 0x8000 != 0;
            crc <<= 1;
            if byte & mask != 0 {
                crc |= 1;
            }
            if carry {
                crc ^= POLYNOMIAL;
            }
            mask >>= 1;
        }
    }
    crc
}

/// Number of bytes covered by the checksum, i.e. everything through the
/// last `"CRC_16"` key name.
pub fn covered_len(serialized: &str) -> Option<usize> {
    let key = format!("\"{CRC_FIELD}\"");
    serialized.rfind(&key).map(|pos| pos + key.len())
}

/// Compute the wire checksum of an envelope serialized with a placeholder
/// checksum value. Returns e.g. `"0x1A2B"`.
pub fn checksum(serialized: &str) -> Result<String> {
    let len = covered_len(serialized).ok_or(Lares4Error::ChecksumFieldMissing)?;
    Ok(format_crc(crc16(&serialized.as_bytes()[..len])))
}

/// Format a CRC the way the panel expects it.
pub fn format_crc(crc: u16) -> String {
    format!("0x{crc:04X}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN: &str = r#"{"SENDER":"monitor","RECEIVER":"","CMD":"LOGIN","ID":"1","PAYLOAD_TYPE":"UNKNOWN","PAYLOAD":{"PIN":"123456"},"TIMESTAMP":"1700000000","CRC_16":"0x0000"}"#;

    #[test]
    fn test_crc_reference_values() {
        assert_eq!(crc16(b""), 0xFFFF);
        assert_eq!(crc16(b"123456789"), 0xA69D);
    }

    #[test]
    fn test_checksum_known_envelope() {
        assert_eq!(checksum(LOGIN).unwrap(), "0xBB32");
        // deterministic
        assert_eq!(checksum(LOGIN).unwrap(), checksum(LOGIN).unwrap());
    }

    #[test]
    fn test_checksum_ignores_value_after_key() {
        let filled = LOGIN.replace("\"CRC_16\":\"0x0000\"", "\"CRC_16\":\"0xFFFF\"");
        assert_eq!(checksum(&filled).unwrap(), checksum(LOGIN).unwrap());
    }

    #[test]
    fn test_checksum_covers_prefix() {
        let changed = LOGIN.replace("\"ID\":\"1\"", "\"ID\":\"2\"");
        assert_ne!(checksum(&changed).unwrap(), checksum(LOGIN).unwrap());
    }

    #[test]
    fn test_checksum_counts_utf8_bytes() {
        let accented = LOGIN.replace("monitor", "mönitor");
        assert_eq!(checksum(&accented).unwrap(), "0x1301");
    }

    #[test]
    fn test_checksum_uses_last_key_occurrence() {
        let text = r#"{"A":"\"CRC_16\"","CRC_16":"0x0000"}"#;
        let len = covered_len(text).unwrap();
        assert_eq!(&text[..len], r#"{"A":"\"CRC_16\"","CRC_16""#);
    }

    #[test]
    fn test_checksum_missing_field() {
        assert!(matches!(
            checksum(r#"{"CMD":"LOGIN"}"#),
            Err(Lares4Error::ChecksumFieldMissing)
        ));
    }

    #[test]
    fn test_format_crc_pads_and_uppercases() {
        assert_eq!(format_crc(0x00AB), "0x00AB");
        assert_eq!(format_crc(0xBEEF), "0xBEEF");
    }
}
