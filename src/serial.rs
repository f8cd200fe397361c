//! Binary snapshots of a rule catalog.
//!
//! A snapshot lets a service start from a catalog without re-reading and
//! re-validating JSON. The format is a 32-byte fixed header followed by a
//! bincode-encoded payload.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"SQLR"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Crate schema version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! ## Versioning
//!
//! The format version must match exactly or decoding fails with
//! [`DeserializeError::IncompatibleVersion`]. The schema version is
//! informational only.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{SyntaxRule, WarnLevel};

const MAGIC: &[u8; 4] = b"SQLR";
const FORMAT_VERSION: u16 = 1;
const SCHEMA_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

/// Errors raised while writing a catalog snapshot.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode catalog: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("catalog payload is {0} bytes, larger than a snapshot can hold")]
    TooLarge(usize),

    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading a catalog snapshot.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not a sqlrule snapshot: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: blob is v{blob}, crate supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedCatalog {
    rule_count: usize,
    rules: Vec<SerializedRule>,
}

/// Flat mirror of [`SyntaxRule`]. `item` travels as plain text here; the
/// inline-JSON form only makes sense in a JSON document.
#[derive(Debug, Serialize, Deserialize)]
struct SerializedRule {
    group_name: String,
    rule_name: String,
    item: String,
    item_type: String,
    expr: String,
    desc: String,
    warn_level: i16,
    status: bool,
}

fn rule_to_serialized(rule: &SyntaxRule) -> SerializedRule {
    SerializedRule {
        group_name: rule.group_name.clone(),
        rule_name: rule.rule_name.clone(),
        item: rule.item.clone(),
        item_type: rule.item_type.clone(),
        expr: rule.expr.clone(),
        desc: rule.desc.clone(),
        warn_level: rule.warn_level.into(),
        status: rule.status,
    }
}

fn serialized_to_rule(ser: SerializedRule) -> Result<SyntaxRule, DeserializeError> {
    let warn_level = WarnLevel::try_from(ser.warn_level)
        .map_err(|e| DeserializeError::Validation(format!("{}.{}: {e}", ser.group_name, ser.rule_name)))?;
    let rule = SyntaxRule {
        group_name: ser.group_name,
        rule_name: ser.rule_name,
        item: ser.item,
        item_type: ser.item_type,
        expr: ser.expr,
        desc: ser.desc,
        warn_level,
        status: ser.status,
    };
    rule.validate()
        .map_err(|e| DeserializeError::Validation(format!("{rule}: {e}")))?;
    Ok(rule)
}

fn validate(ser: &SerializedCatalog) -> Result<(), DeserializeError> {
    if ser.rule_count != ser.rules.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} rules but payload has {}",
            ser.rule_count,
            ser.rules.len()
        )));
    }

    let mut seen = HashSet::with_capacity(ser.rules.len());
    for rule in &ser.rules {
        if !seen.insert((rule.group_name.as_str(), rule.rule_name.as_str())) {
            return Err(DeserializeError::Validation(format!(
                "duplicate rule '{}.{}'",
                rule.group_name, rule.rule_name
            )));
        }
    }
    Ok(())
}

fn write_header(buf: &mut Vec<u8>, payload: &[u8], payload_len: u32) {
    let hash = blake3::hash(payload);

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&SCHEMA_VERSION.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // flags
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(&hash.as_bytes()[..16]);
}

#[allow(clippy::cast_possible_truncation)] // HEADER_SIZE is 32
fn read_header(bytes: &[u8]) -> Result<(u16, u32, [u8; 16]), DeserializeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DeserializeError::LengthMismatch {
            expected: HEADER_SIZE as u32,
            actual: bytes.len(),
        });
    }

    if &bytes[0..4] != MAGIC {
        return Err(DeserializeError::BadMagic);
    }

    let format_version = u16::from_le_bytes([bytes[4], bytes[5]]);
    let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

    let mut hash = [0u8; 16];
    hash.copy_from_slice(&bytes[16..32]);

    Ok((format_version, payload_len, hash))
}

pub(crate) fn encode(rules: &[SyntaxRule]) -> Result<Vec<u8>, SerializeError> {
    let serialized = SerializedCatalog {
        rule_count: rules.len(),
        rules: rules.iter().map(rule_to_serialized).collect(),
    };
    let payload = bincode::serde::encode_to_vec(&serialized, bincode::config::standard())?;
    let payload_len =
        u32::try_from(payload.len()).map_err(|_| SerializeError::TooLarge(payload.len()))?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_header(&mut buf, &payload, payload_len);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Vec<SyntaxRule>, DeserializeError> {
    let (format_version, payload_len, stored_hash) = read_header(bytes)?;

    if format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: format_version,
            supported: FORMAT_VERSION,
        });
    }

    let payload_end = HEADER_SIZE + payload_len as usize;
    if bytes.len() < payload_end {
        return Err(DeserializeError::LengthMismatch {
            expected: payload_len,
            actual: bytes.len() - HEADER_SIZE,
        });
    }
    let payload = &bytes[HEADER_SIZE..payload_end];

    if blake3::hash(payload).as_bytes()[..16] != stored_hash {
        return Err(DeserializeError::ChecksumMismatch);
    }

    let (serialized, _): (SerializedCatalog, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;
    validate(&serialized)?;

    serialized
        .rules
        .into_iter()
        .map(serialized_to_rule)
        .collect()
}
