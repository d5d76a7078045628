//! # Canonical CBOR
//!
//! The wire form of every entity and state transition. Values go through
//! [`ciborium::Value`] on the way in and out; the conversion functions here
//! are where canonical form is enforced:
//!
//! - map keys are written in byte-wise lexicographic order of their UTF-8
//!   bytes (the iteration order of [`CanonicalMap`]),
//! - integers use the shortest head, lengths are always definite,
//! - floats are written in the narrowest width that round-trips exactly.
//!
//! Decoding is strict. Trailing bytes, tags, non-text or duplicate map keys
//! and integers outside the signed 64-bit range are rejected instead of
//! being coerced. Every decoded item is re-encoded and must reproduce the
//! input exactly, so unsorted keys, oversized heads and indefinite lengths
//! fail with [`CodecError::NonCanonical`].

use ciborium::value::{Integer, Value};

use super::error::{CodecError, CodecResult};
use super::value::{CanonicalMap, CanonicalValue};
use crate::config::PROTOCOL_VERSION_PREFIX_LENGTH;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a top-level map or array.
///
/// Scalars are not valid top-level documents here; use [`encode_string`] or
/// [`encode_bytes`] for single values.
pub fn encode(value: &CanonicalValue) -> CodecResult<Vec<u8>> {
    match value {
        CanonicalValue::Map(_) | CanonicalValue::Array(_) => write_item(value),
        other => Err(CodecError::UnsupportedValue(format!(
            "top-level {} is not a container",
            other.kind()
        ))),
    }
}

/// Shorthand for encoding a map without wrapping it first.
pub fn encode_map(map: &CanonicalMap) -> CodecResult<Vec<u8>> {
    write_value(&Value::Map(map_to_cbor(map)?))
}

pub fn encode_string(value: &str) -> CodecResult<Vec<u8>> {
    write_value(&Value::Text(value.to_string()))
}

pub fn encode_bytes(value: &[u8]) -> CodecResult<Vec<u8>> {
    write_value(&Value::Bytes(value.to_vec()))
}

/// `u32_le(version) || encode(map)`, the framing shared by every versioned
/// buffer in the protocol.
pub fn encode_with_version(version: u32, map: &CanonicalMap) -> CodecResult<Vec<u8>> {
    let body = encode_map(map)?;
    let mut buffer = Vec::with_capacity(PROTOCOL_VERSION_PREFIX_LENGTH + body.len());
    buffer.extend_from_slice(&version.to_le_bytes());
    buffer.extend_from_slice(&body);
    Ok(buffer)
}

fn write_item(value: &CanonicalValue) -> CodecResult<Vec<u8>> {
    write_value(&to_cbor(value)?)
}

fn write_value(value: &Value) -> CodecResult<Vec<u8>> {
    let mut out = Vec::new();
    ciborium::ser::into_writer(value, &mut out)
        .map_err(|e| CodecError::UnsupportedValue(format!("{e:?}")))?;
    Ok(out)
}

fn to_cbor(value: &CanonicalValue) -> CodecResult<Value> {
    Ok(match value {
        CanonicalValue::Null => Value::Null,
        CanonicalValue::Bool(b) => Value::Bool(*b),
        CanonicalValue::Int32(v) => Value::Integer(Integer::from(*v)),
        CanonicalValue::Int64(v) => Value::Integer(Integer::from(*v)),
        CanonicalValue::Float64(v) => {
            if !v.is_finite() {
                return Err(CodecError::UnsupportedValue(format!(
                    "non-finite float {v}"
                )));
            }
            Value::Float(*v)
        }
        CanonicalValue::ByteString(b) => Value::Bytes(b.clone()),
        CanonicalValue::Text(s) => Value::Text(s.clone()),
        CanonicalValue::Array(items) => {
            Value::Array(items.iter().map(to_cbor).collect::<CodecResult<_>>()?)
        }
        CanonicalValue::Map(map) => Value::Map(map_to_cbor(map)?),
    })
}

fn map_to_cbor(map: &CanonicalMap) -> CodecResult<Vec<(Value, Value)>> {
    // BTreeMap<String, _> iterates in byte-wise key order already.
    map.iter()
        .map(|(k, v)| Ok((Value::Text(k.clone()), to_cbor(v)?)))
        .collect()
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode bytes whose top-level item must be a map.
pub fn decode(bytes: &[u8]) -> CodecResult<CanonicalMap> {
    match read_item(bytes)? {
        CanonicalValue::Map(map) => Ok(map),
        other => Err(unexpected("map", &other)),
    }
}

/// Decode bytes whose top-level item must be an array.
pub fn decode_array(bytes: &[u8]) -> CodecResult<Vec<CanonicalValue>> {
    match read_item(bytes)? {
        CanonicalValue::Array(items) => Ok(items),
        other => Err(unexpected("array", &other)),
    }
}

pub fn decode_string(bytes: &[u8]) -> CodecResult<String> {
    match read_item(bytes)? {
        CanonicalValue::Text(s) => Ok(s),
        other => Err(unexpected("text", &other)),
    }
}

pub fn decode_bytes(bytes: &[u8]) -> CodecResult<Vec<u8>> {
    match read_item(bytes)? {
        CanonicalValue::ByteString(b) => Ok(b),
        other => Err(unexpected("byte string", &other)),
    }
}

/// Split a versioned buffer into its protocol version and decoded map.
pub fn decode_with_version(bytes: &[u8]) -> CodecResult<(u32, CanonicalMap)> {
    if bytes.len() < PROTOCOL_VERSION_PREFIX_LENGTH {
        return Err(CodecError::MissingVersionPrefix { len: bytes.len() });
    }
    let (prefix, body) = bytes.split_at(PROTOCOL_VERSION_PREFIX_LENGTH);
    let mut version = [0u8; PROTOCOL_VERSION_PREFIX_LENGTH];
    version.copy_from_slice(prefix);
    Ok((u32::from_le_bytes(version), decode(body)?))
}

fn unexpected(expected: &'static str, found: &CanonicalValue) -> CodecError {
    CodecError::UnexpectedKind {
        expected,
        found: found.kind(),
    }
}

fn read_item(bytes: &[u8]) -> CodecResult<CanonicalValue> {
    let mut cursor = bytes;
    let value: Value = ciborium::de::from_reader(&mut cursor)
        .map_err(|e| CodecError::Decode(format!("{e:?}")))?;
    if !cursor.is_empty() {
        return Err(CodecError::Decode(format!(
            "{} trailing bytes after top-level item",
            cursor.len()
        )));
    }
    let item = from_cbor(value)?;
    match write_item(&item) {
        Ok(reencoded) if reencoded == bytes => Ok(item),
        _ => Err(CodecError::NonCanonical),
    }
}

fn from_cbor(value: Value) -> CodecResult<CanonicalValue> {
    Ok(match value {
        Value::Null => CanonicalValue::Null,
        Value::Bool(b) => CanonicalValue::Bool(b),
        Value::Integer(i) => {
            let wide = i128::from(i);
            let narrow = i64::try_from(wide).map_err(|_| {
                CodecError::Decode(format!("integer {wide} is outside the signed 64-bit range"))
            })?;
            CanonicalValue::integer(narrow)
        }
        Value::Float(f) => CanonicalValue::Float64(f),
        Value::Bytes(b) => CanonicalValue::ByteString(b),
        Value::Text(s) => CanonicalValue::Text(s),
        Value::Array(items) => CanonicalValue::Array(
            items
                .into_iter()
                .map(from_cbor)
                .collect::<CodecResult<_>>()?,
        ),
        Value::Map(entries) => {
            let mut map = CanonicalMap::new();
            for (key, item) in entries {
                let key = match key {
                    Value::Text(k) => k,
                    _ => return Err(CodecError::Decode("map key is not text".into())),
                };
                if map.contains_key(&key) {
                    return Err(CodecError::Decode(format!("duplicate map key `{key}`")));
                }
                let item = from_cbor(item)?;
                map.insert(key, item);
            }
            CanonicalValue::Map(map)
        }
        Value::Tag(tag, _) => {
            return Err(CodecError::Decode(format!("tagged item ({tag}) is not canonical")))
        }
        _ => return Err(CodecError::Decode("unrecognized item".into())),
    })
}
