//! The canonical value model.
//!
//! [`CanonicalValue`] is the only shape that crosses the serialization
//! boundary. Entities convert themselves to and from a [`CanonicalMap`] in
//! their `to_object` / `from_object` methods; nothing above that boundary
//! handles untyped values.
//!
//! Maps are `BTreeMap<String, _>`, so iteration order is the byte-wise
//! lexicographic order of the UTF-8 keys. That is the canonical key order the
//! encoder writes, which makes two logically equal maps indistinguishable no
//! matter how they were built.

use std::collections::BTreeMap;

use super::convert::encode_base64;
use super::error::{CodecError, CodecResult};

/// String-keyed map of canonical values, ordered canonically.
pub type CanonicalMap = BTreeMap<String, CanonicalValue>;

/// A value that has a defined canonical wire representation.
///
/// Integers compare by numeric value across widths: `Int32(5) == Int64(5)`.
/// The decoder always produces the smallest width that holds the value, and
/// the `From` constructors do the same, so callers rarely see the difference.
#[derive(Debug, Clone)]
pub enum CanonicalValue {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    ByteString(Vec<u8>),
    Text(String),
    Array(Vec<CanonicalValue>),
    Map(CanonicalMap),
}

impl CanonicalValue {
    /// Build an integer value using the narrowest width that fits.
    pub fn integer(value: i64) -> Self {
        match i32::try_from(value) {
            Ok(narrow) => Self::Int32(narrow),
            Err(_) => Self::Int64(value),
        }
    }

    /// Build an integer value from an unsigned 64-bit quantity.
    ///
    /// Values above `i64::MAX` have no mapping onto the wire model.
    pub fn from_u64(value: u64) -> CodecResult<Self> {
        i64::try_from(value)
            .map(Self::integer)
            .map_err(|_| CodecError::UnsupportedValue(format!("integer {value} exceeds i64::MAX")))
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int32(_) | Self::Int64(_) => "integer",
            Self::Float64(_) => "float",
            Self::ByteString(_) => "byte string",
            Self::Text(_) => "text",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int32(v) => Some(i64::from(*v)),
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::ByteString(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[CanonicalValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&CanonicalMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn into_map(self) -> Option<CanonicalMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// JSON view of the value. Byte strings become standard base64 text;
    /// non-finite floats (which the encoder rejects anyway) become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Self::Null => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Int32(v) => Json::from(*v),
            Self::Int64(v) => Json::from(*v),
            Self::Float64(v) => serde_json::Number::from_f64(*v)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Self::ByteString(b) => Json::String(encode_base64(b)),
            Self::Text(s) => Json::String(s.clone()),
            Self::Array(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl PartialEq for CanonicalValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Float64(a), Self::Float64(b)) => a == b,
            (Self::ByteString(a), Self::ByteString(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (a, b) => match (a.as_i64(), b.as_i64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

impl From<bool> for CanonicalValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for CanonicalValue {
    fn from(value: i32) -> Self {
        Self::Int32(value)
    }
}

impl From<i64> for CanonicalValue {
    fn from(value: i64) -> Self {
        Self::integer(value)
    }
}

impl From<u32> for CanonicalValue {
    fn from(value: u32) -> Self {
        Self::integer(i64::from(value))
    }
}

impl From<f64> for CanonicalValue {
    fn from(value: f64) -> Self {
        Self::Float64(value)
    }
}

impl From<Vec<u8>> for CanonicalValue {
    fn from(value: Vec<u8>) -> Self {
        Self::ByteString(value)
    }
}

impl From<&[u8]> for CanonicalValue {
    fn from(value: &[u8]) -> Self {
        Self::ByteString(value.to_vec())
    }
}

impl From<String> for CanonicalValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for CanonicalValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<CanonicalValue>> for CanonicalValue {
    fn from(value: Vec<CanonicalValue>) -> Self {
        Self::Array(value)
    }
}

impl From<CanonicalMap> for CanonicalValue {
    fn from(value: CanonicalMap) -> Self {
        Self::Map(value)
    }
}

impl<T: Into<CanonicalValue>> From<Option<T>> for CanonicalValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

// ---------------------------------------------------------------------------
// Typed field access
// ---------------------------------------------------------------------------

fn invalid_field(field: &str, expected: impl Into<String>, found: impl Into<String>) -> CodecError {
    CodecError::InvalidFieldType {
        field: field.to_string(),
        expected: expected.into(),
        found: found.into(),
    }
}

/// Typed accessors for fields of a decoded [`CanonicalMap`].
///
/// `required_*` fail with [`CodecError::MissingField`] when the key is absent
/// and [`CodecError::InvalidFieldType`] when it has the wrong shape.
/// `optional_*` treat an absent key and an explicit `Null` the same way.
pub trait CanonicalMapExt {
    fn required(&self, field: &str) -> CodecResult<&CanonicalValue>;
    fn optional(&self, field: &str) -> Option<&CanonicalValue>;

    fn required_bytes(&self, field: &str) -> CodecResult<&[u8]> {
        let value = self.required(field)?;
        value
            .as_bytes()
            .ok_or_else(|| invalid_field(field, "byte string", value.kind()))
    }

    fn required_fixed_bytes<const N: usize>(&self, field: &str) -> CodecResult<[u8; N]> {
        let bytes = self.required_bytes(field)?;
        bytes.try_into().map_err(|_| {
            invalid_field(
                field,
                format!("{N}-byte string"),
                format!("{}-byte string", bytes.len()),
            )
        })
    }

    fn required_text(&self, field: &str) -> CodecResult<&str> {
        let value = self.required(field)?;
        value
            .as_text()
            .ok_or_else(|| invalid_field(field, "text", value.kind()))
    }

    fn required_integer(&self, field: &str) -> CodecResult<i64> {
        let value = self.required(field)?;
        value
            .as_i64()
            .ok_or_else(|| invalid_field(field, "integer", value.kind()))
    }

    fn required_u32(&self, field: &str) -> CodecResult<u32> {
        let value = self.required_integer(field)?;
        u32::try_from(value).map_err(|_| invalid_field(field, "u32", format!("integer {value}")))
    }

    fn required_u64(&self, field: &str) -> CodecResult<u64> {
        let value = self.required_integer(field)?;
        u64::try_from(value).map_err(|_| invalid_field(field, "u64", format!("integer {value}")))
    }

    fn required_map(&self, field: &str) -> CodecResult<&CanonicalMap> {
        let value = self.required(field)?;
        value
            .as_map()
            .ok_or_else(|| invalid_field(field, "map", value.kind()))
    }

    fn required_array(&self, field: &str) -> CodecResult<&[CanonicalValue]> {
        let value = self.required(field)?;
        value
            .as_array()
            .ok_or_else(|| invalid_field(field, "array", value.kind()))
    }

    fn optional_bytes(&self, field: &str) -> CodecResult<Option<&[u8]>> {
        match self.optional(field) {
            None => Ok(None),
            Some(value) => value
                .as_bytes()
                .map(Some)
                .ok_or_else(|| invalid_field(field, "byte string", value.kind())),
        }
    }

    fn optional_integer(&self, field: &str) -> CodecResult<Option<i64>> {
        match self.optional(field) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| invalid_field(field, "integer", value.kind())),
        }
    }

    fn optional_u32(&self, field: &str) -> CodecResult<Option<u32>> {
        match self.optional_integer(field)? {
            None => Ok(None),
            Some(value) => u32::try_from(value)
                .map(Some)
                .map_err(|_| invalid_field(field, "u32", format!("integer {value}"))),
        }
    }

    fn optional_map(&self, field: &str) -> CodecResult<Option<&CanonicalMap>> {
        match self.optional(field) {
            None => Ok(None),
            Some(value) => value
                .as_map()
                .map(Some)
                .ok_or_else(|| invalid_field(field, "map", value.kind())),
        }
    }

    fn optional_array(&self, field: &str) -> CodecResult<Option<&[CanonicalValue]>> {
        match self.optional(field) {
            None => Ok(None),
            Some(value) => value
                .as_array()
                .map(Some)
                .ok_or_else(|| invalid_field(field, "array", value.kind())),
        }
    }
}

impl CanonicalMapExt for CanonicalMap {
    fn required(&self, field: &str) -> CodecResult<&CanonicalValue> {
        self.get(field)
            .ok_or_else(|| CodecError::MissingField(field.to_string()))
    }

    fn optional(&self, field: &str) -> Option<&CanonicalValue> {
        self.get(field).filter(|v| !v.is_null())
    }
}

/// Interpret every element of `items` as a map, reporting `field` on failure.
pub fn array_of_maps<'a>(field: &str, items: &'a [CanonicalValue]) -> CodecResult<Vec<&'a CanonicalMap>> {
    items
        .iter()
        .map(|item| {
            item.as_map()
                .ok_or_else(|| invalid_field(field, "array of maps", format!("array containing {}", item.kind())))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_picks_narrowest_width() {
        assert!(matches!(CanonicalValue::integer(7), CanonicalValue::Int32(7)));
        assert!(matches!(
            CanonicalValue::integer(i64::from(i32::MAX) + 1),
            CanonicalValue::Int64(_)
        ));
        assert!(matches!(
            CanonicalValue::from(u32::MAX),
            CanonicalValue::Int64(4_294_967_295)
        ));
    }

    #[test]
    fn test_integer_equality_ignores_width() {
        assert_eq!(CanonicalValue::Int32(5), CanonicalValue::Int64(5));
        assert_ne!(CanonicalValue::Int32(5), CanonicalValue::Float64(5.0));
        assert_ne!(CanonicalValue::Int64(5), CanonicalValue::Int64(6));
    }

    #[test]
    fn test_from_u64_rejects_values_above_i64_max() {
        assert!(CanonicalValue::from_u64(42).is_ok());
        assert!(matches!(
            CanonicalValue::from_u64(u64::MAX),
            Err(CodecError::UnsupportedValue(_))
        ));
    }

    #[test]
    fn test_option_maps_to_null() {
        let none: Option<u32> = None;
        assert!(CanonicalValue::from(none).is_null());
        assert_eq!(CanonicalValue::from(Some(3u32)), CanonicalValue::Int32(3));
    }

    #[test]
    fn test_required_field_errors_carry_field_name() {
        let mut map = CanonicalMap::new();
        map.insert("name".into(), "alice".into());

        match map.required_bytes("name") {
            Err(CodecError::InvalidFieldType { field, expected, found }) => {
                assert_eq!(field, "name");
                assert_eq!(expected, "byte string");
                assert_eq!(found, "text");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(
            map.required_text("missing"),
            Err(CodecError::MissingField("missing".into()))
        );
    }

    #[test]
    fn test_fixed_bytes_checks_length() {
        let mut map = CanonicalMap::new();
        map.insert("id".into(), vec![1u8; 31].into());
        let err = map.required_fixed_bytes::<32>("id").unwrap_err();
        assert!(err.to_string().contains("31-byte string"));
    }

    #[test]
    fn test_u32_range_checked() {
        let mut map = CanonicalMap::new();
        map.insert("n".into(), CanonicalValue::integer(-1));
        assert!(map.required_u32("n").is_err());
        map.insert("n".into(), CanonicalValue::integer(10));
        assert_eq!(map.required_u32("n").unwrap(), 10);
    }

    #[test]
    fn test_optional_treats_null_as_absent() {
        let mut map = CanonicalMap::new();
        map.insert("a".into(), CanonicalValue::Null);
        assert_eq!(map.optional_integer("a").unwrap(), None);
        assert_eq!(map.optional_integer("b").unwrap(), None);
    }

    #[test]
    fn test_to_json_renders_bytes_as_base64() {
        let mut map = CanonicalMap::new();
        map.insert("data".into(), vec![0xde, 0xad].into());
        map.insert("n".into(), 3i64.into());
        let json = CanonicalValue::Map(map).to_json();
        assert_eq!(json, serde_json::json!({ "data": "3q0=", "n": 3 }));
    }
}
