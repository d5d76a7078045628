//! # Identifiers
//!
//! Every contract, document and identity is named by a 32-byte identifier
//! derived from a double SHA-256 digest. Identifiers are never chosen by
//! users; they are recomputed from the data that produced them.
//!
//! The default text form is base58 (what `Display` and `FromStr` use, and
//! what serde writes). Base64 is available through
//! [`Identifier::to_string_with`] for JSON views that want it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::codec::convert::{self, ConversionError, Encoding};
use crate::codec::{CanonicalMap, CanonicalMapExt, CanonicalValue, CodecResult};
use crate::config::IDENTIFIER_LENGTH;

/// Errors from constructing or parsing an [`Identifier`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// The buffer is not exactly 32 bytes.
    #[error("identifier must be {IDENTIFIER_LENGTH} bytes, got {len}")]
    InvalidLength { len: usize },

    /// The text form could not be decoded.
    #[error(transparent)]
    Encoding(#[from] ConversionError),
}

/// A 32-byte content identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier([u8; IDENTIFIER_LENGTH]);

impl Identifier {
    pub const fn new(bytes: [u8; IDENTIFIER_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Build an identifier from an arbitrary slice, rejecting any length
    /// other than 32.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IdentifierError> {
        let array: [u8; IDENTIFIER_LENGTH] = bytes
            .try_into()
            .map_err(|_| IdentifierError::InvalidLength { len: bytes.len() })?;
        Ok(Self(array))
    }

    /// Parse from text in the given encoding.
    pub fn from_string_with(s: &str, encoding: Encoding) -> Result<Self, IdentifierError> {
        let bytes = convert::decode(s, encoding)?;
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; IDENTIFIER_LENGTH] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn to_string_with(&self, encoding: Encoding) -> String {
        convert::encode(&self.0, encoding)
    }
}

impl AsRef<[u8]> for Identifier {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; IDENTIFIER_LENGTH]> for Identifier {
    fn from(bytes: [u8; IDENTIFIER_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Identifier {
    type Error = IdentifierError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}

impl From<Identifier> for CanonicalValue {
    fn from(id: Identifier) -> Self {
        CanonicalValue::ByteString(id.to_vec())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&convert::encode_base58(&self.0))
    }
}

// Debug shows the base58 form too; 32 decimal numbers help nobody.
impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({self})")
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string_with(s, Encoding::Base58)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Read a 32-byte identifier field from a decoded map.
pub(crate) fn required_identifier(map: &CanonicalMap, field: &str) -> CodecResult<Identifier> {
    map.required_fixed_bytes::<IDENTIFIER_LENGTH>(field)
        .map(Identifier::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_wrong_lengths() {
        for len in [0, 31, 33] {
            assert_eq!(
                Identifier::from_bytes(&vec![7u8; len]),
                Err(IdentifierError::InvalidLength { len })
            );
        }
        assert!(Identifier::from_bytes(&[7u8; 32]).is_ok());
    }

    #[test]
    fn test_base58_text_round_trip() {
        let bytes = [0x5au8; 32];
        let text = convert::encode_base58(&bytes);
        let id: Identifier = text.parse().unwrap();
        assert_eq!(id.to_string(), text);
        assert_eq!(id.as_bytes(), &bytes);
    }

    #[test]
    fn test_base64_form() {
        let id = Identifier::new([0u8; 32]);
        let text = id.to_string_with(Encoding::Base64);
        assert_eq!(text, "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=");
        assert_eq!(Identifier::from_string_with(&text, Encoding::Base64).unwrap(), id);
    }

    #[test]
    fn test_parse_rejects_short_or_garbage_text() {
        let short = convert::encode_base58(&[1u8; 20]);
        assert_eq!(
            short.parse::<Identifier>(),
            Err(IdentifierError::InvalidLength { len: 20 })
        );
        assert!(matches!(
            "not-base58-0OIl".parse::<Identifier>(),
            Err(IdentifierError::Encoding(_))
        ));
    }

    #[test]
    fn test_equality_is_by_content() {
        let a = Identifier::from_bytes(&[9u8; 32]).unwrap();
        let b = Identifier::new([9u8; 32]);
        assert_eq!(a, b);
        assert_ne!(a, Identifier::new([8u8; 32]));
    }

    #[test]
    fn test_serde_uses_base58_string() {
        let id = Identifier::new([1u8; 32]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: Identifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_canonical_value_is_byte_string() {
        let id = Identifier::new([3u8; 32]);
        assert_eq!(CanonicalValue::from(id), CanonicalValue::ByteString(vec![3u8; 32]));
    }
}
