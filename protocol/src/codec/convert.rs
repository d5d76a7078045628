//! Byte-array conversions to and from the textual encodings the protocol
//! exposes: base58 (identifiers), base64 (binary fields in JSON views) and
//! hex (hashes, out points, diagnostics).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// A textual encoding could not be decoded back to bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("invalid base58 string: {0}")]
    Base58(String),

    #[error("invalid base64 string: {0}")]
    Base64(String),

    #[error("invalid hex string: {0}")]
    Hex(String),
}

/// Supported textual encodings for binary values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Base58,
    Base64,
    Hex,
}

pub fn encode_base58(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

pub fn decode_base58(s: &str) -> Result<Vec<u8>, ConversionError> {
    bs58::decode(s)
        .into_vec()
        .map_err(|e| ConversionError::Base58(e.to_string()))
}

/// Standard (padded) base64 alphabet.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_base64(s: &str) -> Result<Vec<u8>, ConversionError> {
    STANDARD
        .decode(s)
        .map_err(|e| ConversionError::Base64(e.to_string()))
}

pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

pub fn decode_hex(s: &str) -> Result<Vec<u8>, ConversionError> {
    hex::decode(s).map_err(|e| ConversionError::Hex(e.to_string()))
}

/// Encode `bytes` with the chosen encoding.
pub fn encode(bytes: &[u8], encoding: Encoding) -> String {
    match encoding {
        Encoding::Base58 => encode_base58(bytes),
        Encoding::Base64 => encode_base64(bytes),
        Encoding::Hex => encode_hex(bytes),
    }
}

/// Decode `s` with the chosen encoding.
pub fn decode(s: &str, encoding: Encoding) -> Result<Vec<u8>, ConversionError> {
    match encoding {
        Encoding::Base58 => decode_base58(s),
        Encoding::Base64 => decode_base64(s),
        Encoding::Hex => decode_hex(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        let bytes = b"hello";
        assert_eq!(encode_base58(bytes), "Cn8eVZg");
        assert_eq!(encode_base64(bytes), "aGVsbG8=");
        assert_eq!(encode_hex(bytes), "68656c6c6f");
    }

    #[test]
    fn test_decode_matches_encode_for_each_encoding() {
        let bytes = [0u8, 1, 2, 0xfe, 0xff];
        for encoding in [Encoding::Base58, Encoding::Base64, Encoding::Hex] {
            let text = encode(&bytes, encoding);
            assert_eq!(decode(&text, encoding).unwrap(), bytes.to_vec());
        }
    }

    #[test]
    fn test_base58_keeps_leading_zeros() {
        let bytes = [0u8, 0, 7];
        let text = encode_base58(&bytes);
        assert!(text.starts_with("11"));
        assert_eq!(decode_base58(&text).unwrap(), bytes.to_vec());
    }

    #[test]
    fn test_invalid_input_rejected() {
        // 0, O, I and l are not in the base58 alphabet.
        assert!(matches!(decode_base58("0OIl"), Err(ConversionError::Base58(_))));
        assert!(matches!(decode_base64("***"), Err(ConversionError::Base64(_))));
        assert!(matches!(decode_hex("abc"), Err(ConversionError::Hex(_))));
    }
}
