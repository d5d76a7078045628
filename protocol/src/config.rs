//! # Protocol Configuration & Constants
//!
//! Every consensus-relevant number in the protocol lives here. If two nodes
//! disagree on any of these, they disagree on identifiers, signatures and
//! fees, which means they are no longer on the same network.
//!
//! Nothing in this module is read from the environment. The surrounding
//! application may layer its own configuration on top, but the values below
//! are part of the wire contract and are not tunable at runtime.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Protocol version stamped on every entity and state transition created by
/// this crate. Serialized as the 4-byte little-endian prefix of every
/// versioned buffer.
pub const PROTOCOL_VERSION: u32 = 1;

/// Length of the little-endian protocol version prefix in bytes.
pub const PROTOCOL_VERSION_PREFIX_LENGTH: usize = 4;

/// Meta-schema URI written into the `$schema` field of new data contracts.
pub const DATA_CONTRACT_SCHEMA_URI: &str =
    "https://schema.dash.org/dpp-0-4-0/meta/data-contract";

// ---------------------------------------------------------------------------
// Identifiers & Entropy
// ---------------------------------------------------------------------------

/// Every identifier is a 32-byte double SHA-256 digest.
pub const IDENTIFIER_LENGTH: usize = 32;

/// Entropy mixed into contract and document id derivation.
pub const ENTROPY_LENGTH: usize = 32;

/// Transaction hash (32 bytes) followed by a little-endian u32 output index.
pub const OUT_POINT_LENGTH: usize = 36;

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Compact recoverable secp256k1 signature: one header byte, then r and s.
pub const COMPACT_SIGNATURE_LENGTH: usize = 65;

/// Header byte offset for compact signatures over compressed public keys.
/// The header is `27 + 4 + recovery_id`.
pub const COMPACT_SIGNATURE_HEADER_BASE: u8 = 27 + 4;

/// SEC1 compressed secp256k1 public key length.
pub const PUBLIC_KEY_LENGTH: usize = 33;

/// HASH160 (RIPEMD-160 over SHA-256) output length.
pub const PUBLIC_KEY_HASH_LENGTH: usize = 20;

// ---------------------------------------------------------------------------
// Fees & Credits
// ---------------------------------------------------------------------------

/// Credits charged per byte of the unsigned canonical transition buffer.
pub const PRICE_PER_BYTE: u64 = 1;

/// Fixed exchange ratio between locked core-chain duffs (satoshis) and
/// platform credits.
pub const CREDITS_PER_SATOSHI: u64 = 1000;

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Fee for a payload of `byte_length` bytes, or `None` on overflow.
pub fn fee_for_length(byte_length: usize) -> Option<u64> {
    (byte_length as u64).checked_mul(PRICE_PER_BYTE)
}

/// Returns `true` if this crate can read entities stamped with `version`.
/// Only the current version has a known field layout; 0 was never issued.
pub fn is_supported_protocol_version(version: u32) -> bool {
    version == PROTOCOL_VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_constants() {
        assert_eq!(IDENTIFIER_LENGTH, 32);
        assert_eq!(OUT_POINT_LENGTH, IDENTIFIER_LENGTH + 4);
        assert_eq!(COMPACT_SIGNATURE_LENGTH, 1 + 32 + 32);
        assert_eq!(PUBLIC_KEY_HASH_LENGTH, 20);
    }

    #[test]
    fn test_fee_for_length() {
        assert_eq!(fee_for_length(0), Some(0));
        assert_eq!(fee_for_length(250), Some(250 * PRICE_PER_BYTE));
    }

    #[test]
    fn test_supported_versions() {
        assert!(is_supported_protocol_version(PROTOCOL_VERSION));
        assert!(!is_supported_protocol_version(0));
        assert!(!is_supported_protocol_version(PROTOCOL_VERSION + 1));
    }

    #[test]
    fn test_credit_ratio_is_positive() {
        assert!(CREDITS_PER_SATOSHI > 0);
        assert!(PRICE_PER_BYTE > 0);
    }
}
