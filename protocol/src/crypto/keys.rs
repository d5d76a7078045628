//! # Key Management
//!
//! secp256k1 keys for signing state transitions.
//!
//! Platform identities register compressed secp256k1 public keys, and asset
//! lock outputs on the core chain commit to the HASH160 of one. This module
//! wraps `k256` so the rest of the crate deals in two types: [`PrivateKey`]
//! (never serialized, never printed) and [`PublicKey`] (33-byte SEC1
//! compressed point, safe to share).
//!
//! Key bytes are never logged. Not in `Debug`, not in errors, not in
//! tracing fields.

use std::fmt;

use k256::ecdsa::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use thiserror::Error;

use super::hash::hash160;
use crate::config::{PUBLIC_KEY_HASH_LENGTH, PUBLIC_KEY_LENGTH};

/// Errors that can occur during key parsing.
///
/// Deliberately silent about the offending bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid private key bytes: wrong length or not a valid scalar")]
    InvalidPrivateKey,

    #[error("invalid public key bytes: not a compressed secp256k1 point")]
    InvalidPublicKey,
}

/// A secp256k1 signing key.
///
/// Intentionally does NOT implement `Serialize`, `Clone` or `PartialEq`.
/// Pass it by reference into `sign*` calls and drop it.
pub struct PrivateKey {
    signing_key: SigningKey,
}

/// A compressed secp256k1 public key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey {
    bytes: [u8; PUBLIC_KEY_LENGTH],
}

impl PrivateKey {
    /// Generate a fresh key from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Parse a raw 32-byte scalar. Zero and values at or above the curve
    /// order are rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let signing_key = SigningKey::from_slice(bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidPrivateKey)?;
        Self::from_bytes(&bytes)
    }

    /// Exports the raw 32-byte scalar. Handle with care.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(self.signing_key.verifying_key())
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Public half only.
        write!(f, "PrivateKey(pub={})", self.public_key().to_hex())
    }
}

impl PublicKey {
    /// Parse SEC1 bytes. Uncompressed input is accepted and re-encoded in
    /// compressed form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let key = VerifyingKey::from_sec1_bytes(bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self::from_verifying_key(&key))
    }

    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidPublicKey)?;
        Self::from_bytes(&bytes)
    }

    pub(crate) fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(true);
        let mut bytes = [0u8; PUBLIC_KEY_LENGTH];
        bytes.copy_from_slice(point.as_bytes());
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.bytes
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// HASH160 of the compressed encoding, as committed to by core-chain
    /// output scripts.
    pub fn hash160(&self) -> [u8; PUBLIC_KEY_HASH_LENGTH] {
        hash160(&self.bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_public_key_is_compressed() {
        let key = PrivateKey::generate();
        let public = key.public_key();
        assert_eq!(public.as_bytes().len(), PUBLIC_KEY_LENGTH);
        assert!(matches!(public.as_bytes()[0], 0x02 | 0x03));
    }

    #[test]
    fn test_known_private_key_vector() {
        // Private key 1 maps to the curve generator G.
        let mut scalar = [0u8; 32];
        scalar[31] = 1;
        let key = PrivateKey::from_bytes(&scalar).unwrap();
        assert_eq!(
            key.public_key().to_hex(),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    #[test]
    fn test_private_key_round_trip() {
        let key = PrivateKey::generate();
        let restored = PrivateKey::from_hex(&hex::encode(key.to_bytes())).unwrap();
        assert_eq!(key.public_key(), restored.public_key());
    }

    #[test]
    fn test_invalid_private_keys_rejected() {
        assert_eq!(
            PrivateKey::from_bytes(&[0u8; 32]).unwrap_err(),
            KeyError::InvalidPrivateKey
        );
        assert!(PrivateKey::from_bytes(&[1u8; 31]).is_err());
        assert!(PrivateKey::from_hex("not hex").is_err());
    }

    #[test]
    fn test_public_key_parse_round_trip() {
        let public = PrivateKey::generate().public_key();
        assert_eq!(PublicKey::from_bytes(public.as_bytes()).unwrap(), public);
        assert_eq!(PublicKey::from_hex(&public.to_hex()).unwrap(), public);
    }

    #[test]
    fn test_public_key_rejects_garbage() {
        assert_eq!(
            PublicKey::from_bytes(&[0x02; 20]).unwrap_err(),
            KeyError::InvalidPublicKey
        );
        let mut not_on_curve = [0xffu8; 33];
        not_on_curve[0] = 0x02;
        assert!(PublicKey::from_bytes(&not_on_curve).is_err());
    }

    #[test]
    fn test_hash160_is_over_compressed_bytes() {
        let public = PrivateKey::generate().public_key();
        assert_eq!(public.hash160(), hash160(public.as_bytes()));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let key = PrivateKey::generate();
        let debug_str = format!("{key:?}");
        assert!(debug_str.starts_with("PrivateKey(pub="));
        assert!(!debug_str.contains(&hex::encode(key.to_bytes())));
    }
}
