//! # Digital Signatures
//!
//! Compact recoverable secp256k1 ECDSA, the format the core chain uses for
//! message signing and the platform uses for state transitions.
//!
//! A compact signature is 65 bytes: one header byte followed by `r || s`.
//! The header is `27 + 4 + recovery_id` for signatures made with compressed
//! keys (which is all we produce). Verification never takes the public key
//! as input to the curve math; it recovers the signer from the signature and
//! the 32-byte digest, then compares. That is what makes verifying against a
//! bare public-key hash possible.
//!
//! Errors split two ways: input that is not a signature at all is an `Err`,
//! while a well-formed signature by somebody else is `Ok(false)`.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use thiserror::Error;

use super::hash::{double_sha256, Hash256};
use super::keys::{PrivateKey, PublicKey};
use crate::config::{COMPACT_SIGNATURE_HEADER_BASE, COMPACT_SIGNATURE_LENGTH, PUBLIC_KEY_HASH_LENGTH};

/// Header byte for uncompressed-key signatures; the compressed range
/// starts four above it.
const UNCOMPRESSED_HEADER_BASE: u8 = 27;

/// Errors during signature operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// The bytes are not a compact signature: wrong length, bad header,
    /// or `r`/`s` out of range.
    #[error("malformed compact signature: {0}")]
    Malformed(String),

    /// The signature is well-formed but no public key can be recovered
    /// from it for this digest.
    #[error("public key recovery failed")]
    RecoveryFailed,

    #[error("signing failed")]
    SigningFailed,
}

/// Sign a 32-byte digest and return the 65-byte compact signature.
///
/// `k256` produces low-S signatures, so the output is already in the
/// normalized form verifiers expect.
pub fn sign_hash(private_key: &PrivateKey, hash: &Hash256) -> Result<Vec<u8>, SignatureError> {
    let (signature, recovery_id) = private_key
        .signing_key()
        .sign_prehash_recoverable(hash)
        .map_err(|_| SignatureError::SigningFailed)?;

    let mut compact = Vec::with_capacity(COMPACT_SIGNATURE_LENGTH);
    compact.push(COMPACT_SIGNATURE_HEADER_BASE + recovery_id.to_byte());
    compact.extend_from_slice(&signature.to_bytes());
    Ok(compact)
}

/// Sign `double_sha256(message)`.
///
/// # Example
///
/// ```
/// use dpp::crypto::{sign, verify, PrivateKey};
///
/// let key = PrivateKey::generate();
/// let signature = sign(&key, b"register contract").unwrap();
/// assert!(verify(&signature, b"register contract", key.public_key().as_bytes()).unwrap());
/// ```
pub fn sign(private_key: &PrivateKey, message: &[u8]) -> Result<Vec<u8>, SignatureError> {
    sign_hash(private_key, &double_sha256(message))
}

/// Recover the signer's public key from a compact signature over `hash`.
pub fn recover_public_key(signature: &[u8], hash: &Hash256) -> Result<PublicKey, SignatureError> {
    if signature.len() != COMPACT_SIGNATURE_LENGTH {
        return Err(SignatureError::Malformed(format!(
            "expected {COMPACT_SIGNATURE_LENGTH} bytes, got {}",
            signature.len()
        )));
    }

    let header = signature[0];
    // 27..=30 uncompressed, 31..=34 compressed. Either way the point is
    // compared in compressed form below.
    if !(UNCOMPRESSED_HEADER_BASE..COMPACT_SIGNATURE_HEADER_BASE + 4).contains(&header) {
        return Err(SignatureError::Malformed(format!("header byte {header} out of range")));
    }
    let recovery_id = RecoveryId::from_byte((header - UNCOMPRESSED_HEADER_BASE) & 0x03)
        .ok_or_else(|| SignatureError::Malformed(format!("header byte {header} out of range")))?;

    let rs = Signature::from_slice(&signature[1..])
        .map_err(|_| SignatureError::Malformed("r or s out of range".into()))?;

    let key = VerifyingKey::recover_from_prehash(hash, &rs, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;
    Ok(PublicKey::from_verifying_key(&key))
}

/// Check a compact signature over `hash` against a SEC1 public key.
///
/// Returns `Ok(false)` when the signature is valid for a different key.
pub fn verify_hash(
    signature: &[u8],
    hash: &Hash256,
    public_key: &[u8],
) -> Result<bool, SignatureError> {
    let recovered = recover_public_key(signature, hash)?;
    Ok(match PublicKey::from_bytes(public_key) {
        Ok(expected) => recovered == expected,
        // Bytes that are not a curve point cannot have signed anything.
        Err(_) => false,
    })
}

/// Check a compact signature over `hash` against a HASH160 public-key hash.
pub fn verify_hash_by_public_key_hash(
    signature: &[u8],
    hash: &Hash256,
    public_key_hash: &[u8],
) -> Result<bool, SignatureError> {
    if public_key_hash.len() != PUBLIC_KEY_HASH_LENGTH {
        return Ok(false);
    }
    let recovered = recover_public_key(signature, hash)?;
    Ok(recovered.hash160().as_slice() == public_key_hash)
}

/// Verify a compact signature over `double_sha256(message)`.
pub fn verify(signature: &[u8], message: &[u8], public_key: &[u8]) -> Result<bool, SignatureError> {
    verify_hash(signature, &double_sha256(message), public_key)
}
