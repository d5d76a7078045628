//! The signing, verification and fee protocol shared by all transitions.
//!
//! Everything here operates on the unsigned canonical buffer:
//!
//! ```text
//! to_buffer(skip_signature) = u32_le(protocol_version) || cbor(fields - protocolVersion)
//! hash(skip_signature)      = double_sha256(to_buffer(skip_signature))
//! signature                 = compact_secp256k1(hash(true))
//! fee                       = len(to_buffer(true)) * PRICE_PER_BYTE
//! ```
//!
//! `skip_signature` drops both `signature` and `signaturePublicKeyId`, so
//! the signed bytes never depend on which key signed them.

use tracing::{debug, warn};

use super::types::{fields, SignatureState, StateTransitionType};
use super::StateTransitionError;
use crate::codec::{self, CanonicalMap, CanonicalMapExt, CodecResult};
use crate::config::fee_for_length;
use crate::crypto::hash::{double_sha256, Hash256};
use crate::crypto::keys::PrivateKey;
use crate::crypto::signatures;
use crate::identifier::Identifier;
use crate::identity::asset_lock::{fetch_asset_lock_output, AssetLockProof};
use crate::identity::{IdentityPublicKey, KeyType};
use crate::storage::StateRepository;

/// Behaviour every state transition shares.
///
/// Implementors supply the envelope accessors and their field layout; the
/// buffer, hash, signing, verification and fee logic is provided.
pub trait StateTransitionLike {
    fn protocol_version(&self) -> u32;
    fn transition_type(&self) -> StateTransitionType;
    fn signature(&self) -> Option<&[u8]>;
    fn set_signature(&mut self, signature: Option<Vec<u8>>);

    /// Wire map, including `protocolVersion` and `type`.
    fn to_object(&self, skip_signature: bool) -> CanonicalMap;

    /// Ids of the contracts, documents or identities this transition touches.
    fn modified_data_ids(&self) -> Vec<Identifier>;

    fn to_buffer(&self, skip_signature: bool) -> CodecResult<Vec<u8>> {
        let mut map = self.to_object(skip_signature);
        map.remove(fields::PROTOCOL_VERSION);
        codec::encode_with_version(self.protocol_version(), &map)
    }

    fn hash(&self, skip_signature: bool) -> CodecResult<Hash256> {
        Ok(double_sha256(&self.to_buffer(skip_signature)?))
    }

    fn signature_state(&self) -> SignatureState {
        match self.signature() {
            Some(_) => SignatureState::Signed,
            None => SignatureState::Unsigned,
        }
    }

    /// Sign the unsigned hash and store the signature.
    fn sign_by_private_key(&mut self, private_key: &PrivateKey) -> Result<(), StateTransitionError> {
        let hash = self.hash(true)?;
        let signature = signatures::sign_hash(private_key, &hash)?;
        self.set_signature(Some(signature));
        Ok(())
    }

    /// `Ok(false)` when the stored signature belongs to another key.
    fn verify_by_public_key(&self, public_key: &[u8]) -> Result<bool, StateTransitionError> {
        let signature = self.signature().ok_or(StateTransitionError::NotSigned)?;
        let hash = self.hash(true)?;
        Ok(signatures::verify_hash(signature, &hash, public_key)?)
    }

    fn verify_by_public_key_hash(&self, public_key_hash: &[u8]) -> Result<bool, StateTransitionError> {
        let signature = self.signature().ok_or(StateTransitionError::NotSigned)?;
        let hash = self.hash(true)?;
        Ok(signatures::verify_hash_by_public_key_hash(
            signature,
            &hash,
            public_key_hash,
        )?)
    }

    /// Fee in credits: unsigned buffer length times the per-byte price.
    fn calculate_fee(&self) -> Result<u64, StateTransitionError> {
        let len = self.to_buffer(true)?.len();
        let fee = fee_for_length(len).ok_or(StateTransitionError::FeeOverflow { len })?;
        debug!(
            transition_type = ?self.transition_type(),
            bytes = len,
            fee,
            "calculated state transition fee"
        );
        Ok(fee)
    }
}

/// Transitions signed with a key registered on the owning identity.
pub trait IdentitySignedTransition: StateTransitionLike {
    fn owner_id(&self) -> Identifier;
    fn signature_public_key_id(&self) -> Option<u32>;
    fn set_signature_public_key_id(&mut self, key_id: Option<u32>);

    /// Sign with `private_key`, recording `identity_key`'s id.
    ///
    /// Fails if the private key is not the one `identity_key` registers,
    /// or if the key type cannot produce compact ECDSA signatures.
    fn sign(
        &mut self,
        identity_key: &IdentityPublicKey,
        private_key: &PrivateKey,
    ) -> Result<(), StateTransitionError> {
        let public_key = private_key.public_key();
        let matches = match identity_key.key_type() {
            KeyType::EcdsaSecp256k1 => public_key.as_bytes().as_slice() == identity_key.data(),
            KeyType::EcdsaHash160 => public_key.hash160().as_slice() == identity_key.data(),
            key_type @ KeyType::Bls12_381 => {
                return Err(StateTransitionError::InvalidIdentityPublicKeyType { key_type })
            }
        };
        if !matches {
            return Err(StateTransitionError::InvalidSignaturePublicKey {
                key_id: identity_key.id(),
            });
        }

        self.set_signature_public_key_id(Some(identity_key.id()));
        self.sign_by_private_key(private_key)
    }

    /// Check the signature against one of the owner's keys.
    ///
    /// Order: no signature, then key id mismatch, then the curve math.
    fn verify_signature(&self, identity_key: &IdentityPublicKey) -> Result<bool, StateTransitionError> {
        if self.signature().is_none() {
            return Err(StateTransitionError::NotSigned);
        }

        let signed_with = self.signature_public_key_id();
        if signed_with != Some(identity_key.id()) {
            warn!(
                owner_id = %self.owner_id(),
                expected = ?signed_with,
                actual = identity_key.id(),
                "signature public key id mismatch"
            );
            return Err(StateTransitionError::KeyMismatch {
                expected: signed_with,
                actual: identity_key.id(),
            });
        }

        match identity_key.key_type() {
            KeyType::EcdsaSecp256k1 => self.verify_by_public_key(identity_key.data()),
            KeyType::EcdsaHash160 => self.verify_by_public_key_hash(identity_key.data()),
            key_type @ KeyType::Bls12_381 => {
                Err(StateTransitionError::InvalidIdentityPublicKeyType { key_type })
            }
        }
    }
}

/// Transitions funded by an asset lock and signed by its one-time key.
pub trait AssetLockFundedTransition: StateTransitionLike {
    fn asset_lock_proof(&self) -> &AssetLockProof;
}

/// Verify that the transition was signed by the key the asset lock output
/// commits to.
pub fn verify_asset_lock_signature<R, T>(repository: &R, transition: &T) -> Result<bool, StateTransitionError>
where
    R: StateRepository + ?Sized,
    T: AssetLockFundedTransition + ?Sized,
{
    if transition.signature().is_none() {
        return Err(StateTransitionError::NotSigned);
    }
    let output = fetch_asset_lock_output(repository, transition.asset_lock_proof())?;
    let public_key_hash = output.asset_lock_public_key_hash()?;
    transition.verify_by_public_key_hash(&public_key_hash)
}

// ---------------------------------------------------------------------------
// Envelope helpers for implementors
// ---------------------------------------------------------------------------

/// Start a wire map with `protocolVersion`, `type` and, unless skipped,
/// `signature`.
pub(crate) fn envelope<T: StateTransitionLike + ?Sized>(transition: &T, skip_signature: bool) -> CanonicalMap {
    let mut map = CanonicalMap::new();
    map.insert(fields::PROTOCOL_VERSION.into(), transition.protocol_version().into());
    map.insert(fields::TYPE.into(), transition.transition_type().into());
    if !skip_signature {
        if let Some(signature) = transition.signature() {
            map.insert(fields::SIGNATURE.into(), signature.into());
        }
    }
    map
}

/// [`envelope`] plus `signaturePublicKeyId` unless skipped.
pub(crate) fn identity_signed_envelope<T: IdentitySignedTransition + ?Sized>(
    transition: &T,
    skip_signature: bool,
) -> CanonicalMap {
    let mut map = envelope(transition, skip_signature);
    if !skip_signature {
        if let Some(key_id) = transition.signature_public_key_id() {
            map.insert(fields::SIGNATURE_PUBLIC_KEY_ID.into(), key_id.into());
        }
    }
    map
}

/// Envelope fields read back from a wire map.
pub(crate) struct Envelope {
    pub protocol_version: u32,
    pub signature: Option<Vec<u8>>,
    pub signature_public_key_id: Option<u32>,
}

impl Envelope {
    pub(crate) fn read(map: &CanonicalMap) -> CodecResult<Self> {
        Ok(Self {
            protocol_version: map.required_u32(fields::PROTOCOL_VERSION)?,
            signature: map.optional_bytes(fields::SIGNATURE)?.map(<[u8]>::to_vec),
            signature_public_key_id: map.optional_u32(fields::SIGNATURE_PUBLIC_KEY_ID)?,
        })
    }
}
