//! # State Transitions
//!
//! Every change to platform state is submitted as a signed state
//! transition. This module defines the six transition kinds, their wire
//! form, and the sign / verify / fee protocol they share.
//!
//! ## Architecture
//!
//! ```text
//! types.rs                 — StateTransitionType tags, SignatureState
//! traits.rs                — StateTransitionLike, IdentitySignedTransition,
//!                            asset-lock signature check
//! data_contract_create.rs  — publish a contract (carries its entropy)
//! data_contract_update.rs  — replace a contract
//! documents_batch.rs       — create / replace / delete documents
//! document_transition.rs   — the per-document actions inside a batch
//! identity_create.rs       — mint an identity from an asset lock
//! identity_top_up.rs       — add credits from another asset lock
//! identity_update.rs       — add or disable identity keys
//! apply.rs                 — write an accepted transition to the repository
//! ```
//!
//! ## Lifecycle
//!
//! 1. A factory builds the transition (unsigned).
//! 2. The client signs it: identity-signed kinds with an identity key,
//!    asset-lock-funded kinds with the asset lock's one-time key.
//! 3. The transition travels as `u32_le(version) || cbor(fields)`.
//! 4. The receiver decodes it through [`StateTransition::from_buffer`],
//!    verifies the signature and charges [`StateTransitionLike::calculate_fee`].
//! 5. [`apply_state_transition`] writes the result through the
//!    [`StateRepository`](crate::storage::StateRepository).

pub mod apply;
pub mod data_contract_create;
pub mod data_contract_update;
pub mod document_transition;
pub mod documents_batch;
pub mod identity_create;
pub mod identity_top_up;
pub mod identity_update;
pub mod traits;
pub mod types;

use thiserror::Error;
use tracing::debug;

pub use apply::{apply_state_transition, ApplyError};
pub use data_contract_create::DataContractCreateTransition;
pub use data_contract_update::DataContractUpdateTransition;
pub use document_transition::{
    DocumentCreateTransition, DocumentDeleteTransition, DocumentReplaceTransition, DocumentTransition,
    DocumentTransitionAction, DocumentTransitionBase,
};
pub use documents_batch::DocumentsBatchTransition;
pub use identity_create::IdentityCreateTransition;
pub use identity_top_up::IdentityTopUpTransition;
pub use identity_update::IdentityUpdateTransition;
pub use traits::{
    verify_asset_lock_signature, AssetLockFundedTransition, IdentitySignedTransition, StateTransitionLike,
};
pub use types::{SignatureState, StateTransitionType};

use crate::codec::{self, CanonicalMap, CanonicalMapExt, CodecError};
use crate::config::is_supported_protocol_version;
use crate::crypto::signatures::SignatureError;
use crate::data_contract::DataContractError;
use crate::identifier::Identifier;
use crate::identity::{AssetLockError, IdentityError, KeyType};

/// Errors raised while decoding, signing or verifying a transition.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateTransitionError {
    /// Verification was asked of a transition that carries no signature.
    #[error("state transition is not signed")]
    NotSigned,

    /// The transition was signed with a different identity key than the
    /// one supplied for verification.
    #[error("signed with public key {expected:?}, verifying with {actual}")]
    KeyMismatch { expected: Option<u32>, actual: u32 },

    #[error("unknown state transition type {transition_type}")]
    InvalidType { transition_type: i64 },

    #[error("unknown document transition action {action}")]
    InvalidDocumentAction { action: i64 },

    /// The private key offered for signing does not belong to the
    /// identity key it claims to sign with.
    #[error("private key does not match identity public key {key_id}")]
    InvalidSignaturePublicKey { key_id: u32 },

    /// Only secp256k1 identity keys can sign transitions.
    #[error("identity public key type {key_type:?} cannot sign state transitions")]
    InvalidIdentityPublicKeyType { key_type: KeyType },

    /// The contract id is not `derive_data_contract_id(owner, entropy)`.
    #[error("data contract id {actual} does not match derived id {expected}")]
    InvalidDataContractId { expected: Identifier, actual: Identifier },

    /// A created document's id is not derived from its contract, owner,
    /// type and entropy.
    #[error("document id {actual} does not match derived id {expected}")]
    InvalidDocumentId { expected: Identifier, actual: Identifier },

    /// Keys were disabled without the time they were disabled at.
    #[error("disabling public keys requires publicKeysDisabledAt")]
    MissingPublicKeysDisabledAt,

    #[error("unsupported protocol version {version}")]
    UnsupportedProtocolVersion { version: u32 },

    #[error("fee for a {len}-byte transition overflows")]
    FeeOverflow { len: usize },

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    DataContract(#[from] DataContractError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    AssetLock(#[from] AssetLockError),
}

/// Any state transition, as decoded from the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum StateTransition {
    DataContractCreate(DataContractCreateTransition),
    DataContractUpdate(DataContractUpdateTransition),
    DocumentsBatch(DocumentsBatchTransition),
    IdentityCreate(IdentityCreateTransition),
    IdentityTopUp(IdentityTopUpTransition),
    IdentityUpdate(IdentityUpdateTransition),
}

/// Forward a call to whichever transition the enum holds.
macro_rules! dispatch {
    ($self:expr, $t:ident => $body:expr) => {
        match $self {
            StateTransition::DataContractCreate($t) => $body,
            StateTransition::DataContractUpdate($t) => $body,
            StateTransition::DocumentsBatch($t) => $body,
            StateTransition::IdentityCreate($t) => $body,
            StateTransition::IdentityTopUp($t) => $body,
            StateTransition::IdentityUpdate($t) => $body,
        }
    };
}

impl StateTransition {
    /// Decode any transition from its wire map. The `type` tag is read
    /// first and decides which decoder runs.
    pub fn from_object(map: &CanonicalMap) -> Result<Self, StateTransitionError> {
        let transition_type = StateTransitionType::try_from(map.required_integer(types::fields::TYPE)?)?;
        debug!(?transition_type, "decoding state transition");

        Ok(match transition_type {
            StateTransitionType::DataContractCreate => {
                Self::DataContractCreate(DataContractCreateTransition::from_object(map)?)
            }
            StateTransitionType::DataContractUpdate => {
                Self::DataContractUpdate(DataContractUpdateTransition::from_object(map)?)
            }
            StateTransitionType::DocumentsBatch => Self::DocumentsBatch(DocumentsBatchTransition::from_object(map)?),
            StateTransitionType::IdentityCreate => Self::IdentityCreate(IdentityCreateTransition::from_object(map)?),
            StateTransitionType::IdentityTopUp => Self::IdentityTopUp(IdentityTopUpTransition::from_object(map)?),
            StateTransitionType::IdentityUpdate => Self::IdentityUpdate(IdentityUpdateTransition::from_object(map)?),
        })
    }

    /// Decode `u32_le(version) || cbor(fields)`.
    pub fn from_buffer(bytes: &[u8]) -> Result<Self, StateTransitionError> {
        let (version, mut map) = codec::decode_with_version(bytes)?;
        if !is_supported_protocol_version(version) {
            return Err(StateTransitionError::UnsupportedProtocolVersion { version });
        }
        map.insert(types::fields::PROTOCOL_VERSION.into(), version.into());
        Self::from_object(&map)
    }

    /// The identity-signed view, for kinds signed with an identity key.
    pub fn as_identity_signed(&self) -> Option<&dyn IdentitySignedTransition> {
        match self {
            Self::DataContractCreate(t) => Some(t),
            Self::DataContractUpdate(t) => Some(t),
            Self::DocumentsBatch(t) => Some(t),
            Self::IdentityUpdate(t) => Some(t),
            Self::IdentityCreate(_) | Self::IdentityTopUp(_) => None,
        }
    }

    pub fn as_identity_signed_mut(&mut self) -> Option<&mut dyn IdentitySignedTransition> {
        match self {
            Self::DataContractCreate(t) => Some(t),
            Self::DataContractUpdate(t) => Some(t),
            Self::DocumentsBatch(t) => Some(t),
            Self::IdentityUpdate(t) => Some(t),
            Self::IdentityCreate(_) | Self::IdentityTopUp(_) => None,
        }
    }

    /// The asset-lock-funded view, for identity create and top-up.
    pub fn as_asset_lock_funded(&self) -> Option<&dyn AssetLockFundedTransition> {
        match self {
            Self::IdentityCreate(t) => Some(t),
            Self::IdentityTopUp(t) => Some(t),
            _ => None,
        }
    }
}

impl StateTransitionLike for StateTransition {
    fn protocol_version(&self) -> u32 {
        dispatch!(self, t => t.protocol_version())
    }

    fn transition_type(&self) -> StateTransitionType {
        dispatch!(self, t => t.transition_type())
    }

    fn signature(&self) -> Option<&[u8]> {
        dispatch!(self, t => t.signature())
    }

    fn set_signature(&mut self, signature: Option<Vec<u8>>) {
        dispatch!(self, t => t.set_signature(signature))
    }

    fn to_object(&self, skip_signature: bool) -> CanonicalMap {
        dispatch!(self, t => t.to_object(skip_signature))
    }

    fn modified_data_ids(&self) -> Vec<Identifier> {
        dispatch!(self, t => t.modified_data_ids())
    }
}

impl From<DataContractCreateTransition> for StateTransition {
    fn from(t: DataContractCreateTransition) -> Self {
        Self::DataContractCreate(t)
    }
}

impl From<DataContractUpdateTransition> for StateTransition {
    fn from(t: DataContractUpdateTransition) -> Self {
        Self::DataContractUpdate(t)
    }
}

impl From<DocumentsBatchTransition> for StateTransition {
    fn from(t: DocumentsBatchTransition) -> Self {
        Self::DocumentsBatch(t)
    }
}

impl From<IdentityCreateTransition> for StateTransition {
    fn from(t: IdentityCreateTransition) -> Self {
        Self::IdentityCreate(t)
    }
}

impl From<IdentityTopUpTransition> for StateTransition {
    fn from(t: IdentityTopUpTransition) -> Self {
        Self::IdentityTopUp(t)
    }
}

impl From<IdentityUpdateTransition> for StateTransition {
    fn from(t: IdentityUpdateTransition) -> Self {
        Self::IdentityUpdate(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::PrivateKey;
    use crate::data_contract::tests::sample_contract;
    use crate::identity::{ChainAssetLockProof, IdentityPublicKey};

    fn all_kinds() -> Vec<StateTransition> {
        let proof = ChainAssetLockProof::from_parts(7, &[1; 32], 0);
        let key = IdentityPublicKey::new(0, KeyType::EcdsaHash160, vec![4; 20]).unwrap();
        vec![
            DataContractCreateTransition::new(sample_contract(), [2; 32]).into(),
            DataContractUpdateTransition::new(sample_contract()).into(),
            DocumentsBatchTransition::new(Identifier::new([1; 32]), vec![]).into(),
            IdentityCreateTransition::new(proof.clone().into(), vec![key]).into(),
            IdentityTopUpTransition::new(Identifier::new([5; 32]), proof.into()).into(),
            IdentityUpdateTransition::new(Identifier::new([5; 32]), 1).into(),
        ]
    }

    #[test]
    fn test_buffer_dispatch_for_every_kind() {
        for transition in all_kinds() {
            let buffer = transition.to_buffer(false).unwrap();
            let decoded = StateTransition::from_buffer(&buffer).unwrap();
            assert_eq!(decoded.transition_type(), transition.transition_type());
            assert_eq!(decoded.to_buffer(false).unwrap(), buffer);
        }
    }

    #[test]
    fn test_unknown_type_tag() {
        let mut map = all_kinds()[0].to_object(false);
        map.insert("type".into(), 9i64.into());
        assert_eq!(
            StateTransition::from_object(&map),
            Err(StateTransitionError::InvalidType { transition_type: 9 })
        );
    }

    #[test]
    fn test_unsupported_version() {
        let mut buffer = all_kinds()[0].to_buffer(false).unwrap();
        buffer[..4].copy_from_slice(&99u32.to_le_bytes());
        assert_eq!(
            StateTransition::from_buffer(&buffer),
            Err(StateTransitionError::UnsupportedProtocolVersion { version: 99 })
        );
    }

    #[test]
    fn test_version_zero_rejected() {
        let mut buffer = all_kinds()[0].to_buffer(false).unwrap();
        buffer[..4].copy_from_slice(&0u32.to_le_bytes());
        assert_eq!(
            StateTransition::from_buffer(&buffer),
            Err(StateTransitionError::UnsupportedProtocolVersion { version: 0 })
        );
    }

    #[test]
    fn test_views_split_by_signer() {
        for transition in all_kinds() {
            let identity_signed = transition.as_identity_signed().is_some();
            assert_eq!(identity_signed, transition.transition_type().is_identity_signed());
            assert_eq!(transition.as_asset_lock_funded().is_some(), !identity_signed);
        }
    }

    #[test]
    fn test_sign_through_enum() {
        let private_key = PrivateKey::from_bytes(&[0x55; 32]).unwrap();
        let mut transition = all_kinds().remove(1);
        assert!(matches!(
            transition.verify_by_public_key(private_key.public_key().as_bytes()),
            Err(StateTransitionError::NotSigned)
        ));
        transition.sign_by_private_key(&private_key).unwrap();
        assert!(transition
            .verify_by_public_key(private_key.public_key().as_bytes())
            .unwrap());

        let other = PrivateKey::from_bytes(&[0x66; 32]).unwrap();
        assert!(!transition
            .verify_by_public_key(other.public_key().as_bytes())
            .unwrap());
    }

    #[test]
    fn test_unsigned_hash_ignores_signature() {
        let mut transition = all_kinds().remove(2);
        let before = transition.hash(true).unwrap();
        transition.set_signature(Some(vec![1; 65]));
        assert_eq!(transition.hash(true).unwrap(), before);
        assert_ne!(transition.hash(false).unwrap(), before);
    }
}
