//! Minting an identity from an asset lock.
//!
//! Signed by the one-time key the asset lock output commits to, not by an
//! identity key: the identity does not exist yet.

use super::traits::{envelope, AssetLockFundedTransition, Envelope, StateTransitionLike};
use super::types::StateTransitionType;
use super::StateTransitionError;
use crate::codec::{array_of_maps, CanonicalMap, CanonicalMapExt, CanonicalValue};
use crate::config::PROTOCOL_VERSION;
use crate::identifier::Identifier;
use crate::identity::{AssetLockProof, IdentityPublicKey};

#[derive(Debug, Clone, PartialEq)]
pub struct IdentityCreateTransition {
    pub protocol_version: u32,
    pub asset_lock_proof: AssetLockProof,
    pub public_keys: Vec<IdentityPublicKey>,
    pub signature: Option<Vec<u8>>,
    /// Derived from the proof; never on the wire.
    identity_id: Identifier,
}

impl IdentityCreateTransition {
    pub fn new(asset_lock_proof: AssetLockProof, public_keys: Vec<IdentityPublicKey>) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            identity_id: asset_lock_proof.create_identifier(),
            asset_lock_proof,
            public_keys,
            signature: None,
        }
    }

    pub fn identity_id(&self) -> Identifier {
        self.identity_id
    }

    pub fn from_object(map: &CanonicalMap) -> Result<Self, StateTransitionError> {
        let envelope = Envelope::read(map)?;
        let asset_lock_proof = AssetLockProof::from_object(map.required_map("assetLockProof")?)?;
        let public_keys = array_of_maps("publicKeys", map.required_array("publicKeys")?)?
            .into_iter()
            .map(IdentityPublicKey::from_object)
            .collect::<Result<Vec<_>, _>>()?;

        let mut transition = Self::new(asset_lock_proof, public_keys);
        transition.protocol_version = envelope.protocol_version;
        transition.signature = envelope.signature;
        Ok(transition)
    }
}

impl StateTransitionLike for IdentityCreateTransition {
    fn protocol_version(&self) -> u32 {
        self.protocol_version
    }

    fn transition_type(&self) -> StateTransitionType {
        StateTransitionType::IdentityCreate
    }

    fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    fn set_signature(&mut self, signature: Option<Vec<u8>>) {
        self.signature = signature;
    }

    fn to_object(&self, skip_signature: bool) -> CanonicalMap {
        let mut map = envelope(self, skip_signature);
        map.insert("assetLockProof".into(), self.asset_lock_proof.to_object().into());
        map.insert(
            "publicKeys".into(),
            CanonicalValue::Array(
                self.public_keys
                    .iter()
                    .map(|key| key.to_object().into())
                    .collect(),
            ),
        );
        map
    }

    fn modified_data_ids(&self) -> Vec<Identifier> {
        vec![self.identity_id]
    }
}

impl AssetLockFundedTransition for IdentityCreateTransition {
    fn asset_lock_proof(&self) -> &AssetLockProof {
        &self.asset_lock_proof
    }
}
