//! Adding credits to an existing identity from a fresh asset lock.

use super::traits::{envelope, AssetLockFundedTransition, Envelope, StateTransitionLike};
use super::types::StateTransitionType;
use super::StateTransitionError;
use crate::codec::{CanonicalMap, CanonicalMapExt};
use crate::config::PROTOCOL_VERSION;
use crate::identifier::{required_identifier, Identifier};
use crate::identity::AssetLockProof;

#[derive(Debug, Clone, PartialEq)]
pub struct IdentityTopUpTransition {
    pub protocol_version: u32,
    pub asset_lock_proof: AssetLockProof,
    pub identity_id: Identifier,
    pub signature: Option<Vec<u8>>,
}

impl IdentityTopUpTransition {
    pub fn new(identity_id: Identifier, asset_lock_proof: AssetLockProof) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            asset_lock_proof,
            identity_id,
            signature: None,
        }
    }

    pub fn from_object(map: &CanonicalMap) -> Result<Self, StateTransitionError> {
        let envelope = Envelope::read(map)?;
        Ok(Self {
            protocol_version: envelope.protocol_version,
            asset_lock_proof: AssetLockProof::from_object(map.required_map("assetLockProof")?)?,
            identity_id: required_identifier(map, "identityId")?,
            signature: envelope.signature,
        })
    }
}

impl StateTransitionLike for IdentityTopUpTransition {
    fn protocol_version(&self) -> u32 {
        self.protocol_version
    }

    fn transition_type(&self) -> StateTransitionType {
        StateTransitionType::IdentityTopUp
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
        map.insert("identityId".into(), self.identity_id.into());
        map
    }

    fn modified_data_ids(&self) -> Vec<Identifier> {
        vec![self.identity_id]
    }
}

impl AssetLockFundedTransition for IdentityTopUpTransition {
    fn asset_lock_proof(&self) -> &AssetLockProof {
        &self.asset_lock_proof
    }
}
