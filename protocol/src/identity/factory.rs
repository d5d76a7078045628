//! Building identities, asset lock proofs and identity transitions.

use chrono::Utc;
use tracing::debug;

use super::asset_lock::{AssetLockProof, ChainAssetLockProof, InstantAssetLockProof};
use super::{Identity, IdentityError, IdentityPublicKey};
use crate::codec::CanonicalMap;
use crate::config::OUT_POINT_LENGTH;
use crate::identifier::Identifier;
use crate::state_transition::{IdentityCreateTransition, IdentityTopUpTransition, IdentityUpdateTransition};

/// Stateless: identity ids come from asset lock out points, not entropy.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityFactory;

impl IdentityFactory {
    pub fn new() -> Self {
        Self
    }

    /// An identity bound to `asset_lock_proof`, with zero balance until the
    /// create transition is applied.
    pub fn create(&self, asset_lock_proof: AssetLockProof, public_keys: Vec<IdentityPublicKey>) -> Identity {
        let mut identity = Identity::new(asset_lock_proof.create_identifier(), public_keys);
        identity.asset_lock_proof = Some(asset_lock_proof);
        debug!(identity_id = %identity.id, keys = identity.public_keys.len(), "created identity");
        identity
    }

    pub fn create_from_object(&self, map: &CanonicalMap) -> Result<Identity, IdentityError> {
        Identity::from_object(map)
    }

    pub fn create_from_buffer(&self, bytes: &[u8]) -> Result<Identity, IdentityError> {
        Identity::from_buffer(bytes)
    }

    pub fn create_instant_asset_lock_proof(
        &self,
        instant_lock: Vec<u8>,
        transaction: Vec<u8>,
        output_index: u32,
    ) -> InstantAssetLockProof {
        InstantAssetLockProof::new(instant_lock, transaction, output_index)
    }

    pub fn create_chain_asset_lock_proof(
        &self,
        core_chain_locked_height: u32,
        out_point: [u8; OUT_POINT_LENGTH],
    ) -> ChainAssetLockProof {
        ChainAssetLockProof::new(core_chain_locked_height, out_point)
    }

    /// Fails for identities without the proof they were created from.
    pub fn create_identity_create_transition(
        &self,
        identity: &Identity,
    ) -> Result<IdentityCreateTransition, IdentityError> {
        let proof = identity
            .asset_lock_proof
            .clone()
            .ok_or(IdentityError::MissingAssetLockProof {
                identity_id: identity.id,
            })?;
        Ok(IdentityCreateTransition::new(proof, identity.public_keys.clone()))
    }

    pub fn create_identity_top_up_transition(
        &self,
        identity_id: Identifier,
        asset_lock_proof: AssetLockProof,
    ) -> IdentityTopUpTransition {
        IdentityTopUpTransition::new(identity_id, asset_lock_proof)
    }

    /// Move `identity` to its next revision, adding and disabling keys.
    ///
    /// Keys to disable must exist on the identity. When any are disabled the
    /// transition carries the current time as `publicKeysDisabledAt`.
    pub fn create_identity_update_transition(
        &self,
        identity: &Identity,
        add_public_keys: Vec<IdentityPublicKey>,
        disable_public_keys: Vec<u32>,
    ) -> Result<IdentityUpdateTransition, IdentityError> {
        if let Some(&key_id) = disable_public_keys
            .iter()
            .find(|&&key_id| identity.get_public_key_by_id(key_id).is_none())
        {
            return Err(IdentityError::KeyNotFound { key_id });
        }
        let revision = identity
            .revision
            .checked_add(1)
            .ok_or(IdentityError::RevisionOverflow {
                revision: identity.revision,
            })?;

        let mut transition = IdentityUpdateTransition::new(identity.id, revision);
        if !disable_public_keys.is_empty() {
            transition.public_keys_disabled_at = Some(Utc::now().timestamp_millis());
        }
        transition.add_public_keys = add_public_keys;
        transition.disable_public_keys = disable_public_keys;
        Ok(transition)
    }
}
