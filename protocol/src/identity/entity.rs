//! The identity entity.

use serde_json::json;

use super::asset_lock::AssetLockProof;
use super::public_key::IdentityPublicKey;
use super::IdentityError;
use crate::codec::{self, array_of_maps, CanonicalMap, CanonicalMapExt, CanonicalValue, CodecResult};
use crate::config::{PROTOCOL_VERSION, PUBLIC_KEY_HASH_LENGTH};
use crate::crypto::hash::{double_sha256, Hash256};
use crate::identifier::{required_identifier, Identifier};

/// A platform identity: an id bound to one asset lock out point, the keys
/// it signs with, and a credit balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub protocol_version: u32,
    pub id: Identifier,
    pub public_keys: Vec<IdentityPublicKey>,
    /// Credits.
    pub balance: u64,
    pub revision: u32,
    /// The proof this identity was created from. Not part of the wire form.
    pub asset_lock_proof: Option<AssetLockProof>,
}

impl Identity {
    pub fn new(id: Identifier, public_keys: Vec<IdentityPublicKey>) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            id,
            public_keys,
            balance: 0,
            revision: 0,
            asset_lock_proof: None,
        }
    }

    pub fn get_public_key_by_id(&self, key_id: u32) -> Option<&IdentityPublicKey> {
        self.public_keys.iter().find(|key| key.id() == key_id)
    }

    pub fn get_public_key_by_id_mut(&mut self, key_id: u32) -> Option<&mut IdentityPublicKey> {
        self.public_keys.iter_mut().find(|key| key.id() == key_id)
    }

    /// HASH160 of every registered key, in key order.
    pub fn public_key_hashes(&self) -> Vec<[u8; PUBLIC_KEY_HASH_LENGTH]> {
        self.public_keys.iter().map(IdentityPublicKey::hash).collect()
    }

    /// Add `credits` to the balance and return the new total.
    pub fn increase_balance(&mut self, credits: u64) -> Result<u64, IdentityError> {
        self.balance = self
            .balance
            .checked_add(credits)
            .ok_or(IdentityError::BalanceOverflow {
                balance: self.balance,
                credits,
            })?;
        Ok(self.balance)
    }

    /// Fails if the balance does not fit the signed 64-bit wire integer.
    pub fn to_object(&self) -> CodecResult<CanonicalMap> {
        let mut map = CanonicalMap::new();
        map.insert("protocolVersion".into(), self.protocol_version.into());
        map.insert("id".into(), self.id.into());
        map.insert(
            "publicKeys".into(),
            CanonicalValue::Array(
                self.public_keys
                    .iter()
                    .map(|key| key.to_object().into())
                    .collect(),
            ),
        );
        map.insert("balance".into(), CanonicalValue::from_u64(self.balance)?);
        map.insert("revision".into(), self.revision.into());
        Ok(map)
    }

    pub fn from_object(map: &CanonicalMap) -> Result<Self, IdentityError> {
        let public_keys = array_of_maps("publicKeys", map.required_array("publicKeys")?)?
            .into_iter()
            .map(IdentityPublicKey::from_object)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            protocol_version: map.required_u32("protocolVersion")?,
            id: required_identifier(map, "id")?,
            public_keys,
            balance: map.required_u64("balance")?,
            revision: map.required_u32("revision")?,
            asset_lock_proof: None,
        })
    }

    /// Versioned binary form.
    pub fn to_buffer(&self) -> CodecResult<Vec<u8>> {
        let mut map = self.to_object()?;
        map.remove("protocolVersion");
        codec::encode_with_version(self.protocol_version, &map)
    }

    pub fn from_buffer(bytes: &[u8]) -> Result<Self, IdentityError> {
        let (version, mut map) = codec::decode_with_version(bytes)?;
        map.insert("protocolVersion".into(), version.into());
        Self::from_object(&map)
    }

    pub fn hash(&self) -> CodecResult<Hash256> {
        Ok(double_sha256(&self.to_buffer()?))
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "protocolVersion": self.protocol_version,
            "id": self.id.to_string(),
            "publicKeys": self.public_keys.iter().map(IdentityPublicKey::to_json).collect::<Vec<_>>(),
            "balance": self.balance,
            "revision": self.revision,
        })
    }
}
