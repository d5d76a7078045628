//! Chain asset lock proofs: the funding transaction is already buried
//! under a chain lock, so the proof only names it by out point and the
//! locked height it is known to be under.

use super::{AssetLockError, AssetLockProofType};
use crate::codec::{CanonicalMap, CanonicalMapExt};
use crate::config::OUT_POINT_LENGTH;
use crate::crypto::hash::Hash256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainAssetLockProof {
    pub core_chain_locked_height: u32,
    pub out_point: [u8; OUT_POINT_LENGTH],
}

impl ChainAssetLockProof {
    pub fn new(core_chain_locked_height: u32, out_point: [u8; OUT_POINT_LENGTH]) -> Self {
        Self {
            core_chain_locked_height,
            out_point,
        }
    }

    /// Build the out point from a transaction hash and output index.
    pub fn from_parts(core_chain_locked_height: u32, tx_hash: &Hash256, output_index: u32) -> Self {
        let mut out_point = [0u8; OUT_POINT_LENGTH];
        out_point[..32].copy_from_slice(tx_hash);
        out_point[32..].copy_from_slice(&output_index.to_le_bytes());
        Self::new(core_chain_locked_height, out_point)
    }

    pub fn tx_hash(&self) -> Hash256 {
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&self.out_point[..32]);
        hash
    }

    pub fn output_index(&self) -> u32 {
        let mut index = [0u8; 4];
        index.copy_from_slice(&self.out_point[32..]);
        u32::from_le_bytes(index)
    }

    pub fn to_object(&self) -> CanonicalMap {
        let mut map = CanonicalMap::new();
        map.insert("type".into(), AssetLockProofType::Chain.into());
        map.insert(
            "coreChainLockedHeight".into(),
            self.core_chain_locked_height.into(),
        );
        map.insert("outPoint".into(), self.out_point.to_vec().into());
        map
    }

    pub fn from_object(map: &CanonicalMap) -> Result<Self, AssetLockError> {
        Ok(Self {
            core_chain_locked_height: map.required_u32("coreChainLockedHeight")?,
            out_point: map.required_fixed_bytes::<OUT_POINT_LENGTH>("outPoint")?,
        })
    }
}
