//! Instant asset lock proofs: the funding transaction travels with the
//! proof, together with the quorum-signed instant lock that finalized it.

use super::transaction::{CoreTransaction, TransactionOutput};
use super::{AssetLockError, AssetLockProofType};
use crate::codec::{CanonicalMap, CanonicalMapExt};
use crate::config::OUT_POINT_LENGTH;
use crate::crypto::hash::double_sha256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantAssetLockProof {
    /// Serialized instant lock. Carried opaquely; quorum signature checks
    /// belong to the consensus layer.
    pub instant_lock: Vec<u8>,
    /// Raw core-chain transaction holding the asset lock output.
    pub transaction: Vec<u8>,
    pub output_index: u32,
}

impl InstantAssetLockProof {
    pub fn new(instant_lock: Vec<u8>, transaction: Vec<u8>, output_index: u32) -> Self {
        Self {
            instant_lock,
            transaction,
            output_index,
        }
    }

    /// `double_sha256(transaction) || u32_le(output_index)`.
    pub fn out_point(&self) -> [u8; OUT_POINT_LENGTH] {
        let mut out_point = [0u8; OUT_POINT_LENGTH];
        out_point[..32].copy_from_slice(&double_sha256(&self.transaction));
        out_point[32..].copy_from_slice(&self.output_index.to_le_bytes());
        out_point
    }

    /// Parse the embedded transaction and return the referenced output.
    pub fn output(&self) -> Result<TransactionOutput, AssetLockError> {
        let transaction = CoreTransaction::from_bytes(&self.transaction)?;
        transaction.output(self.output_index).cloned()
    }

    pub fn to_object(&self) -> CanonicalMap {
        let mut map = CanonicalMap::new();
        map.insert("type".into(), AssetLockProofType::Instant.into());
        map.insert("instantLock".into(), self.instant_lock.clone().into());
        map.insert("transaction".into(), self.transaction.clone().into());
        map.insert("outputIndex".into(), self.output_index.into());
        map
    }

    pub fn from_object(map: &CanonicalMap) -> Result<Self, AssetLockError> {
        Ok(Self {
            instant_lock: map.required_bytes("instantLock")?.to_vec(),
            transaction: map.required_bytes("transaction")?.to_vec(),
            output_index: map.required_u32("outputIndex")?,
        })
    }
}
