//! # Asset Lock Proofs
//!
//! An asset lock is a core-chain output that burns duffs and commits to a
//! public-key hash. Platform identities are funded from these: one output
//! creates or tops up exactly one identity, and the identity's id is the
//! double SHA-256 of the output's out point.
//!
//! Two proof kinds exist:
//!
//! - **Instant** ([`InstantAssetLockProof`]): carries the transaction itself
//!   plus the instant lock that finalized it.
//! - **Chain** ([`ChainAssetLockProof`]): names the out point of a
//!   transaction that is already chain-locked; the transaction is looked up
//!   through the [`StateRepository`](crate::storage::StateRepository).
//!
//! The "already used" rule is not enforced here on its own: callers check
//! [`ensure_out_point_unused`] before applying, and the apply step marks the
//! out point used afterwards. Those two calls are a check-then-act sequence
//! and need external serialization if transitions are applied concurrently.

pub mod chain;
pub mod instant;
pub mod output;
pub mod transaction;

use thiserror::Error;

pub use chain::ChainAssetLockProof;
pub use instant::InstantAssetLockProof;
pub use output::{credits_from_satoshis, ensure_out_point_unused, fetch_asset_lock_output};
pub use transaction::{CoreTransaction, TransactionInput, TransactionOutput};

use crate::codec::{CanonicalMap, CanonicalMapExt, CanonicalValue, CodecError};
use crate::config::OUT_POINT_LENGTH;
use crate::crypto::hash::double_sha256;
use crate::identifier::Identifier;
use crate::storage::RepositoryError;

/// Errors from decoding or resolving asset lock proofs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssetLockError {
    /// The proof's `type` tag names no known proof kind.
    #[error("unknown asset lock proof type {proof_type}")]
    UnknownProofType { proof_type: i64 },

    /// A chain proof references a transaction the repository does not know.
    #[error("asset lock transaction {tx_hash} not found")]
    TransactionNotFound { tx_hash: String },

    /// The transaction has fewer outputs than the proof's index implies.
    #[error("output {output_index} not found in transaction with {output_count} outputs")]
    OutputNotFound { output_index: u32, output_count: usize },

    /// The embedded or fetched transaction could not be parsed.
    #[error("invalid core transaction: {0}")]
    InvalidTransaction(String),

    /// The output script is not `OP_RETURN <20-byte public key hash>`.
    #[error("output script {script} is not an asset lock script")]
    InvalidOutputScript { script: String },

    /// Converting the locked amount to credits overflowed.
    #[error("{satoshis} satoshis overflow the credit range")]
    CreditsOverflow { satoshis: u64 },

    /// The out point has already funded an identity.
    #[error("asset lock out point {out_point} was already used")]
    OutPointAlreadyUsed { out_point: String },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Wire tags for the two proof kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AssetLockProofType {
    Instant = 0,
    Chain = 1,
}

impl TryFrom<i64> for AssetLockProofType {
    type Error = AssetLockError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Instant),
            1 => Ok(Self::Chain),
            other => Err(AssetLockError::UnknownProofType { proof_type: other }),
        }
    }
}

impl From<AssetLockProofType> for CanonicalValue {
    fn from(proof_type: AssetLockProofType) -> Self {
        CanonicalValue::from(proof_type as u32)
    }
}

/// Proof that a core-chain output was locked to fund platform credits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLockProof {
    Instant(InstantAssetLockProof),
    Chain(ChainAssetLockProof),
}

impl AssetLockProof {
    pub fn proof_type(&self) -> AssetLockProofType {
        match self {
            Self::Instant(_) => AssetLockProofType::Instant,
            Self::Chain(_) => AssetLockProofType::Chain,
        }
    }

    /// Canonical 36-byte out point: transaction hash then little-endian
    /// output index.
    pub fn out_point(&self) -> [u8; OUT_POINT_LENGTH] {
        match self {
            Self::Instant(proof) => proof.out_point(),
            Self::Chain(proof) => proof.out_point,
        }
    }

    /// The identity id this proof funds: `double_sha256(out_point)`.
    pub fn create_identifier(&self) -> Identifier {
        Identifier::new(double_sha256(&self.out_point()))
    }

    pub fn to_object(&self) -> CanonicalMap {
        match self {
            Self::Instant(proof) => proof.to_object(),
            Self::Chain(proof) => proof.to_object(),
        }
    }

    /// Decode a proof, dispatching on its `type` tag.
    pub fn from_object(map: &CanonicalMap) -> Result<Self, AssetLockError> {
        match AssetLockProofType::try_from(map.required_integer("type")?)? {
            AssetLockProofType::Instant => Ok(Self::Instant(InstantAssetLockProof::from_object(map)?)),
            AssetLockProofType::Chain => Ok(Self::Chain(ChainAssetLockProof::from_object(map)?)),
        }
    }
}

impl From<InstantAssetLockProof> for AssetLockProof {
    fn from(proof: InstantAssetLockProof) -> Self {
        Self::Instant(proof)
    }
}

impl From<ChainAssetLockProof> for AssetLockProof {
    fn from(proof: ChainAssetLockProof) -> Self {
        Self::Chain(proof)
    }
}
