//! # Identity Module
//!
//! Platform identities and everything needed to mint and fund them.
//!
//! The stack is layered:
//!
//! 1. **Asset lock** ([`asset_lock`]): a burned core-chain output, and the
//!    proof that points at it. The out point decides the identity's id.
//! 2. **Public keys** ([`IdentityPublicKey`]): secp256k1 (raw or hashed) or
//!    BLS keys the identity signs transitions with.
//! 3. **Identity** ([`Identity`]): id, keys, credit balance, revision.
//! 4. **Factory** ([`IdentityFactory`]): builds identities and the
//!    create / top-up / update transitions that move them through their
//!    lifecycle.

pub mod asset_lock;
pub mod entity;
pub mod factory;
pub mod public_key;

use thiserror::Error;

pub use asset_lock::{AssetLockError, AssetLockProof, ChainAssetLockProof, InstantAssetLockProof};
pub use entity::Identity;
pub use factory::IdentityFactory;
pub use public_key::{IdentityPublicKey, KeyType};

use crate::codec::CodecError;
use crate::identifier::Identifier;

/// Errors from building, decoding or mutating identities.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("unknown identity public key type {key_type}")]
    UnknownKeyType { key_type: i64 },

    /// Key data does not have the length its type requires.
    #[error("public key {key_id} data must be {expected} bytes, got {actual}")]
    InvalidKeyData {
        key_id: u32,
        expected: usize,
        actual: usize,
    },

    #[error("identity has no public key with id {key_id}")]
    KeyNotFound { key_id: u32 },

    #[error("adding {credits} credits to balance {balance} overflows")]
    BalanceOverflow { balance: u64, credits: u64 },

    #[error("identity revision {revision} cannot be incremented")]
    RevisionOverflow { revision: u32 },

    /// Identities decoded from the wire do not carry the proof they were
    /// created from.
    #[error("identity {identity_id} has no asset lock proof")]
    MissingAssetLockProof { identity_id: Identifier },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    AssetLock(#[from] AssetLockError),
}
