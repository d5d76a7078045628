//! # Cryptographic Primitives
//!
//! Everything hash- and signature-shaped in the protocol flows through here:
//!
//! - **SHA-256**, applied twice, for content hashes, Merkle nodes and
//!   identifier derivation.
//! - **HASH160** for matching public keys against core-chain output scripts.
//! - **secp256k1 ECDSA** with compact recoverable signatures for state
//!   transitions.
//! - An injectable **entropy source** for id derivation.
//!
//! All of it is a thin wrapper around audited RustCrypto crates. Nothing in
//! here is clever, and it should stay that way.

pub mod entropy;
pub mod hash;
pub mod keys;
pub mod signatures;

pub use entropy::{EntropySource, FixedEntropy, OsEntropy, SeededEntropy};
pub use hash::{
    content_hash, derive_data_contract_id, derive_document_id, double_sha256, hash160,
    merkle_root, merkle_tree, sha256, Hash256,
};
pub use keys::{KeyError, PrivateKey, PublicKey};
pub use signatures::{
    recover_public_key, sign, sign_hash, verify, verify_hash, verify_hash_by_public_key_hash,
    SignatureError,
};
