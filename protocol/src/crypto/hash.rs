//! # Hashing Utilities
//!
//! One primitive does almost all the work here: `double_sha256`, i.e.
//! `SHA-256(SHA-256(data))`. Content hashes, Merkle nodes, transition hashes,
//! out-point hashes and every derived identifier use it. If you find
//! yourself reaching for a different hash function, you are about to fork
//! the network.
//!
//! The one exception is [`hash160`] (`RIPEMD-160(SHA-256(data))`), which
//! exists because core-chain asset lock outputs commit to public keys that
//! way and we have to compare against them.
//!
//! ## Merkle trees
//!
//! [`merkle_tree`] returns every level, flattened, leaves first. Within a
//! level, adjacent hashes are paired; a trailing odd hash is paired with
//! itself. The root is the last element. A single leaf is its own root,
//! which differs from Bitcoin-style trees that always hash at least once.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::codec::{self, CanonicalValue, CodecResult};
use crate::config::PUBLIC_KEY_HASH_LENGTH;
use crate::identifier::Identifier;

/// A 32-byte SHA-256 digest.
pub type Hash256 = [u8; 32];

/// Compute the SHA-256 hash of the input data.
pub fn sha256(data: &[u8]) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the double-SHA-256 hash: `SHA-256(SHA-256(data))`.
///
/// # Example
///
/// ```
/// use dpp::crypto::double_sha256;
///
/// let digest = double_sha256(b"raw transaction bytes");
/// assert_eq!(digest.len(), 32);
/// ```
pub fn double_sha256(data: &[u8]) -> Hash256 {
    sha256(&sha256(data))
}

/// Double SHA-256 over several slices fed in order, without building the
/// concatenated buffer first.
pub fn double_sha256_multi(parts: &[&[u8]]) -> Hash256 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let first: Hash256 = hasher.finalize().into();
    sha256(&first)
}

/// `RIPEMD-160(SHA-256(data))`, the public-key hash used by core-chain
/// output scripts.
pub fn hash160(data: &[u8]) -> [u8; PUBLIC_KEY_HASH_LENGTH] {
    let mut hasher = Ripemd160::new();
    hasher.update(sha256(data));
    hasher.finalize().into()
}

/// Double SHA-256 of the canonical encoding of a map or array.
pub fn content_hash(value: &CanonicalValue) -> CodecResult<Hash256> {
    Ok(double_sha256(&codec::encode(value)?))
}

// ---------------------------------------------------------------------------
// Merkle tree
// ---------------------------------------------------------------------------

/// Build the flattened Merkle tree over `leaves`.
///
/// The result starts with the leaves, followed by each parent level in
/// turn. An empty input yields an empty tree.
pub fn merkle_tree(leaves: &[Hash256]) -> Vec<Hash256> {
    let mut tree: Vec<Hash256> = leaves.to_vec();
    let mut level_start = 0;
    let mut size = leaves.len();

    while size > 1 {
        for i in (0..size).step_by(2) {
            let left = tree[level_start + i];
            // Odd tail pairs with itself.
            let right = tree[level_start + (i + 1).min(size - 1)];
            tree.push(double_sha256_multi(&[&left, &right]));
        }
        level_start += size;
        size = (size + 1) / 2;
    }

    tree
}

/// Root of a tree built by [`merkle_tree`], or `None` for an empty tree.
pub fn merkle_root(tree: &[Hash256]) -> Option<Hash256> {
    tree.last().copied()
}

// ---------------------------------------------------------------------------
// Identifier derivation
// ---------------------------------------------------------------------------

/// `double_sha256(owner_id || entropy)`.
pub fn derive_data_contract_id(owner_id: &Identifier, entropy: &[u8]) -> Identifier {
    Identifier::new(double_sha256_multi(&[owner_id.as_ref(), entropy]))
}

/// `double_sha256(data_contract_id || owner_id || utf8(document_type) || entropy)`.
pub fn derive_document_id(
    data_contract_id: &Identifier,
    owner_id: &Identifier,
    document_type: &str,
    entropy: &[u8],
) -> Identifier {
    Identifier::new(double_sha256_multi(&[
        data_contract_id.as_ref(),
        owner_id.as_ref(),
        document_type.as_bytes(),
        entropy,
    ]))
}
