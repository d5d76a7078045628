// Copyright (c) 2026 Data Platform Protocol Contributors. MIT License.
// See LICENSE for details.

//! # Data Platform Protocol — Core Library
//!
//! The rules every node and client of the data platform agree on: how
//! contracts, documents and identities are encoded, how their ids are
//! derived, how state transitions are signed and priced, and how an asset
//! lock on the core chain turns into platform credits.
//!
//! ## Architecture
//!
//! The crate is layered leaves first:
//!
//! - **codec** — Canonical CBOR with versioned framing. Same value, same bytes.
//! - **crypto** — Double SHA-256, HASH160, Merkle roots, compact secp256k1
//!   signatures, injectable entropy.
//! - **identifier** — 32-byte ids, rendered base58.
//! - **data_contract** — Application schemas and their factory.
//! - **document** — Records of a contract's document types and their factory.
//! - **identity** — Identities, their keys, and asset lock proofs.
//! - **state_transition** — The six signed transitions and how they apply.
//! - **storage** — The repository seam the protocol reads and writes through.
//! - **validation** — The pluggable schema validator seam.
//! - **config** — Protocol constants.
//!
//! ## Design Philosophy
//!
//! 1. Determinism first: anything hashed or signed has exactly one encoding.
//! 2. No global state. Entropy, validation and storage are injected.
//! 3. No panics on untrusted input. Every decode path returns an error.

pub mod codec;
pub mod config;
pub mod crypto;
pub mod data_contract;
pub mod document;
pub mod error;
pub mod identifier;
pub mod identity;
pub mod state_transition;
pub mod storage;
pub mod validation;

pub use data_contract::{DataContract, DataContractFactory};
pub use document::{Document, DocumentFactory};
pub use error::{ProtocolError, ProtocolResult};
pub use identifier::Identifier;
pub use identity::{AssetLockProof, Identity, IdentityFactory, IdentityPublicKey};
pub use state_transition::{
    apply_state_transition, IdentitySignedTransition, StateTransition, StateTransitionLike,
};
pub use storage::{InMemoryStateRepository, StateRepository};
