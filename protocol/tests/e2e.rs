//! End-to-end integration tests for the Data Platform Protocol.
//!
//! These walk the full lifecycle a client and a node go through together:
//! lock funds on the core chain, mint an identity from the lock, publish a
//! data contract, submit documents, top up and rotate keys. Every
//! transition crosses the wire as bytes, is decoded, verified, priced and
//! applied against an in-memory repository.
//!
//! Each test builds its own repository. No shared state.

use std::sync::Once;

use dpp::codec::{CanonicalMap, CanonicalValue};
use dpp::crypto::keys::PrivateKey;
use dpp::crypto::SeededEntropy;
use dpp::data_contract::DataContractFactory;
use dpp::document::{DocumentFactory, DocumentsBatchActions};
use dpp::identity::asset_lock::{
    ensure_out_point_unused, AssetLockError, CoreTransaction, TransactionOutput,
};
use dpp::identity::{Identity, IdentityFactory, IdentityPublicKey, KeyType};
use dpp::state_transition::{
    apply_state_transition, verify_asset_lock_signature, ApplyError, DataContractCreateTransition,
    IdentitySignedTransition, StateTransition, StateTransitionError, StateTransitionLike,
};
use dpp::storage::{DocumentQuery, InMemoryStateRepository, StateRepository};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dpp=debug")
            .with_test_writer()
            .try_init();
    });
}

/// Client-side keys: the one-time asset lock key and the identity's
/// signing key.
struct Wallet {
    lock_key: PrivateKey,
    identity_key: PrivateKey,
}

impl Wallet {
    fn new(seed: u8) -> Self {
        Self {
            lock_key: PrivateKey::from_bytes(&[seed; 32]).expect("lock key"),
            identity_key: PrivateKey::from_bytes(&[seed.wrapping_add(1); 32]).expect("identity key"),
        }
    }

    fn identity_public_key(&self) -> IdentityPublicKey {
        IdentityPublicKey::new(
            0,
            KeyType::EcdsaSecp256k1,
            self.identity_key.public_key().to_vec(),
        )
        .expect("key data")
    }

    /// A core transaction burning `satoshis` to this wallet's lock key.
    fn lock_transaction(&self, satoshis: u64) -> CoreTransaction {
        CoreTransaction::with_outputs(vec![TransactionOutput::asset_lock(
            satoshis,
            self.lock_key.public_key().hash160(),
        )])
    }
}

/// What a node does with incoming bytes: decode, verify, charge, apply.
/// Returns the fee.
fn submit(repo: &InMemoryStateRepository, bytes: &[u8]) -> Result<u64, String> {
    let transition = StateTransition::from_buffer(bytes).map_err(|e| e.to_string())?;

    let verified = if let Some(funded) = transition.as_asset_lock_funded() {
        ensure_out_point_unused(repo, funded.asset_lock_proof()).map_err(|e| e.to_string())?;
        verify_asset_lock_signature(repo, funded).map_err(|e| e.to_string())?
    } else if let Some(signed) = transition.as_identity_signed() {
        let identity = repo
            .fetch_identity(&signed.owner_id())
            .map_err(|e| e.to_string())?
            .ok_or("owner identity not found")?;
        let key_id = signed.signature_public_key_id().ok_or("no signer key id")?;
        let key = identity
            .get_public_key_by_id(key_id)
            .ok_or("signer key not on identity")?;
        signed.verify_signature(key).map_err(|e| e.to_string())?
    } else {
        false
    };
    if !verified {
        return Err("signature does not verify".into());
    }

    let fee = transition.calculate_fee().map_err(|e| e.to_string())?;
    apply_state_transition(repo, &transition).map_err(|e| e.to_string())?;
    Ok(fee)
}

/// Mint an identity for `wallet` from a fresh instant asset lock.
fn register_identity(repo: &InMemoryStateRepository, wallet: &Wallet, satoshis: u64) -> Identity {
    let factory = IdentityFactory::new();
    let tx = wallet.lock_transaction(satoshis);
    let proof = factory
        .create_instant_asset_lock_proof(vec![0xaa; 8], tx.to_bytes(), 0)
        .into();
    let identity = factory.create(proof, vec![wallet.identity_public_key()]);

    let mut transition = factory
        .create_identity_create_transition(&identity)
        .expect("create transition");
    transition
        .sign_by_private_key(&wallet.lock_key)
        .expect("sign with lock key");

    submit(repo, &transition.to_buffer(false).expect("encode")).expect("identity create");
    repo.fetch_identity(&identity.id)
        .expect("repository")
        .expect("stored identity")
}

fn note_data(message: &str) -> CanonicalMap {
    let mut data = CanonicalMap::new();
    data.insert("message".into(), message.into());
    data
}

fn notes_contract_documents() -> CanonicalMap {
    let mut message = CanonicalMap::new();
    message.insert("type".into(), "string".into());
    let mut properties = CanonicalMap::new();
    properties.insert("message".into(), message.into());

    let mut note = CanonicalMap::new();
    note.insert("type".into(), "object".into());
    note.insert("properties".into(), properties.into());
    note.insert(
        "required".into(),
        CanonicalValue::Array(vec!["message".into(), "$createdAt".into(), "$updatedAt".into()]),
    );

    let mut documents = CanonicalMap::new();
    documents.insert("note".into(), note.into());
    documents
}

// ---------------------------------------------------------------------------
// Identity create: asset lock to funded identity
// ---------------------------------------------------------------------------

#[test]
fn identity_create_funds_from_asset_lock() {
    init_tracing();
    let repo = InMemoryStateRepository::new();
    let wallet = Wallet::new(0x10);

    let identity = register_identity(&repo, &wallet, 5_000);

    assert_eq!(identity.balance, 5_000_000);
    assert_eq!(identity.revision, 0);
    assert_eq!(identity.public_keys, vec![wallet.identity_public_key()]);
    assert_eq!(
        repo.identity_id_by_public_key_hash(&wallet.identity_public_key().hash()),
        Some(identity.id)
    );
}

// ---------------------------------------------------------------------------
// Asset lock reuse
// ---------------------------------------------------------------------------

#[test]
fn asset_lock_cannot_fund_twice() {
    init_tracing();
    let repo = InMemoryStateRepository::new();
    let wallet = Wallet::new(0x20);
    let identity = register_identity(&repo, &wallet, 1_000);

    let factory = IdentityFactory::new();
    let proof = identity.asset_lock_proof.clone().expect("proof kept on apply");
    let mut top_up = factory.create_identity_top_up_transition(identity.id, proof.clone());
    top_up.sign_by_private_key(&wallet.lock_key).unwrap();

    let err = submit(&repo, &top_up.to_buffer(false).unwrap()).unwrap_err();
    assert_eq!(
        err,
        AssetLockError::OutPointAlreadyUsed {
            out_point: hex::encode(proof.out_point())
        }
        .to_string()
    );
}

// ---------------------------------------------------------------------------
// Asset lock signed by the wrong key
// ---------------------------------------------------------------------------

#[test]
fn identity_create_signed_by_stranger_rejected() {
    init_tracing();
    let repo = InMemoryStateRepository::new();
    let wallet = Wallet::new(0x30);
    let factory = IdentityFactory::new();

    let tx = wallet.lock_transaction(1_000);
    let proof = factory
        .create_instant_asset_lock_proof(vec![], tx.to_bytes(), 0)
        .into();
    let identity = factory.create(proof, vec![wallet.identity_public_key()]);
    let mut transition = factory.create_identity_create_transition(&identity).unwrap();
    transition.sign_by_private_key(&wallet.identity_key).unwrap();

    let err = submit(&repo, &transition.to_buffer(false).unwrap()).unwrap_err();
    assert_eq!(err, "signature does not verify");
    assert!(repo.fetch_identity(&identity.id).unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Chain-locked top up
// ---------------------------------------------------------------------------

#[test]
fn chain_locked_top_up() {
    init_tracing();
    let repo = InMemoryStateRepository::new();
    let wallet = Wallet::new(0x40);
    let identity = register_identity(&repo, &wallet, 1_000);

    let tx = wallet.lock_transaction(250);
    let tx_hash = repo.insert_transaction(tx.to_bytes());
    let factory = IdentityFactory::new();
    let mut out_point = [0u8; 36];
    out_point[..32].copy_from_slice(&tx_hash);
    let proof = factory.create_chain_asset_lock_proof(900, out_point).into();

    let mut top_up = factory.create_identity_top_up_transition(identity.id, proof);
    top_up.sign_by_private_key(&wallet.lock_key).unwrap();
    submit(&repo, &top_up.to_buffer(false).unwrap()).unwrap();

    let stored = repo.fetch_identity(&identity.id).unwrap().unwrap();
    assert_eq!(stored.balance, 1_250_000);
}

// ---------------------------------------------------------------------------
// Contract and documents lifecycle
// ---------------------------------------------------------------------------

#[test]
fn contract_and_documents_lifecycle() {
    init_tracing();
    let repo = InMemoryStateRepository::new();
    let wallet = Wallet::new(0x50);
    let identity = register_identity(&repo, &wallet, 10_000);
    let key = wallet.identity_public_key();

    // Publish the contract.
    let contract_factory = DataContractFactory::new(SeededEntropy::new([1; 32]));
    let contract = contract_factory.create(identity.id, notes_contract_documents());
    let mut create = contract_factory
        .create_data_contract_create_transition(&contract)
        .unwrap();
    create.sign(&key, &wallet.identity_key).unwrap();
    let fee = submit(&repo, &create.to_buffer(false).unwrap()).unwrap();
    assert_eq!(fee, create.to_buffer(true).unwrap().len() as u64);

    let stored_contract = repo.fetch_data_contract(&contract.id).unwrap().unwrap();
    assert_eq!(stored_contract.id, contract.id);

    // Create two notes.
    let document_factory = DocumentFactory::new(SeededEntropy::new([2; 32]));
    let first = document_factory
        .create(&stored_contract, identity.id, "note", note_data("first"))
        .unwrap();
    let second = document_factory
        .create(&stored_contract, identity.id, "note", note_data("second"))
        .unwrap();
    assert!(first.created_at.is_some() && first.updated_at.is_some());

    let mut batch = document_factory
        .create_state_transition(DocumentsBatchActions {
            create: vec![first.clone(), second.clone()],
            ..Default::default()
        })
        .unwrap();
    assert_eq!(batch.modified_data_ids(), vec![first.id, second.id]);
    batch.sign(&key, &wallet.identity_key).unwrap();
    submit(&repo, &batch.to_buffer(false).unwrap()).unwrap();
    assert_eq!(repo.document_count(), 2);

    // Replace the first, delete the second.
    let mut edited = repo
        .fetch_documents(
            &contract.id,
            "note",
            &DocumentQuery::new().where_eq("$id", first.id),
        )
        .unwrap()
        .remove(0);
    edited.data = note_data("first, edited");

    let mut batch = document_factory
        .create_state_transition(DocumentsBatchActions {
            replace: vec![edited],
            delete: vec![second.clone()],
            ..Default::default()
        })
        .unwrap();
    batch.sign(&key, &wallet.identity_key).unwrap();
    submit(&repo, &batch.to_buffer(false).unwrap()).unwrap();

    let remaining = repo
        .fetch_documents(&contract.id, "note", &DocumentQuery::new())
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, first.id);
    assert_eq!(remaining[0].revision, 2);
    assert_eq!(remaining[0].get("message"), Some("first, edited".into()));
    assert_eq!(remaining[0].created_at, first.created_at);
}

// ---------------------------------------------------------------------------
// Replacing a document that was never created
// ---------------------------------------------------------------------------

#[test]
fn replace_of_missing_document_fails_apply() {
    init_tracing();
    let repo = InMemoryStateRepository::new();
    let wallet = Wallet::new(0x60);
    let identity = register_identity(&repo, &wallet, 1_000);

    let contract = DataContractFactory::new(SeededEntropy::new([3; 32]))
        .create(identity.id, notes_contract_documents());
    let document_factory = DocumentFactory::new(SeededEntropy::new([4; 32]));
    let ghost = document_factory
        .create(&contract, identity.id, "note", note_data("never stored"))
        .unwrap();

    let mut batch = document_factory
        .create_state_transition(DocumentsBatchActions {
            replace: vec![ghost.clone()],
            ..Default::default()
        })
        .unwrap();
    batch.sign(&wallet.identity_public_key(), &wallet.identity_key).unwrap();

    let err = submit(&repo, &batch.to_buffer(false).unwrap()).unwrap_err();
    assert_eq!(
        err,
        ApplyError::DocumentNotFound {
            document_id: ghost.id,
            document_type: "note".into()
        }
        .to_string()
    );
}

// ---------------------------------------------------------------------------
// Key rotation
// ---------------------------------------------------------------------------

#[test]
fn identity_update_rotates_keys() {
    init_tracing();
    let repo = InMemoryStateRepository::new();
    let wallet = Wallet::new(0x70);
    let identity = register_identity(&repo, &wallet, 1_000);

    let next_key = PrivateKey::from_bytes(&[0x7f; 32]).unwrap();
    let added = IdentityPublicKey::new(1, KeyType::EcdsaHash160, next_key.public_key().hash160().to_vec())
        .unwrap();

    let factory = IdentityFactory::new();
    let mut update = factory
        .create_identity_update_transition(&identity, vec![added.clone()], vec![0])
        .unwrap();
    update.sign(&wallet.identity_public_key(), &wallet.identity_key).unwrap();
    submit(&repo, &update.to_buffer(false).unwrap()).unwrap();

    let stored = repo.fetch_identity(&identity.id).unwrap().unwrap();
    assert_eq!(stored.revision, 1);
    assert!(stored.get_public_key_by_id(0).unwrap().is_disabled());
    assert_eq!(stored.get_public_key_by_id(1), Some(&added));

    // The new hashed key signs the next update.
    let mut next = factory
        .create_identity_update_transition(&stored, vec![], vec![])
        .unwrap();
    next.sign(&added, &next_key).unwrap();
    submit(&repo, &next.to_buffer(false).unwrap()).unwrap();
    assert_eq!(repo.fetch_identity(&identity.id).unwrap().unwrap().revision, 2);
}

// ---------------------------------------------------------------------------
// Signing with a key the identity does not hold
// ---------------------------------------------------------------------------

#[test]
fn signing_with_foreign_private_key_rejected() {
    init_tracing();
    let wallet = Wallet::new(0x80);
    let stranger = PrivateKey::from_bytes(&[0x81; 32]).unwrap();
    let contract = DataContractFactory::new(SeededEntropy::new([5; 32]))
        .create(dpp::Identifier::new([1; 32]), notes_contract_documents());
    let mut create = DataContractFactory::new(SeededEntropy::new([5; 32]))
        .create_data_contract_create_transition(&contract)
        .unwrap();

    assert_eq!(
        create.sign(&wallet.identity_public_key(), &stranger),
        Err(StateTransitionError::InvalidSignaturePublicKey { key_id: 0 })
    );
    assert!(create.signature().is_none());
}

// ---------------------------------------------------------------------------
// Contract ids and ownership
// ---------------------------------------------------------------------------

#[test]
fn contract_ids_and_ownership_enforced() {
    init_tracing();
    let repo = InMemoryStateRepository::new();
    let owner = Wallet::new(0x90);
    let intruder = Wallet::new(0xa0);
    let owner_identity = register_identity(&repo, &owner, 1_000);
    let intruder_identity = register_identity(&repo, &intruder, 1_000);

    let factory = DataContractFactory::new(SeededEntropy::new([6; 32]));
    let contract = factory.create(owner_identity.id, notes_contract_documents());
    let mut create = factory.create_data_contract_create_transition(&contract).unwrap();
    create.sign(&owner.identity_public_key(), &owner.identity_key).unwrap();
    submit(&repo, &create.to_buffer(false).unwrap()).unwrap();

    // A signed create whose id was not derived from owner and entropy.
    let mut forged = factory.create(intruder_identity.id, notes_contract_documents());
    forged.id = contract.id;
    let mut forged_create = DataContractCreateTransition::new(forged.clone(), forged.entropy.unwrap());
    forged_create
        .sign(&intruder.identity_public_key(), &intruder.identity_key)
        .unwrap();
    let err = submit(&repo, &forged_create.to_buffer(false).unwrap()).unwrap_err();
    assert!(err.contains("does not match derived id"), "{err}");

    // A validly signed update of someone else's contract.
    let mut hijack = factory.create_data_contract_update_transition(&forged);
    hijack
        .sign(&intruder.identity_public_key(), &intruder.identity_key)
        .unwrap();
    let err = submit(&repo, &hijack.to_buffer(false).unwrap()).unwrap_err();
    assert_eq!(
        err,
        ApplyError::NotOwner {
            entity_id: contract.id,
            owner_id: owner_identity.id,
            requested_by: intruder_identity.id,
        }
        .to_string()
    );

    let stored = repo.fetch_data_contract(&contract.id).unwrap().unwrap();
    assert_eq!(stored.owner_id, owner_identity.id);
}
