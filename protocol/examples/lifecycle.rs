//! Terminal walkthrough of the data platform lifecycle.
//!
//! Locks funds on a simulated core chain, mints an identity from the lock,
//! publishes a data contract, writes and edits documents, and finally
//! rotates the identity's key. Every transition is encoded, decoded,
//! verified, priced and applied against an in-memory repository.
//!
//! Run with:
//!   cargo run --example lifecycle

use std::error::Error;
use std::time::Instant;

use dpp::codec::{CanonicalMap, CanonicalValue};
use dpp::crypto::keys::PrivateKey;
use dpp::crypto::OsEntropy;
use dpp::data_contract::DataContractFactory;
use dpp::document::{DocumentFactory, DocumentsBatchActions};
use dpp::identity::asset_lock::{CoreTransaction, TransactionOutput};
use dpp::identity::{IdentityFactory, IdentityPublicKey, KeyType};
use dpp::state_transition::{
    apply_state_transition, verify_asset_lock_signature, IdentitySignedTransition, StateTransition,
    StateTransitionLike,
};
use dpp::storage::{DocumentQuery, InMemoryStateRepository, StateRepository};

// ---------------------------------------------------------------------------
// ANSI color constants
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

const BG_BLUE: &str = "\x1b[44m";

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn banner() {
    println!();
    println!("{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}");
    println!("{BG_BLUE}{BOLD}{WHITE}    DATA PLATFORM PROTOCOL  --  Lifecycle Walkthrough               {RESET}");
    println!("{BG_BLUE}{BOLD}{WHITE}    Canonical CBOR  |  secp256k1 compact  |  double SHA-256         {RESET}");
    println!("{BG_BLUE}{BOLD}{WHITE}                                                                    {RESET}");
    println!();
}

fn section(num: u32, title: &str) {
    println!();
    println!("{BOLD}{CYAN}===[{YELLOW} Step {num} {CYAN}]=============================================================={RESET}");
    println!("{BOLD}{WHITE}  {title}{RESET}");
    println!("{CYAN}------------------------------------------------------------------------{RESET}");
}

fn success(text: &str) {
    println!("{GREEN}  [OK] {text}{RESET}");
}

fn info(label: &str, value: &str) {
    println!("{WHITE}  {BOLD}{label}:{RESET} {YELLOW}{value}{RESET}");
}

fn timing(label: &str, elapsed: std::time::Duration) {
    let ms = elapsed.as_secs_f64() * 1000.0;
    println!("{DIM}{MAGENTA}  [{label}: {ms:.2} ms]{RESET}");
}

// ---------------------------------------------------------------------------
// Node side
// ---------------------------------------------------------------------------

type DemoResult<T> = Result<T, Box<dyn Error>>;

/// Decode, verify, charge and apply. Returns the fee in credits.
fn submit(repo: &InMemoryStateRepository, bytes: &[u8]) -> DemoResult<u64> {
    let started = Instant::now();
    let transition = StateTransition::from_buffer(bytes)?;

    let verified = match (transition.as_asset_lock_funded(), transition.as_identity_signed()) {
        (Some(funded), _) => verify_asset_lock_signature(repo, funded)?,
        (None, Some(signed)) => {
            let identity = repo
                .fetch_identity(&signed.owner_id())?
                .ok_or("owner identity not found")?;
            let key = signed
                .signature_public_key_id()
                .and_then(|key_id| identity.get_public_key_by_id(key_id))
                .ok_or("signing key not on identity")?;
            signed.verify_signature(key)?
        }
        (None, None) => false,
    };
    if !verified {
        return Err("signature does not verify".into());
    }

    let fee = transition.calculate_fee()?;
    apply_state_transition(repo, &transition)?;
    timing("decode + verify + apply", started.elapsed());
    Ok(fee)
}

fn note_schema() -> CanonicalMap {
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

fn note(message: &str) -> CanonicalMap {
    let mut data = CanonicalMap::new();
    data.insert("message".into(), message.into());
    data
}

fn main() -> DemoResult<()> {
    banner();
    let repo = InMemoryStateRepository::new();

    // -----------------------------------------------------------------------
    section(1, "Lock funds on the core chain");
    let lock_key = PrivateKey::generate();
    let identity_key = PrivateKey::generate();
    let tx = CoreTransaction::with_outputs(vec![TransactionOutput::asset_lock(
        50_000,
        lock_key.public_key().hash160(),
    )]);
    info("lock tx", &hex::encode(tx.hash()));
    info("locked", "50000 satoshis");

    // -----------------------------------------------------------------------
    section(2, "Mint an identity from the asset lock");
    let identity_factory = IdentityFactory::new();
    let proof = identity_factory
        .create_instant_asset_lock_proof(vec![], tx.to_bytes(), 0)
        .into();
    let public_key = IdentityPublicKey::new(0, KeyType::EcdsaSecp256k1, identity_key.public_key().to_vec())?;
    let identity = identity_factory.create(proof, vec![public_key.clone()]);
    let mut create = identity_factory.create_identity_create_transition(&identity)?;
    create.sign_by_private_key(&lock_key)?;
    submit(&repo, &create.to_buffer(false)?)?;

    let stored = repo
        .fetch_identity(&identity.id)?
        .ok_or("identity was not stored")?;
    info("identity", &stored.id.to_string());
    info("balance", &format!("{} credits", stored.balance));
    success("identity funded");

    // -----------------------------------------------------------------------
    section(3, "Publish a data contract");
    let contract_factory = DataContractFactory::new(OsEntropy);
    let contract = contract_factory.create(identity.id, note_schema());
    let mut publish = contract_factory.create_data_contract_create_transition(&contract)?;
    publish.sign(&public_key, &identity_key)?;
    let fee = submit(&repo, &publish.to_buffer(false)?)?;
    info("contract", &contract.id.to_string());
    info("fee", &format!("{fee} credits"));
    success("contract published");

    // -----------------------------------------------------------------------
    section(4, "Write, edit and delete documents");
    let document_factory = DocumentFactory::new(OsEntropy);
    let first = document_factory.create(&contract, identity.id, "note", note("hello"))?;
    let second = document_factory.create(&contract, identity.id, "note", note("scratch"))?;

    let mut batch = document_factory.create_state_transition(DocumentsBatchActions {
        create: vec![first.clone(), second.clone()],
        ..Default::default()
    })?;
    batch.sign(&public_key, &identity_key)?;
    let fee = submit(&repo, &batch.to_buffer(false)?)?;
    info("created", &format!("2 notes for {fee} credits"));

    let mut edited = first.clone();
    edited.data = note("hello, edited");
    let mut batch = document_factory.create_state_transition(DocumentsBatchActions {
        replace: vec![edited],
        delete: vec![second],
        ..Default::default()
    })?;
    batch.sign(&public_key, &identity_key)?;
    submit(&repo, &batch.to_buffer(false)?)?;

    for document in repo.fetch_documents(&contract.id, "note", &DocumentQuery::new())? {
        info(
            &format!("note {}", document.id),
            &format!("revision {} {:?}", document.revision, document.get("message")),
        );
    }
    success("documents applied");

    // -----------------------------------------------------------------------
    section(5, "Rotate the identity key");
    let next_key = PrivateKey::generate();
    let next_public_key = IdentityPublicKey::new(1, KeyType::EcdsaSecp256k1, next_key.public_key().to_vec())?;
    let mut update = identity_factory.create_identity_update_transition(&stored, vec![next_public_key], vec![0])?;
    update.sign(&public_key, &identity_key)?;
    submit(&repo, &update.to_buffer(false)?)?;

    if let Some(rotated) = repo.fetch_identity(&identity.id)? {
        info("revision", &rotated.revision.to_string());
        for key in &rotated.public_keys {
            info(&format!("key {}", key.id()), if key.is_disabled() { "disabled" } else { "active" });
        }
    }
    success("key rotated");
    println!();
    Ok(())
}
