//! Writing accepted transitions to the state repository.
//!
//! Apply assumes the transition already passed signature and fee checks;
//! it only resolves what it needs from the repository and writes the
//! result. Asset lock out points are marked used as the last step, after
//! the identity write succeeds.

use thiserror::Error;
use tracing::{debug, info};

use super::{
    DataContractCreateTransition, DataContractUpdateTransition, DocumentTransition, DocumentsBatchTransition,
    IdentityCreateTransition, IdentityTopUpTransition, IdentityUpdateTransition, StateTransition,
    StateTransitionError,
};
use crate::document::{fields, Document};
use crate::identifier::Identifier;
use crate::identity::asset_lock::{credits_from_satoshis, fetch_asset_lock_output};
use crate::identity::{AssetLockError, AssetLockProof, Identity, IdentityError};
use crate::storage::{DocumentQuery, RepositoryError, StateRepository};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplyError {
    #[error("identity {identity_id} not found")]
    IdentityNotFound { identity_id: Identifier },

    /// A replace action names a document the repository does not hold.
    #[error("document {document_id} of type `{document_type}` not found")]
    DocumentNotFound {
        document_id: Identifier,
        document_type: String,
    },

    #[error("data contract {data_contract_id} already exists")]
    DataContractAlreadyExists { data_contract_id: Identifier },

    #[error("data contract {data_contract_id} not found")]
    DataContractNotFound { data_contract_id: Identifier },

    /// Contracts and documents may only be changed by their owner.
    #[error("{entity_id} is owned by {owner_id}, not {requested_by}")]
    NotOwner {
        entity_id: Identifier,
        owner_id: Identifier,
        requested_by: Identifier,
    },

    #[error(transparent)]
    StateTransition(#[from] StateTransitionError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    AssetLock(#[from] AssetLockError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Apply any transition.
pub fn apply_state_transition<R>(repository: &R, transition: &StateTransition) -> Result<(), ApplyError>
where
    R: StateRepository + ?Sized,
{
    match transition {
        StateTransition::DataContractCreate(t) => apply_data_contract_create(repository, t),
        StateTransition::DataContractUpdate(t) => apply_data_contract_update(repository, t),
        StateTransition::DocumentsBatch(t) => apply_documents_batch(repository, t),
        StateTransition::IdentityCreate(t) => apply_identity_create(repository, t).map(|_| ()),
        StateTransition::IdentityTopUp(t) => apply_identity_top_up(repository, t).map(|_| ()),
        StateTransition::IdentityUpdate(t) => apply_identity_update(repository, t),
    }
}

/// Store a new contract. Its id must derive from owner and entropy and
/// must not be taken.
pub fn apply_data_contract_create<R>(repository: &R, transition: &DataContractCreateTransition) -> Result<(), ApplyError>
where
    R: StateRepository + ?Sized,
{
    transition.verify_data_contract_id()?;
    let data_contract_id = transition.data_contract.id;
    if repository.fetch_data_contract(&data_contract_id)?.is_some() {
        return Err(ApplyError::DataContractAlreadyExists { data_contract_id });
    }

    repository.store_data_contract(&transition.data_contract)?;
    info!(
        data_contract_id = %transition.data_contract.id,
        owner_id = %transition.data_contract.owner_id,
        "data contract created"
    );
    Ok(())
}

/// Replace a stored contract. Only its owner may do so.
pub fn apply_data_contract_update<R>(repository: &R, transition: &DataContractUpdateTransition) -> Result<(), ApplyError>
where
    R: StateRepository + ?Sized,
{
    let data_contract_id = transition.data_contract.id;
    let stored = repository
        .fetch_data_contract(&data_contract_id)?
        .ok_or(ApplyError::DataContractNotFound { data_contract_id })?;
    ensure_owner(data_contract_id, stored.owner_id, transition.data_contract.owner_id)?;

    repository.store_data_contract(&transition.data_contract)?;
    info!(data_contract_id = %transition.data_contract.id, "data contract updated");
    Ok(())
}

/// Apply each action in batch order.
///
/// - Create: check the id derives from the batch owner, then store the new
///   document.
/// - Replace: fetch the stored document by `$id`, take the new revision,
///   data and `$updatedAt`, store it back.
/// - Delete: remove the document.
///
/// Replace and delete only touch documents the batch owner owns.
pub fn apply_documents_batch<R>(repository: &R, transition: &DocumentsBatchTransition) -> Result<(), ApplyError>
where
    R: StateRepository + ?Sized,
{
    for document_transition in &transition.transitions {
        let base = document_transition.base();
        match document_transition {
            DocumentTransition::Create(create) => {
                create.verify_id(&transition.owner_id)?;
                let document = create.to_document(transition.owner_id);
                repository.store_document(&document)?;
                debug!(document_id = %document.id, document_type = %document.document_type, "document created");
            }
            DocumentTransition::Replace(replace) => {
                let mut document = fetch_owned_document(repository, document_transition, &transition.owner_id)?;
                document.revision = replace.revision;
                document.data = replace.data.clone();
                document.updated_at = replace.updated_at;
                repository.store_document(&document)?;
                debug!(document_id = %document.id, revision = document.revision, "document replaced");
            }
            DocumentTransition::Delete(_) => {
                fetch_owned_document(repository, document_transition, &transition.owner_id)?;
                repository.remove_document(&base.data_contract_id, &base.document_type, &base.id)?;
                debug!(document_id = %base.id, "document deleted");
            }
        }
    }
    Ok(())
}

/// Mint the identity and fund it with the locked amount.
///
/// 1. Resolve the asset lock output and convert it to credits.
/// 2. Build the identity: id from the proof, balance = credits, revision 0.
/// 3. Store it and index its key hashes.
/// 4. Mark the out point used.
pub fn apply_identity_create<R>(repository: &R, transition: &IdentityCreateTransition) -> Result<Identity, ApplyError>
where
    R: StateRepository + ?Sized,
{
    let credits = locked_credits(repository, &transition.asset_lock_proof)?;

    let mut identity = Identity::new(transition.identity_id(), transition.public_keys.clone());
    identity.protocol_version = transition.protocol_version;
    identity.balance = credits;
    identity.asset_lock_proof = Some(transition.asset_lock_proof.clone());

    repository.store_identity(&identity)?;
    repository.store_identity_public_key_hashes(&identity.id, identity.public_key_hashes())?;
    repository.mark_asset_lock_transaction_out_point_as_used(&transition.asset_lock_proof.out_point())?;

    info!(identity_id = %identity.id, credits, "identity created");
    Ok(identity)
}

/// Add the locked amount to an existing identity.
pub fn apply_identity_top_up<R>(repository: &R, transition: &IdentityTopUpTransition) -> Result<Identity, ApplyError>
where
    R: StateRepository + ?Sized,
{
    let credits = locked_credits(repository, &transition.asset_lock_proof)?;

    let mut identity = fetch_identity(repository, &transition.identity_id)?;
    identity.increase_balance(credits)?;

    repository.store_identity(&identity)?;
    repository.mark_asset_lock_transaction_out_point_as_used(&transition.asset_lock_proof.out_point())?;

    info!(identity_id = %identity.id, credits, balance = identity.balance, "identity topped up");
    Ok(identity)
}

/// Add keys, disable keys, and move the identity to the new revision.
///
/// Disabled keys get the transition's `publicKeysDisabledAt`, which must
/// be present whenever keys are disabled.
pub fn apply_identity_update<R>(repository: &R, transition: &IdentityUpdateTransition) -> Result<(), ApplyError>
where
    R: StateRepository + ?Sized,
{
    transition.verify_disabled_at()?;
    let mut identity = fetch_identity(repository, &transition.identity_id)?;

    identity.public_keys.extend(transition.add_public_keys.iter().cloned());

    let disabled_at = transition.public_keys_disabled_at.unwrap_or_default();
    for &key_id in &transition.disable_public_keys {
        identity
            .get_public_key_by_id_mut(key_id)
            .ok_or(IdentityError::KeyNotFound { key_id })?
            .set_disabled_at(disabled_at);
    }

    identity.revision = transition.revision;
    repository.store_identity(&identity)?;
    if !transition.add_public_keys.is_empty() {
        let hashes = transition.add_public_keys.iter().map(|key| key.hash()).collect();
        repository.store_identity_public_key_hashes(&identity.id, hashes)?;
    }

    info!(
        identity_id = %identity.id,
        revision = identity.revision,
        added = transition.add_public_keys.len(),
        disabled = transition.disable_public_keys.len(),
        "identity updated"
    );
    Ok(())
}

fn ensure_owner(entity_id: Identifier, owner_id: Identifier, requested_by: Identifier) -> Result<(), ApplyError> {
    if owner_id != requested_by {
        return Err(ApplyError::NotOwner {
            entity_id,
            owner_id,
            requested_by,
        });
    }
    Ok(())
}

/// The stored document a replace or delete targets, checked against the
/// batch owner.
fn fetch_owned_document<R>(
    repository: &R,
    document_transition: &DocumentTransition,
    owner_id: &Identifier,
) -> Result<Document, ApplyError>
where
    R: StateRepository + ?Sized,
{
    let base = document_transition.base();
    let query = DocumentQuery::new().where_eq(fields::ID, base.id).limit(1);
    let document = repository
        .fetch_documents(&base.data_contract_id, &base.document_type, &query)?
        .into_iter()
        .next()
        .ok_or_else(|| ApplyError::DocumentNotFound {
            document_id: base.id,
            document_type: base.document_type.clone(),
        })?;
    ensure_owner(document.id, document.owner_id, *owner_id)?;
    Ok(document)
}

fn locked_credits<R>(repository: &R, proof: &AssetLockProof) -> Result<u64, ApplyError>
where
    R: StateRepository + ?Sized,
{
    let output = fetch_asset_lock_output(repository, proof)?;
    Ok(credits_from_satoshis(output.satoshis)?)
}

fn fetch_identity<R>(repository: &R, identity_id: &Identifier) -> Result<Identity, ApplyError>
where
    R: StateRepository + ?Sized,
{
    repository
        .fetch_identity(identity_id)?
        .ok_or(ApplyError::IdentityNotFound {
            identity_id: *identity_id,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CanonicalMap;
    use crate::crypto::hash::derive_document_id;
    use crate::data_contract::tests::sample_contract;
    use crate::identity::asset_lock::{CoreTransaction, TransactionOutput};
    use crate::identity::{ChainAssetLockProof, IdentityPublicKey, InstantAssetLockProof, KeyType};
    use crate::state_transition::{
        DocumentCreateTransition, DocumentDeleteTransition, DocumentReplaceTransition, DocumentTransitionBase,
    };
    use crate::storage::InMemoryStateRepository;

    fn key(id: u32, byte: u8) -> IdentityPublicKey {
        IdentityPublicKey::new(id, KeyType::EcdsaHash160, vec![byte; 20]).unwrap()
    }

    fn lock_tx(satoshis: u64) -> CoreTransaction {
        CoreTransaction::with_outputs(vec![TransactionOutput::asset_lock(satoshis, [8; 20])])
    }

    fn create_identity(repo: &InMemoryStateRepository) -> Identity {
        let proof = InstantAssetLockProof::new(vec![], lock_tx(1_000).to_bytes(), 0).into();
        let t = IdentityCreateTransition::new(proof, vec![key(0, 1)]);
        apply_identity_create(repo, &t).unwrap()
    }

    #[test]
    fn test_identity_create_funds_balance() {
        let repo = InMemoryStateRepository::new();
        let identity = create_identity(&repo);

        assert_eq!(identity.balance, 1_000_000);
        assert_eq!(identity.revision, 0);
        let stored = repo.fetch_identity(&identity.id).unwrap().unwrap();
        assert_eq!(stored.balance, 1_000_000);
        assert_eq!(repo.identity_id_by_public_key_hash(&[1; 20]), Some(identity.id));

        let out_point = identity.asset_lock_proof.unwrap().out_point();
        assert!(repo
            .is_asset_lock_transaction_out_point_already_used(&out_point)
            .unwrap());
    }

    #[test]
    fn test_top_up_adds_credits() {
        let repo = InMemoryStateRepository::new();
        let identity = create_identity(&repo);

        let tx = lock_tx(50);
        repo.insert_transaction(tx.to_bytes());
        let proof = ChainAssetLockProof::from_parts(100, &tx.hash(), 0).into();
        let t = IdentityTopUpTransition::new(identity.id, proof);

        let topped_up = apply_identity_top_up(&repo, &t).unwrap();
        assert_eq!(topped_up.balance, 1_050_000);
    }

    #[test]
    fn test_top_up_unknown_identity() {
        let repo = InMemoryStateRepository::new();
        let proof = InstantAssetLockProof::new(vec![], lock_tx(10).to_bytes(), 0).into();
        let t = IdentityTopUpTransition::new(Identifier::new([9; 32]), proof);
        assert_eq!(
            apply_identity_top_up(&repo, &t),
            Err(ApplyError::IdentityNotFound {
                identity_id: Identifier::new([9; 32])
            })
        );
    }

    #[test]
    fn test_identity_update_adds_and_disables_keys() {
        let repo = InMemoryStateRepository::new();
        let identity = create_identity(&repo);

        let mut t = IdentityUpdateTransition::new(identity.id, 1);
        t.add_public_keys = vec![key(1, 2)];
        t.disable_public_keys = vec![0];
        t.public_keys_disabled_at = Some(42);
        apply_identity_update(&repo, &t).unwrap();

        let stored = repo.fetch_identity(&identity.id).unwrap().unwrap();
        assert_eq!(stored.revision, 1);
        assert_eq!(stored.public_keys.len(), 2);
        assert_eq!(stored.get_public_key_by_id(0).unwrap().disabled_at(), Some(42));
        assert!(!stored.get_public_key_by_id(1).unwrap().is_disabled());
        assert_eq!(repo.identity_id_by_public_key_hash(&[2; 20]), Some(identity.id));
    }

    #[test]
    fn test_identity_update_unknown_key() {
        let repo = InMemoryStateRepository::new();
        let identity = create_identity(&repo);
        let mut t = IdentityUpdateTransition::new(identity.id, 1);
        t.disable_public_keys = vec![7];
        t.public_keys_disabled_at = Some(42);
        assert_eq!(
            apply_identity_update(&repo, &t),
            Err(ApplyError::Identity(IdentityError::KeyNotFound { key_id: 7 }))
        );
    }

    #[test]
    fn test_documents_batch_lifecycle() {
        let repo = InMemoryStateRepository::new();
        let contract = sample_contract();
        let create = StateTransition::from(DataContractCreateTransition::new(contract.clone(), [2; 32]));
        apply_state_transition(&repo, &create).unwrap();
        assert!(repo.fetch_data_contract(&contract.id).unwrap().is_some());

        let owner = contract.owner_id;
        let base = DocumentTransitionBase {
            id: derive_document_id(&contract.id, &owner, "note", &[4; 32]),
            document_type: "note".into(),
            data_contract_id: contract.id,
        };
        let mut data = CanonicalMap::new();
        data.insert("message".into(), "first".into());

        let create = DocumentTransition::Create(DocumentCreateTransition {
            base: base.clone(),
            entropy: [4; 32],
            created_at: Some(1),
            updated_at: None,
            data: data.clone(),
        });
        apply_documents_batch(&repo, &DocumentsBatchTransition::new(owner, vec![create])).unwrap();

        data.insert("message".into(), "second".into());
        let replace = DocumentTransition::Replace(DocumentReplaceTransition {
            base: base.clone(),
            revision: 2,
            updated_at: Some(2),
            data,
        });
        apply_documents_batch(&repo, &DocumentsBatchTransition::new(owner, vec![replace])).unwrap();

        let stored = repo
            .fetch_documents(&contract.id, "note", &DocumentQuery::new())
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].revision, 2);
        assert_eq!(stored[0].created_at, Some(1));
        assert_eq!(stored[0].get("message"), Some("second".into()));

        let delete = DocumentTransition::Delete(DocumentDeleteTransition { base });
        apply_documents_batch(&repo, &DocumentsBatchTransition::new(owner, vec![delete])).unwrap();
        assert_eq!(repo.document_count(), 0);
    }

    #[test]
    fn test_replace_missing_document() {
        let repo = InMemoryStateRepository::new();
        let replace = DocumentTransition::Replace(DocumentReplaceTransition {
            base: DocumentTransitionBase {
                id: Identifier::new([6; 32]),
                document_type: "note".into(),
                data_contract_id: Identifier::new([3; 32]),
            },
            revision: 2,
            updated_at: None,
            data: CanonicalMap::new(),
        });
        let t = DocumentsBatchTransition::new(Identifier::new([1; 32]), vec![replace]);
        assert!(matches!(
            apply_documents_batch(&repo, &t),
            Err(ApplyError::DocumentNotFound { .. })
        ));
    }

    #[test]
    fn test_identity_update_needs_disable_timestamp() {
        let repo = InMemoryStateRepository::new();
        let identity = create_identity(&repo);
        let mut t = IdentityUpdateTransition::new(identity.id, 1);
        t.disable_public_keys = vec![0];
        assert_eq!(
            apply_identity_update(&repo, &t),
            Err(ApplyError::StateTransition(
                StateTransitionError::MissingPublicKeysDisabledAt
            ))
        );
        let stored = repo.fetch_identity(&identity.id).unwrap().unwrap();
        assert!(!stored.get_public_key_by_id(0).unwrap().is_disabled());
    }

    #[test]
    fn test_contract_create_rejects_forged_and_taken_ids() {
        let repo = InMemoryStateRepository::new();
        let mut forged = sample_contract();
        forged.id = Identifier::new([0xee; 32]);
        let t = DataContractCreateTransition::new(forged, [2; 32]);
        assert!(matches!(
            apply_data_contract_create(&repo, &t),
            Err(ApplyError::StateTransition(
                StateTransitionError::InvalidDataContractId { .. }
            ))
        ));
        assert!(repo
            .fetch_data_contract(&Identifier::new([0xee; 32]))
            .unwrap()
            .is_none());

        let t = DataContractCreateTransition::new(sample_contract(), [2; 32]);
        apply_data_contract_create(&repo, &t).unwrap();
        assert_eq!(
            apply_data_contract_create(&repo, &t),
            Err(ApplyError::DataContractAlreadyExists {
                data_contract_id: t.data_contract.id
            })
        );
    }

    #[test]
    fn test_contract_update_only_by_owner() {
        let repo = InMemoryStateRepository::new();
        let contract = sample_contract();
        let update = DataContractUpdateTransition::new(contract.clone());
        assert_eq!(
            apply_data_contract_update(&repo, &update),
            Err(ApplyError::DataContractNotFound {
                data_contract_id: contract.id
            })
        );

        apply_data_contract_create(&repo, &DataContractCreateTransition::new(contract.clone(), [2; 32])).unwrap();
        let mut hijacked = contract.clone();
        hijacked.owner_id = Identifier::new([9; 32]);
        assert_eq!(
            apply_data_contract_update(&repo, &DataContractUpdateTransition::new(hijacked)),
            Err(ApplyError::NotOwner {
                entity_id: contract.id,
                owner_id: contract.owner_id,
                requested_by: Identifier::new([9; 32]),
            })
        );
        apply_data_contract_update(&repo, &update).unwrap();
    }

    #[test]
    fn test_documents_touched_only_by_owner() {
        let repo = InMemoryStateRepository::new();
        let contract = sample_contract();
        let owner = contract.owner_id;
        let stranger = Identifier::new([9; 32]);
        let base = DocumentTransitionBase {
            id: derive_document_id(&contract.id, &owner, "note", &[4; 32]),
            document_type: "note".into(),
            data_contract_id: contract.id,
        };
        let create = DocumentTransition::Create(DocumentCreateTransition {
            base: base.clone(),
            entropy: [4; 32],
            created_at: None,
            updated_at: None,
            data: CanonicalMap::new(),
        });

        // The stranger cannot create under an id derived from the owner.
        assert!(matches!(
            apply_documents_batch(&repo, &DocumentsBatchTransition::new(stranger, vec![create.clone()])),
            Err(ApplyError::StateTransition(StateTransitionError::InvalidDocumentId { .. }))
        ));
        apply_documents_batch(&repo, &DocumentsBatchTransition::new(owner, vec![create])).unwrap();

        let replace = DocumentTransition::Replace(DocumentReplaceTransition {
            base: base.clone(),
            revision: 2,
            updated_at: None,
            data: CanonicalMap::new(),
        });
        let delete = DocumentTransition::Delete(DocumentDeleteTransition { base: base.clone() });
        for action in [replace, delete] {
            assert_eq!(
                apply_documents_batch(&repo, &DocumentsBatchTransition::new(stranger, vec![action])),
                Err(ApplyError::NotOwner {
                    entity_id: base.id,
                    owner_id: owner,
                    requested_by: stranger,
                })
            );
        }
        assert_eq!(repo.document_count(), 1);
    }
}
