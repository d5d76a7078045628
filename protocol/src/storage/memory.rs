//! In-memory [`StateRepository`], for tests and embedders without storage.

use std::collections::{BTreeMap, HashMap, HashSet};

use parking_lot::RwLock;
use tracing::debug;

use super::repository::{DocumentQuery, RepositoryResult, StateRepository};
use crate::config::{OUT_POINT_LENGTH, PUBLIC_KEY_HASH_LENGTH};
use crate::crypto::hash::{double_sha256, Hash256};
use crate::data_contract::DataContract;
use crate::document::Document;
use crate::identifier::Identifier;
use crate::identity::Identity;

/// Documents are keyed by (contract id, type), then by document id, so
/// fetches come back in id order.
type DocumentKey = (Identifier, String);

/// Every table sits behind its own lock; no call holds two at once.
#[derive(Debug, Default)]
pub struct InMemoryStateRepository {
    data_contracts: RwLock<HashMap<Identifier, DataContract>>,
    documents: RwLock<HashMap<DocumentKey, BTreeMap<Identifier, Document>>>,
    transactions: RwLock<HashMap<Hash256, Vec<u8>>>,
    identities: RwLock<HashMap<Identifier, Identity>>,
    public_key_hashes: RwLock<HashMap<[u8; PUBLIC_KEY_HASH_LENGTH], Identifier>>,
    used_out_points: RwLock<HashSet<[u8; OUT_POINT_LENGTH]>>,
}

impl InMemoryStateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a core transaction resolvable by its hash, as a chain-locked
    /// asset lock would be. Returns the hash.
    pub fn insert_transaction(&self, raw: Vec<u8>) -> Hash256 {
        let tx_hash = double_sha256(&raw);
        self.transactions.write().insert(tx_hash, raw);
        tx_hash
    }

    /// Identity registered under a public key hash, if any.
    pub fn identity_id_by_public_key_hash(&self, public_key_hash: &[u8; PUBLIC_KEY_HASH_LENGTH]) -> Option<Identifier> {
        self.public_key_hashes.read().get(public_key_hash).copied()
    }

    pub fn document_count(&self) -> usize {
        self.documents.read().values().map(BTreeMap::len).sum()
    }
}

impl StateRepository for InMemoryStateRepository {
    fn fetch_data_contract(&self, id: &Identifier) -> RepositoryResult<Option<DataContract>> {
        Ok(self.data_contracts.read().get(id).cloned())
    }

    fn store_data_contract(&self, data_contract: &DataContract) -> RepositoryResult<()> {
        self.data_contracts
            .write()
            .insert(data_contract.id, data_contract.clone());
        Ok(())
    }

    fn fetch_documents(
        &self,
        data_contract_id: &Identifier,
        document_type: &str,
        query: &DocumentQuery,
    ) -> RepositoryResult<Vec<Document>> {
        let documents = self.documents.read();
        let Some(table) = documents.get(&(*data_contract_id, document_type.to_string())) else {
            return Ok(Vec::new());
        };

        let matching = table.values().filter(|document| query.matches(document)).cloned();
        let found: Vec<Document> = match query.max_results() {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        };
        debug!(
            data_contract_id = %data_contract_id,
            document_type,
            found = found.len(),
            "fetched documents"
        );
        Ok(found)
    }

    fn store_document(&self, document: &Document) -> RepositoryResult<()> {
        self.documents
            .write()
            .entry((document.data_contract_id, document.document_type.clone()))
            .or_default()
            .insert(document.id, document.clone());
        Ok(())
    }

    fn remove_document(
        &self,
        data_contract_id: &Identifier,
        document_type: &str,
        document_id: &Identifier,
    ) -> RepositoryResult<()> {
        if let Some(table) = self
            .documents
            .write()
            .get_mut(&(*data_contract_id, document_type.to_string()))
        {
            table.remove(document_id);
        }
        Ok(())
    }

    fn fetch_transaction(&self, tx_hash: &Hash256) -> RepositoryResult<Option<Vec<u8>>> {
        Ok(self.transactions.read().get(tx_hash).cloned())
    }

    fn fetch_identity(&self, id: &Identifier) -> RepositoryResult<Option<Identity>> {
        Ok(self.identities.read().get(id).cloned())
    }

    fn store_identity(&self, identity: &Identity) -> RepositoryResult<()> {
        self.identities.write().insert(identity.id, identity.clone());
        Ok(())
    }

    fn store_identity_public_key_hashes(
        &self,
        identity_id: &Identifier,
        public_key_hashes: Vec<[u8; PUBLIC_KEY_HASH_LENGTH]>,
    ) -> RepositoryResult<()> {
        let mut index = self.public_key_hashes.write();
        for hash in public_key_hashes {
            index.insert(hash, *identity_id);
        }
        Ok(())
    }

    fn is_asset_lock_transaction_out_point_already_used(
        &self,
        out_point: &[u8; OUT_POINT_LENGTH],
    ) -> RepositoryResult<bool> {
        Ok(self.used_out_points.read().contains(out_point))
    }

    fn mark_asset_lock_transaction_out_point_as_used(
        &self,
        out_point: &[u8; OUT_POINT_LENGTH],
    ) -> RepositoryResult<()> {
        self.used_out_points.write().insert(*out_point);
        Ok(())
    }
}
