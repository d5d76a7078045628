//! The `StateRepository` seam.

use thiserror::Error;

use crate::codec::CanonicalValue;
use crate::config::{OUT_POINT_LENGTH, PUBLIC_KEY_HASH_LENGTH};
use crate::crypto::hash::Hash256;
use crate::data_contract::DataContract;
use crate::document::Document;
use crate::identifier::Identifier;
use crate::identity::Identity;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The backing store failed. The message is backend-specific.
    #[error("state repository backend error: {0}")]
    Backend(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Equality filter over document fields, plus an optional result limit.
///
/// Field names are wire names, so system fields use their `$` prefix:
///
/// ```
/// use dpp::storage::DocumentQuery;
///
/// let query = DocumentQuery::new().where_eq("message", "hello").limit(10);
/// assert_eq!(query.max_results(), Some(10));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentQuery {
    clauses: Vec<(String, CanonicalValue)>,
    limit: Option<usize>,
}

impl DocumentQuery {
    /// A query matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<CanonicalValue>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn max_results(&self) -> Option<usize> {
        self.limit
    }

    /// True when every clause holds. A missing field never matches.
    pub fn matches(&self, document: &Document) -> bool {
        self.clauses
            .iter()
            .all(|(field, expected)| document.get(field).as_ref() == Some(expected))
    }
}

/// Storage the protocol reads and writes while applying transitions.
///
/// Methods take `&self`; implementations own their interior mutability.
/// The protocol never retries a failed call.
pub trait StateRepository: Send + Sync {
    fn fetch_data_contract(&self, id: &Identifier) -> RepositoryResult<Option<DataContract>>;

    fn store_data_contract(&self, data_contract: &DataContract) -> RepositoryResult<()>;

    /// Documents of one type in one contract that satisfy `query`.
    fn fetch_documents(
        &self,
        data_contract_id: &Identifier,
        document_type: &str,
        query: &DocumentQuery,
    ) -> RepositoryResult<Vec<Document>>;

    /// Insert or overwrite by document id.
    fn store_document(&self, document: &Document) -> RepositoryResult<()>;

    fn remove_document(
        &self,
        data_contract_id: &Identifier,
        document_type: &str,
        document_id: &Identifier,
    ) -> RepositoryResult<()>;

    /// Raw core-chain transaction by its double SHA-256 hash.
    fn fetch_transaction(&self, tx_hash: &Hash256) -> RepositoryResult<Option<Vec<u8>>>;

    fn fetch_identity(&self, id: &Identifier) -> RepositoryResult<Option<Identity>>;

    fn store_identity(&self, identity: &Identity) -> RepositoryResult<()>;

    /// Index public key hashes so the identity can be found by key.
    fn store_identity_public_key_hashes(
        &self,
        identity_id: &Identifier,
        public_key_hashes: Vec<[u8; PUBLIC_KEY_HASH_LENGTH]>,
    ) -> RepositoryResult<()>;

    fn is_asset_lock_transaction_out_point_already_used(
        &self,
        out_point: &[u8; OUT_POINT_LENGTH],
    ) -> RepositoryResult<bool>;

    fn mark_asset_lock_transaction_out_point_as_used(
        &self,
        out_point: &[u8; OUT_POINT_LENGTH],
    ) -> RepositoryResult<()>;
}
