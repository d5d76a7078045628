//! Building documents and the batches that submit them.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use super::{fields, Document, DocumentError};
use crate::codec::{CanonicalMap, CanonicalValue};
use crate::crypto::entropy::{EntropySource, OsEntropy};
use crate::data_contract::DataContract;
use crate::identifier::Identifier;
use crate::state_transition::{
    DocumentCreateTransition, DocumentDeleteTransition, DocumentReplaceTransition, DocumentTransition,
    DocumentTransitionBase, DocumentsBatchTransition,
};
use crate::validation::Validator;

/// Documents to submit in one batch, grouped by action.
#[derive(Debug, Clone, Default)]
pub struct DocumentsBatchActions {
    pub create: Vec<Document>,
    pub replace: Vec<Document>,
    pub delete: Vec<Document>,
}

impl DocumentsBatchActions {
    fn is_empty(&self) -> bool {
        self.create.is_empty() && self.replace.is_empty() && self.delete.is_empty()
    }

    fn all(&self) -> impl Iterator<Item = &Document> {
        self.create.iter().chain(&self.replace).chain(&self.delete)
    }
}

/// Creates documents with fresh entropy drawn from `E`, optionally
/// checking them against their type schema.
pub struct DocumentFactory<E = OsEntropy> {
    entropy: E,
    validator: Option<Arc<dyn Validator>>,
}

impl<E: fmt::Debug> fmt::Debug for DocumentFactory<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentFactory")
            .field("entropy", &self.entropy)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

impl<E: EntropySource> DocumentFactory<E> {
    pub fn new(entropy: E) -> Self {
        Self {
            entropy,
            validator: None,
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// A new document of `document_type` owned by `owner_id`.
    ///
    /// `$createdAt` / `$updatedAt` are stamped with the current time when
    /// the type schema lists them as required.
    pub fn create(
        &self,
        data_contract: &DataContract,
        owner_id: Identifier,
        document_type: &str,
        data: CanonicalMap,
    ) -> Result<Document, DocumentError> {
        let schema = data_contract.get_document_schema(document_type)?;
        if let Some(field) = data.keys().find(|key| key.starts_with('$')) {
            return Err(DocumentError::ReservedField { field: field.clone() });
        }

        let mut document = Document::new(
            data_contract.id,
            owner_id,
            document_type,
            self.entropy.generate(),
            data,
        );

        let required = data_contract.required_fields(document_type)?;
        let now = Utc::now().timestamp_millis();
        if required.contains(&fields::CREATED_AT) {
            document.created_at = Some(now);
        }
        if required.contains(&fields::UPDATED_AT) {
            document.updated_at = Some(now);
        }

        if let Some(validator) = &self.validator {
            let schema = CanonicalValue::Map(schema.clone()).to_json();
            let result = validator.validate(&schema, &document.to_json());
            if !result.is_valid() {
                warn!(
                    document_type,
                    issues = result.errors.len(),
                    "document failed schema validation"
                );
                return Err(DocumentError::InvalidData { errors: result.errors });
            }
        }

        debug!(document_id = %document.id, document_type, "created document");
        Ok(document)
    }

    pub fn create_from_object(&self, map: &CanonicalMap) -> Result<Document, DocumentError> {
        Document::from_object(map)
    }

    pub fn create_from_buffer(&self, bytes: &[u8]) -> Result<Document, DocumentError> {
        Document::from_buffer(bytes)
    }

    /// Build a documents batch. Every document must share one owner.
    ///
    /// Replace actions carry `revision + 1` and, if the document tracks
    /// `$updatedAt`, a fresh timestamp.
    pub fn create_state_transition(
        &self,
        actions: DocumentsBatchActions,
    ) -> Result<DocumentsBatchTransition, DocumentError> {
        if actions.is_empty() {
            return Err(DocumentError::EmptyBatch);
        }
        let owner_id = actions
            .all()
            .next()
            .map(|document| document.owner_id)
            .ok_or(DocumentError::EmptyBatch)?;
        if let Some(stray) = actions.all().find(|document| document.owner_id != owner_id) {
            return Err(DocumentError::MismatchedOwner {
                document_id: stray.id,
                expected: owner_id,
                actual: stray.owner_id,
            });
        }

        let now = Utc::now().timestamp_millis();
        let mut transitions = Vec::with_capacity(actions.create.len() + actions.replace.len() + actions.delete.len());

        for document in &actions.create {
            let entropy = document.entropy.ok_or(DocumentError::MissingEntropy {
                document_id: document.id,
            })?;
            transitions.push(DocumentTransition::Create(DocumentCreateTransition {
                base: base(document),
                entropy,
                created_at: document.created_at,
                updated_at: document.updated_at,
                data: document.data.clone(),
            }));
        }
        for document in &actions.replace {
            let revision = document
                .revision
                .checked_add(1)
                .ok_or(DocumentError::RevisionOverflow {
                    document_id: document.id,
                    revision: document.revision,
                })?;
            transitions.push(DocumentTransition::Replace(DocumentReplaceTransition {
                base: base(document),
                revision,
                updated_at: document.updated_at.map(|_| now),
                data: document.data.clone(),
            }));
        }
        for document in &actions.delete {
            transitions.push(DocumentTransition::Delete(DocumentDeleteTransition { base: base(document) }));
        }

        debug!(
            owner_id = %owner_id,
            create = actions.create.len(),
            replace = actions.replace.len(),
            delete = actions.delete.len(),
            "built documents batch"
        );
        Ok(DocumentsBatchTransition::new(owner_id, transitions))
    }
}

fn base(document: &Document) -> DocumentTransitionBase {
    DocumentTransitionBase {
        id: document.id,
        document_type: document.document_type.clone(),
        data_contract_id: document.data_contract_id,
    }
}
