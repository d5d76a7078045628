//! # Documents
//!
//! A document is one record of a type declared by a data contract. System
//! fields carry a `$` prefix on the wire (`$id`, `$type`, `$ownerId`, ...);
//! everything else is user data, stored flat beside them.
//!
//! The document id is `double_sha256(contract_id || owner_id || type ||
//! entropy)`, so the same owner can create many documents of one type by
//! drawing fresh entropy each time.

pub mod factory;

use serde_json::json;
use thiserror::Error;

pub use factory::{DocumentFactory, DocumentsBatchActions};

use crate::codec::{self, CanonicalMap, CanonicalMapExt, CanonicalValue, CodecError, CodecResult};
use crate::config::{ENTROPY_LENGTH, PROTOCOL_VERSION};
use crate::crypto::hash::{derive_document_id, double_sha256, Hash256};
use crate::data_contract::DataContractError;
use crate::identifier::{required_identifier, Identifier};
use crate::validation::ValidationIssue;

/// Wire names of the system fields.
pub mod fields {
    pub const PROTOCOL_VERSION: &str = "$protocolVersion";
    pub const ID: &str = "$id";
    pub const TYPE: &str = "$type";
    pub const DATA_CONTRACT_ID: &str = "$dataContractId";
    pub const OWNER_ID: &str = "$ownerId";
    pub const REVISION: &str = "$revision";
    pub const CREATED_AT: &str = "$createdAt";
    pub const UPDATED_AT: &str = "$updatedAt";
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DocumentError {
    /// User data may not use the `$` prefix reserved for system fields.
    #[error("data field `{field}` uses the reserved `$` prefix")]
    ReservedField { field: String },

    #[error("document data failed schema validation ({} issues)", errors.len())]
    InvalidData { errors: Vec<ValidationIssue> },

    #[error("document {document_id} is owned by {actual}, batch owner is {expected}")]
    MismatchedOwner {
        document_id: Identifier,
        expected: Identifier,
        actual: Identifier,
    },

    #[error("a documents batch needs at least one document")]
    EmptyBatch,

    /// Only documents built locally know the entropy their id came from.
    #[error("document {document_id} has no entropy and cannot be created")]
    MissingEntropy { document_id: Identifier },

    #[error("document {document_id} is at the last revision {revision}")]
    RevisionOverflow { document_id: Identifier, revision: u32 },

    #[error(transparent)]
    DataContract(#[from] DataContractError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub protocol_version: u32,
    pub id: Identifier,
    pub document_type: String,
    pub data_contract_id: Identifier,
    pub owner_id: Identifier,
    pub revision: u32,
    /// Milliseconds since the Unix epoch.
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub data: CanonicalMap,
    /// Entropy the id was derived from. Only known to the creator.
    pub entropy: Option<[u8; ENTROPY_LENGTH]>,
}

/// Revision of a freshly created document.
pub const INITIAL_REVISION: u32 = 1;

impl Document {
    pub fn new(
        data_contract_id: Identifier,
        owner_id: Identifier,
        document_type: impl Into<String>,
        entropy: [u8; ENTROPY_LENGTH],
        data: CanonicalMap,
    ) -> Self {
        let document_type = document_type.into();
        Self {
            protocol_version: PROTOCOL_VERSION,
            id: derive_document_id(&data_contract_id, &owner_id, &document_type, &entropy),
            document_type,
            data_contract_id,
            owner_id,
            revision: INITIAL_REVISION,
            created_at: None,
            updated_at: None,
            data,
            entropy: Some(entropy),
        }
    }

    /// Look up a field by wire name, system or user.
    pub fn get(&self, field: &str) -> Option<CanonicalValue> {
        match field {
            fields::ID => Some(self.id.into()),
            fields::TYPE => Some(self.document_type.clone().into()),
            fields::DATA_CONTRACT_ID => Some(self.data_contract_id.into()),
            fields::OWNER_ID => Some(self.owner_id.into()),
            fields::REVISION => Some(self.revision.into()),
            fields::CREATED_AT => self.created_at.map(Into::into),
            fields::UPDATED_AT => self.updated_at.map(Into::into),
            _ => self.data.get(field).cloned(),
        }
    }

    pub fn to_object(&self) -> CanonicalMap {
        let mut map = self.data.clone();
        map.insert(fields::PROTOCOL_VERSION.into(), self.protocol_version.into());
        map.insert(fields::ID.into(), self.id.into());
        map.insert(fields::TYPE.into(), self.document_type.clone().into());
        map.insert(fields::DATA_CONTRACT_ID.into(), self.data_contract_id.into());
        map.insert(fields::OWNER_ID.into(), self.owner_id.into());
        map.insert(fields::REVISION.into(), self.revision.into());
        if let Some(created_at) = self.created_at {
            map.insert(fields::CREATED_AT.into(), created_at.into());
        }
        if let Some(updated_at) = self.updated_at {
            map.insert(fields::UPDATED_AT.into(), updated_at.into());
        }
        map
    }

    pub fn from_object(map: &CanonicalMap) -> Result<Self, DocumentError> {
        let data = map
            .iter()
            .filter(|(key, _)| !key.starts_with('$'))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Self {
            protocol_version: map.required_u32(fields::PROTOCOL_VERSION)?,
            id: required_identifier(map, fields::ID)?,
            document_type: map.required_text(fields::TYPE)?.to_string(),
            data_contract_id: required_identifier(map, fields::DATA_CONTRACT_ID)?,
            owner_id: required_identifier(map, fields::OWNER_ID)?,
            revision: map.required_u32(fields::REVISION)?,
            created_at: map.optional_integer(fields::CREATED_AT)?,
            updated_at: map.optional_integer(fields::UPDATED_AT)?,
            data,
            entropy: None,
        })
    }

    pub fn to_buffer(&self) -> CodecResult<Vec<u8>> {
        let mut map = self.to_object();
        map.remove(fields::PROTOCOL_VERSION);
        codec::encode_with_version(self.protocol_version, &map)
    }

    pub fn from_buffer(bytes: &[u8]) -> Result<Self, DocumentError> {
        let (version, mut map) = codec::decode_with_version(bytes)?;
        map.insert(fields::PROTOCOL_VERSION.into(), version.into());
        Self::from_object(&map)
    }

    pub fn hash(&self) -> CodecResult<Hash256> {
        Ok(double_sha256(&self.to_buffer()?))
    }

    /// JSON view: identifiers in base58, user byte strings in base64.
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = CanonicalValue::Map(self.data.clone()).to_json();
        let system = json!({
            "$protocolVersion": self.protocol_version,
            "$id": self.id.to_string(),
            "$type": self.document_type,
            "$dataContractId": self.data_contract_id.to_string(),
            "$ownerId": self.owner_id.to_string(),
            "$revision": self.revision,
        });
        if let (Some(target), Some(system)) = (value.as_object_mut(), system.as_object()) {
            target.extend(system.clone());
            if let Some(created_at) = self.created_at {
                target.insert(fields::CREATED_AT.into(), json!(created_at));
            }
            if let Some(updated_at) = self.updated_at {
                target.insert(fields::UPDATED_AT.into(), json!(updated_at));
            }
        }
        value
    }
}
