//! # Data Contracts
//!
//! A data contract declares the document types an application stores on
//! the platform. Each type is a JSON-Schema-shaped map; this crate keeps
//! those schemas as canonical values and never interprets them beyond
//! reading the `required` list (see [`DataContract::required_fields`]).
//! Schema semantics belong to whatever [`Validator`](crate::validation::Validator)
//! the caller plugs in.
//!
//! The contract id is `double_sha256(owner_id || entropy)`, so the entropy
//! has to travel with the create transition for anyone to re-derive it.

pub mod factory;

use serde_json::json;
use thiserror::Error;

pub use factory::DataContractFactory;

use crate::codec::{self, CanonicalMap, CanonicalMapExt, CanonicalValue, CodecError, CodecResult};
use crate::config::{DATA_CONTRACT_SCHEMA_URI, ENTROPY_LENGTH, PROTOCOL_VERSION};
use crate::crypto::hash::{derive_data_contract_id, double_sha256, Hash256};
use crate::identifier::{required_identifier, Identifier};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataContractError {
    #[error("data contract {contract_id} does not define document type `{document_type}`")]
    InvalidDocumentType {
        document_type: String,
        contract_id: Identifier,
    },

    /// A contract decoded from the wire has no entropy, so it cannot be put
    /// into a create transition.
    #[error("data contract {contract_id} has no entropy")]
    MissingEntropy { contract_id: Identifier },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataContract {
    pub protocol_version: u32,
    pub id: Identifier,
    /// Meta-schema URI (`$schema`).
    pub schema: String,
    pub owner_id: Identifier,
    /// Document type name to its schema.
    pub documents: CanonicalMap,
    /// Shared schema definitions (`$defs`).
    pub definitions: Option<CanonicalMap>,
    /// Entropy the id was derived from. Only known to the creator.
    pub entropy: Option<[u8; ENTROPY_LENGTH]>,
}

impl DataContract {
    /// A fresh contract whose id is derived from `owner_id` and `entropy`.
    pub fn new(owner_id: Identifier, entropy: [u8; ENTROPY_LENGTH], documents: CanonicalMap) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            id: derive_data_contract_id(&owner_id, &entropy),
            schema: DATA_CONTRACT_SCHEMA_URI.to_string(),
            owner_id,
            documents,
            definitions: None,
            entropy: Some(entropy),
        }
    }

    pub fn is_document_defined(&self, document_type: &str) -> bool {
        self.documents.contains_key(document_type)
    }

    pub fn document_types(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn get_document_schema(&self, document_type: &str) -> Result<&CanonicalMap, DataContractError> {
        self.documents
            .get(document_type)
            .and_then(CanonicalValue::as_map)
            .ok_or_else(|| DataContractError::InvalidDocumentType {
                document_type: document_type.to_string(),
                contract_id: self.id,
            })
    }

    pub fn set_document_schema(&mut self, document_type: impl Into<String>, schema: CanonicalMap) {
        self.documents.insert(document_type.into(), schema.into());
    }

    /// Names listed in the type schema's `required` array. Non-text entries
    /// are ignored.
    pub fn required_fields(&self, document_type: &str) -> Result<Vec<&str>, DataContractError> {
        let schema = self.get_document_schema(document_type)?;
        Ok(schema
            .get("required")
            .and_then(CanonicalValue::as_array)
            .map(|items| items.iter().filter_map(CanonicalValue::as_text).collect())
            .unwrap_or_default())
    }

    pub fn to_object(&self) -> CanonicalMap {
        let mut map = CanonicalMap::new();
        map.insert("protocolVersion".into(), self.protocol_version.into());
        map.insert("$id".into(), self.id.into());
        map.insert("$schema".into(), self.schema.clone().into());
        map.insert("ownerId".into(), self.owner_id.into());
        map.insert("documents".into(), self.documents.clone().into());
        if let Some(definitions) = &self.definitions {
            map.insert("$defs".into(), definitions.clone().into());
        }
        map
    }

    pub fn from_object(map: &CanonicalMap) -> Result<Self, DataContractError> {
        Ok(Self {
            protocol_version: map.required_u32("protocolVersion")?,
            id: required_identifier(map, "$id")?,
            schema: map.required_text("$schema")?.to_string(),
            owner_id: required_identifier(map, "ownerId")?,
            documents: map.required_map("documents")?.clone(),
            definitions: map.optional_map("$defs")?.cloned(),
            entropy: None,
        })
    }

    pub fn to_buffer(&self) -> CodecResult<Vec<u8>> {
        let mut map = self.to_object();
        map.remove("protocolVersion");
        codec::encode_with_version(self.protocol_version, &map)
    }

    pub fn from_buffer(bytes: &[u8]) -> Result<Self, DataContractError> {
        let (version, mut map) = codec::decode_with_version(bytes)?;
        map.insert("protocolVersion".into(), version.into());
        Self::from_object(&map)
    }

    pub fn hash(&self) -> CodecResult<Hash256> {
        Ok(double_sha256(&self.to_buffer()?))
    }

    /// JSON view with base58 identifiers.
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = json!({
            "protocolVersion": self.protocol_version,
            "$id": self.id.to_string(),
            "$schema": self.schema,
            "ownerId": self.owner_id.to_string(),
            "documents": CanonicalValue::Map(self.documents.clone()).to_json(),
        });
        if let Some(definitions) = &self.definitions {
            value["$defs"] = CanonicalValue::Map(definitions.clone()).to_json();
        }
        value
    }
}
