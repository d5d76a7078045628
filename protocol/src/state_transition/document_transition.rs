//! Per-document actions carried inside a documents batch.
//!
//! Each action shares the base fields `$id`, `$type`, `$action` and
//! `$dataContractId`. Create adds `$entropy` and optional timestamps,
//! Replace adds `$revision` and `$updatedAt`. Both carry the user data
//! flat beside the system fields, as documents do.

use super::StateTransitionError;
use crate::codec::{CanonicalMap, CanonicalMapExt, CanonicalValue};
use crate::config::{ENTROPY_LENGTH, PROTOCOL_VERSION};
use crate::crypto::hash::derive_document_id;
use crate::document::{fields, Document, INITIAL_REVISION};
use crate::identifier::{required_identifier, Identifier};

pub const ACTION: &str = "$action";
pub const ENTROPY: &str = "$entropy";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum DocumentTransitionAction {
    Create = 0,
    Replace = 1,
    Delete = 3,
}

impl TryFrom<i64> for DocumentTransitionAction {
    type Error = StateTransitionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Create),
            1 => Ok(Self::Replace),
            3 => Ok(Self::Delete),
            other => Err(StateTransitionError::InvalidDocumentAction { action: other }),
        }
    }
}

/// Fields every action carries.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTransitionBase {
    pub id: Identifier,
    pub document_type: String,
    pub data_contract_id: Identifier,
}

impl DocumentTransitionBase {
    fn write(&self, action: DocumentTransitionAction, map: &mut CanonicalMap) {
        map.insert(fields::ID.into(), self.id.into());
        map.insert(fields::TYPE.into(), self.document_type.clone().into());
        map.insert(ACTION.into(), CanonicalValue::from(action as u32));
        map.insert(fields::DATA_CONTRACT_ID.into(), self.data_contract_id.into());
    }

    fn read(map: &CanonicalMap) -> Result<Self, StateTransitionError> {
        Ok(Self {
            id: required_identifier(map, fields::ID)?,
            document_type: map.required_text(fields::TYPE)?.to_string(),
            data_contract_id: required_identifier(map, fields::DATA_CONTRACT_ID)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentCreateTransition {
    pub base: DocumentTransitionBase,
    pub entropy: [u8; ENTROPY_LENGTH],
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub data: CanonicalMap,
}

impl DocumentCreateTransition {
    /// The id must be derived from contract, owner, type and entropy.
    pub fn verify_id(&self, owner_id: &Identifier) -> Result<(), StateTransitionError> {
        let expected = derive_document_id(
            &self.base.data_contract_id,
            owner_id,
            &self.base.document_type,
            &self.entropy,
        );
        if expected != self.base.id {
            return Err(StateTransitionError::InvalidDocumentId {
                expected,
                actual: self.base.id,
            });
        }
        Ok(())
    }

    /// The document this action produces once applied.
    pub fn to_document(&self, owner_id: Identifier) -> Document {
        Document {
            protocol_version: PROTOCOL_VERSION,
            id: self.base.id,
            document_type: self.base.document_type.clone(),
            data_contract_id: self.base.data_contract_id,
            owner_id,
            revision: INITIAL_REVISION,
            created_at: self.created_at,
            updated_at: self.updated_at,
            data: self.data.clone(),
            entropy: Some(self.entropy),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentReplaceTransition {
    pub base: DocumentTransitionBase,
    pub revision: u32,
    pub updated_at: Option<i64>,
    pub data: CanonicalMap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentDeleteTransition {
    pub base: DocumentTransitionBase,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentTransition {
    Create(DocumentCreateTransition),
    Replace(DocumentReplaceTransition),
    Delete(DocumentDeleteTransition),
}

impl DocumentTransition {
    pub fn action(&self) -> DocumentTransitionAction {
        match self {
            Self::Create(_) => DocumentTransitionAction::Create,
            Self::Replace(_) => DocumentTransitionAction::Replace,
            Self::Delete(_) => DocumentTransitionAction::Delete,
        }
    }

    pub fn base(&self) -> &DocumentTransitionBase {
        match self {
            Self::Create(t) => &t.base,
            Self::Replace(t) => &t.base,
            Self::Delete(t) => &t.base,
        }
    }

    pub fn id(&self) -> Identifier {
        self.base().id
    }

    pub fn to_object(&self) -> CanonicalMap {
        let mut map = match self {
            Self::Create(t) => {
                let mut map = t.data.clone();
                map.insert(ENTROPY.into(), t.entropy.as_slice().into());
                if let Some(created_at) = t.created_at {
                    map.insert(fields::CREATED_AT.into(), created_at.into());
                }
                if let Some(updated_at) = t.updated_at {
                    map.insert(fields::UPDATED_AT.into(), updated_at.into());
                }
                map
            }
            Self::Replace(t) => {
                let mut map = t.data.clone();
                map.insert(fields::REVISION.into(), t.revision.into());
                if let Some(updated_at) = t.updated_at {
                    map.insert(fields::UPDATED_AT.into(), updated_at.into());
                }
                map
            }
            Self::Delete(_) => CanonicalMap::new(),
        };
        self.base().write(self.action(), &mut map);
        map
    }

    pub fn from_object(map: &CanonicalMap) -> Result<Self, StateTransitionError> {
        let action = DocumentTransitionAction::try_from(map.required_integer(ACTION)?)?;
        let base = DocumentTransitionBase::read(map)?;

        Ok(match action {
            DocumentTransitionAction::Create => Self::Create(DocumentCreateTransition {
                base,
                entropy: map.required_fixed_bytes::<ENTROPY_LENGTH>(ENTROPY)?,
                created_at: map.optional_integer(fields::CREATED_AT)?,
                updated_at: map.optional_integer(fields::UPDATED_AT)?,
                data: user_data(map),
            }),
            DocumentTransitionAction::Replace => Self::Replace(DocumentReplaceTransition {
                base,
                revision: map.required_u32(fields::REVISION)?,
                updated_at: map.optional_integer(fields::UPDATED_AT)?,
                data: user_data(map),
            }),
            DocumentTransitionAction::Delete => Self::Delete(DocumentDeleteTransition { base }),
        })
    }
}

fn user_data(map: &CanonicalMap) -> CanonicalMap {
    map.iter()
        .filter(|(key, _)| !key.starts_with('$'))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
