//! A batch of document create / replace / delete actions by one owner.

use super::document_transition::DocumentTransition;
use super::traits::{identity_signed_envelope, Envelope, IdentitySignedTransition, StateTransitionLike};
use super::types::StateTransitionType;
use super::StateTransitionError;
use crate::codec::{array_of_maps, CanonicalMap, CanonicalMapExt, CanonicalValue};
use crate::config::PROTOCOL_VERSION;
use crate::identifier::{required_identifier, Identifier};

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentsBatchTransition {
    pub protocol_version: u32,
    pub owner_id: Identifier,
    pub transitions: Vec<DocumentTransition>,
    pub signature: Option<Vec<u8>>,
    pub signature_public_key_id: Option<u32>,
}

impl DocumentsBatchTransition {
    pub fn new(owner_id: Identifier, transitions: Vec<DocumentTransition>) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            owner_id,
            transitions,
            signature: None,
            signature_public_key_id: None,
        }
    }

    pub fn from_object(map: &CanonicalMap) -> Result<Self, StateTransitionError> {
        let envelope = Envelope::read(map)?;
        let transitions = array_of_maps("transitions", map.required_array("transitions")?)?
            .into_iter()
            .map(DocumentTransition::from_object)
            .collect::<Result<Vec<_>, _>>()?;

        let batch = Self {
            protocol_version: envelope.protocol_version,
            owner_id: required_identifier(map, "ownerId")?,
            transitions,
            signature: envelope.signature,
            signature_public_key_id: envelope.signature_public_key_id,
        };
        batch.verify_document_ids()?;
        Ok(batch)
    }

    /// Every created document's id must derive from the batch owner.
    pub fn verify_document_ids(&self) -> Result<(), StateTransitionError> {
        self.transitions
            .iter()
            .filter_map(|t| match t {
                DocumentTransition::Create(create) => Some(create),
                _ => None,
            })
            .try_for_each(|create| create.verify_id(&self.owner_id))
    }
}

impl StateTransitionLike for DocumentsBatchTransition {
    fn protocol_version(&self) -> u32 {
        self.protocol_version
    }

    fn transition_type(&self) -> StateTransitionType {
        StateTransitionType::DocumentsBatch
    }

    fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    fn set_signature(&mut self, signature: Option<Vec<u8>>) {
        self.signature = signature;
    }

    fn to_object(&self, skip_signature: bool) -> CanonicalMap {
        let mut map = identity_signed_envelope(self, skip_signature);
        map.insert("ownerId".into(), self.owner_id.into());
        map.insert(
            "transitions".into(),
            CanonicalValue::Array(
                self.transitions
                    .iter()
                    .map(|t| t.to_object().into())
                    .collect(),
            ),
        );
        map
    }

    fn modified_data_ids(&self) -> Vec<Identifier> {
        self.transitions.iter().map(DocumentTransition::id).collect()
    }
}

impl IdentitySignedTransition for DocumentsBatchTransition {
    fn owner_id(&self) -> Identifier {
        self.owner_id
    }

    fn signature_public_key_id(&self) -> Option<u32> {
        self.signature_public_key_id
    }

    fn set_signature_public_key_id(&mut self, key_id: Option<u32>) {
        self.signature_public_key_id = key_id;
    }
}
