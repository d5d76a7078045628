//! Adding and disabling identity keys.

use super::traits::{identity_signed_envelope, Envelope, IdentitySignedTransition, StateTransitionLike};
use super::types::StateTransitionType;
use super::StateTransitionError;
use crate::codec::{array_of_maps, CanonicalMap, CanonicalMapExt, CanonicalValue, CodecError};
use crate::config::PROTOCOL_VERSION;
use crate::identifier::{required_identifier, Identifier};
use crate::identity::IdentityPublicKey;

#[derive(Debug, Clone, PartialEq)]
pub struct IdentityUpdateTransition {
    pub protocol_version: u32,
    pub identity_id: Identifier,
    /// The identity's revision after this update applies.
    pub revision: u32,
    pub add_public_keys: Vec<IdentityPublicKey>,
    pub disable_public_keys: Vec<u32>,
    /// Milliseconds since the Unix epoch. Set whenever keys are disabled.
    pub public_keys_disabled_at: Option<i64>,
    pub signature: Option<Vec<u8>>,
    pub signature_public_key_id: Option<u32>,
}

impl IdentityUpdateTransition {
    pub fn new(identity_id: Identifier, revision: u32) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            identity_id,
            revision,
            add_public_keys: Vec::new(),
            disable_public_keys: Vec::new(),
            public_keys_disabled_at: None,
            signature: None,
            signature_public_key_id: None,
        }
    }

    pub fn from_object(map: &CanonicalMap) -> Result<Self, StateTransitionError> {
        let envelope = Envelope::read(map)?;

        let add_public_keys = match map.optional_array("addPublicKeys")? {
            Some(items) => array_of_maps("addPublicKeys", items)?
                .into_iter()
                .map(IdentityPublicKey::from_object)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        let disable_public_keys = match map.optional_array("disablePublicKeys")? {
            Some(items) => items.iter().map(key_id).collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        let transition = Self {
            protocol_version: envelope.protocol_version,
            identity_id: required_identifier(map, "identityId")?,
            revision: map.required_u32("revision")?,
            add_public_keys,
            disable_public_keys,
            public_keys_disabled_at: map.optional_integer("publicKeysDisabledAt")?,
            signature: envelope.signature,
            signature_public_key_id: envelope.signature_public_key_id,
        };
        transition.verify_disabled_at()?;
        Ok(transition)
    }

    /// Disabling keys needs an explicit timestamp, so every node applies
    /// the same one.
    pub fn verify_disabled_at(&self) -> Result<(), StateTransitionError> {
        if !self.disable_public_keys.is_empty() && self.public_keys_disabled_at.is_none() {
            return Err(StateTransitionError::MissingPublicKeysDisabledAt);
        }
        Ok(())
    }
}

fn key_id(value: &CanonicalValue) -> Result<u32, CodecError> {
    value
        .as_i64()
        .and_then(|id| u32::try_from(id).ok())
        .ok_or_else(|| CodecError::InvalidFieldType {
            field: "disablePublicKeys".into(),
            expected: "u32 key id".into(),
            found: value.kind().into(),
        })
}

impl StateTransitionLike for IdentityUpdateTransition {
    fn protocol_version(&self) -> u32 {
        self.protocol_version
    }

    fn transition_type(&self) -> StateTransitionType {
        StateTransitionType::IdentityUpdate
    }

    fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    fn set_signature(&mut self, signature: Option<Vec<u8>>) {
        self.signature = signature;
    }

    fn to_object(&self, skip_signature: bool) -> CanonicalMap {
        let mut map = identity_signed_envelope(self, skip_signature);
        map.insert("identityId".into(), self.identity_id.into());
        map.insert("revision".into(), self.revision.into());
        if !self.add_public_keys.is_empty() {
            map.insert(
                "addPublicKeys".into(),
                CanonicalValue::Array(
                    self.add_public_keys
                        .iter()
                        .map(|key| key.to_object().into())
                        .collect(),
                ),
            );
        }
        if !self.disable_public_keys.is_empty() {
            map.insert(
                "disablePublicKeys".into(),
                CanonicalValue::Array(self.disable_public_keys.iter().map(|&id| id.into()).collect()),
            );
        }
        if let Some(disabled_at) = self.public_keys_disabled_at {
            map.insert("publicKeysDisabledAt".into(), disabled_at.into());
        }
        map
    }

    fn modified_data_ids(&self) -> Vec<Identifier> {
        vec![self.identity_id]
    }
}

impl IdentitySignedTransition for IdentityUpdateTransition {
    fn owner_id(&self) -> Identifier {
        self.identity_id
    }

    fn signature_public_key_id(&self) -> Option<u32> {
        self.signature_public_key_id
    }

    fn set_signature_public_key_id(&mut self, key_id: Option<u32>) {
        self.signature_public_key_id = key_id;
    }
}
