//! Replacing a published data contract.

use super::traits::{identity_signed_envelope, Envelope, IdentitySignedTransition, StateTransitionLike};
use super::types::StateTransitionType;
use super::StateTransitionError;
use crate::codec::{CanonicalMap, CanonicalMapExt};
use crate::config::PROTOCOL_VERSION;
use crate::data_contract::DataContract;
use crate::identifier::Identifier;

#[derive(Debug, Clone, PartialEq)]
pub struct DataContractUpdateTransition {
    pub protocol_version: u32,
    pub data_contract: DataContract,
    pub signature: Option<Vec<u8>>,
    pub signature_public_key_id: Option<u32>,
}

impl DataContractUpdateTransition {
    pub fn new(data_contract: DataContract) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            data_contract,
            signature: None,
            signature_public_key_id: None,
        }
    }

    pub fn from_object(map: &CanonicalMap) -> Result<Self, StateTransitionError> {
        let envelope = Envelope::read(map)?;
        Ok(Self {
            protocol_version: envelope.protocol_version,
            data_contract: DataContract::from_object(map.required_map("dataContract")?)?,
            signature: envelope.signature,
            signature_public_key_id: envelope.signature_public_key_id,
        })
    }
}

impl StateTransitionLike for DataContractUpdateTransition {
    fn protocol_version(&self) -> u32 {
        self.protocol_version
    }

    fn transition_type(&self) -> StateTransitionType {
        StateTransitionType::DataContractUpdate
    }

    fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    fn set_signature(&mut self, signature: Option<Vec<u8>>) {
        self.signature = signature;
    }

    fn to_object(&self, skip_signature: bool) -> CanonicalMap {
        let mut map = identity_signed_envelope(self, skip_signature);
        map.insert("dataContract".into(), self.data_contract.to_object().into());
        map
    }

    fn modified_data_ids(&self) -> Vec<Identifier> {
        vec![self.data_contract.id]
    }
}

impl IdentitySignedTransition for DataContractUpdateTransition {
    fn owner_id(&self) -> Identifier {
        self.data_contract.owner_id
    }

    fn signature_public_key_id(&self) -> Option<u32> {
        self.signature_public_key_id
    }

    fn set_signature_public_key_id(&mut self, key_id: Option<u32>) {
        self.signature_public_key_id = key_id;
    }
}
