//! Publishing a new data contract.

use super::traits::{identity_signed_envelope, Envelope, IdentitySignedTransition, StateTransitionLike};
use super::types::StateTransitionType;
use super::StateTransitionError;
use crate::codec::{CanonicalMap, CanonicalMapExt};
use crate::config::{ENTROPY_LENGTH, PROTOCOL_VERSION};
use crate::crypto::hash::derive_data_contract_id;
use crate::data_contract::DataContract;
use crate::identifier::Identifier;

#[derive(Debug, Clone, PartialEq)]
pub struct DataContractCreateTransition {
    pub protocol_version: u32,
    pub data_contract: DataContract,
    /// Lets validators re-derive the contract id from the owner.
    pub entropy: [u8; ENTROPY_LENGTH],
    pub signature: Option<Vec<u8>>,
    pub signature_public_key_id: Option<u32>,
}

impl DataContractCreateTransition {
    pub fn new(data_contract: DataContract, entropy: [u8; ENTROPY_LENGTH]) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            data_contract,
            entropy,
            signature: None,
            signature_public_key_id: None,
        }
    }

    /// Decode and check the contract id against its owner and entropy.
    pub fn from_object(map: &CanonicalMap) -> Result<Self, StateTransitionError> {
        let envelope = Envelope::read(map)?;
        let entropy = map.required_fixed_bytes::<ENTROPY_LENGTH>("entropy")?;
        let mut data_contract = DataContract::from_object(map.required_map("dataContract")?)?;
        data_contract.entropy = Some(entropy);

        let transition = Self {
            protocol_version: envelope.protocol_version,
            data_contract,
            entropy,
            signature: envelope.signature,
            signature_public_key_id: envelope.signature_public_key_id,
        };
        transition.verify_data_contract_id()?;
        Ok(transition)
    }

    /// The contract id must be `derive_data_contract_id(owner_id, entropy)`.
    pub fn verify_data_contract_id(&self) -> Result<(), StateTransitionError> {
        let expected = derive_data_contract_id(&self.data_contract.owner_id, &self.entropy);
        if expected != self.data_contract.id {
            return Err(StateTransitionError::InvalidDataContractId {
                expected,
                actual: self.data_contract.id,
            });
        }
        Ok(())
    }
}

impl StateTransitionLike for DataContractCreateTransition {
    fn protocol_version(&self) -> u32 {
        self.protocol_version
    }

    fn transition_type(&self) -> StateTransitionType {
        StateTransitionType::DataContractCreate
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
        map.insert("entropy".into(), self.entropy.as_slice().into());
        map
    }

    fn modified_data_ids(&self) -> Vec<Identifier> {
        vec![self.data_contract.id]
    }
}

impl IdentitySignedTransition for DataContractCreateTransition {
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
