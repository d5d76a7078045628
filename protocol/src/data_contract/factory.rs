//! Building data contracts and the transitions that publish them.

use tracing::debug;

use super::{DataContract, DataContractError};
use crate::codec::CanonicalMap;
use crate::crypto::entropy::{EntropySource, OsEntropy};
use crate::identifier::Identifier;
use crate::state_transition::{DataContractCreateTransition, DataContractUpdateTransition};

/// Creates contracts with fresh entropy drawn from `E`.
#[derive(Debug, Default)]
pub struct DataContractFactory<E = OsEntropy> {
    entropy: E,
}

impl<E: EntropySource> DataContractFactory<E> {
    pub fn new(entropy: E) -> Self {
        Self { entropy }
    }

    /// A new contract owned by `owner_id` declaring `documents`.
    pub fn create(&self, owner_id: Identifier, documents: CanonicalMap) -> DataContract {
        let contract = DataContract::new(owner_id, self.entropy.generate(), documents);
        debug!(
            data_contract_id = %contract.id,
            document_types = contract.documents.len(),
            "created data contract"
        );
        contract
    }

    pub fn create_from_object(&self, map: &CanonicalMap) -> Result<DataContract, DataContractError> {
        DataContract::from_object(map)
    }

    pub fn create_from_buffer(&self, bytes: &[u8]) -> Result<DataContract, DataContractError> {
        DataContract::from_buffer(bytes)
    }

    /// Fails for contracts decoded from the wire, which carry no entropy.
    pub fn create_data_contract_create_transition(
        &self,
        data_contract: &DataContract,
    ) -> Result<DataContractCreateTransition, DataContractError> {
        let entropy = data_contract.entropy.ok_or(DataContractError::MissingEntropy {
            contract_id: data_contract.id,
        })?;
        Ok(DataContractCreateTransition::new(data_contract.clone(), entropy))
    }

    pub fn create_data_contract_update_transition(
        &self,
        data_contract: &DataContract,
    ) -> DataContractUpdateTransition {
        DataContractUpdateTransition::new(data_contract.clone())
    }
}
