//! Crate-wide error, for callers that do not care which layer failed.

use thiserror::Error;

use crate::codec::{CodecError, ConversionError};
use crate::crypto::keys::KeyError;
use crate::crypto::signatures::SignatureError;
use crate::data_contract::DataContractError;
use crate::document::DocumentError;
use crate::identifier::IdentifierError;
use crate::identity::{AssetLockError, IdentityError};
use crate::state_transition::{ApplyError, StateTransitionError};
use crate::storage::RepositoryError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    DataContract(#[from] DataContractError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    AssetLock(#[from] AssetLockError),

    #[error(transparent)]
    StateTransition(#[from] StateTransitionError),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
