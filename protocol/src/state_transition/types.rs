//! Type tags and small value types shared by every state transition.

use super::StateTransitionError;
use crate::codec::CanonicalValue;

/// Wire names of the envelope fields.
pub mod fields {
    pub const PROTOCOL_VERSION: &str = "protocolVersion";
    pub const TYPE: &str = "type";
    pub const SIGNATURE: &str = "signature";
    pub const SIGNATURE_PUBLIC_KEY_ID: &str = "signaturePublicKeyId";
}

/// Closed set of transition kinds, tagged as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum StateTransitionType {
    DataContractCreate = 0,
    DocumentsBatch = 1,
    IdentityCreate = 2,
    IdentityTopUp = 3,
    DataContractUpdate = 4,
    IdentityUpdate = 5,
}

impl StateTransitionType {
    /// Transitions signed by one of the owning identity's keys, as opposed
    /// to the asset lock key.
    pub fn is_identity_signed(self) -> bool {
        !matches!(self, Self::IdentityCreate | Self::IdentityTopUp)
    }
}

impl TryFrom<i64> for StateTransitionType {
    type Error = StateTransitionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::DataContractCreate),
            1 => Ok(Self::DocumentsBatch),
            2 => Ok(Self::IdentityCreate),
            3 => Ok(Self::IdentityTopUp),
            4 => Ok(Self::DataContractUpdate),
            5 => Ok(Self::IdentityUpdate),
            other => Err(StateTransitionError::InvalidType {
                transition_type: other,
            }),
        }
    }
}

impl From<StateTransitionType> for CanonicalValue {
    fn from(value: StateTransitionType) -> Self {
        CanonicalValue::from(value as u32)
    }
}

/// Where a transition is in its signing lifecycle. Verification outcomes
/// are returned to the caller, not recorded on the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureState {
    Unsigned,
    Signed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_match_wire_values() {
        for tag in 0..=5i64 {
            let parsed = StateTransitionType::try_from(tag).unwrap();
            assert_eq!(parsed as i64, tag);
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(
            StateTransitionType::try_from(6),
            Err(StateTransitionError::InvalidType { transition_type: 6 })
        );
        assert!(StateTransitionType::try_from(-1).is_err());
    }

    #[test]
    fn test_identity_signed_split() {
        assert!(!StateTransitionType::IdentityCreate.is_identity_signed());
        assert!(!StateTransitionType::IdentityTopUp.is_identity_signed());
        assert!(StateTransitionType::DocumentsBatch.is_identity_signed());
        assert!(StateTransitionType::IdentityUpdate.is_identity_signed());
    }
}
