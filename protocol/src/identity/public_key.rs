//! Public keys registered on an identity.

use serde_json::json;

use super::IdentityError;
use crate::codec::convert::encode_base64;
use crate::codec::{CanonicalMap, CanonicalMapExt, CanonicalValue};
use crate::config::{PUBLIC_KEY_HASH_LENGTH, PUBLIC_KEY_LENGTH};
use crate::crypto::hash::hash160;

/// BLS12-381 G1 compressed point.
const BLS_PUBLIC_KEY_LENGTH: usize = 48;

/// Key algorithms an identity can register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum KeyType {
    /// 33-byte compressed secp256k1 point.
    EcdsaSecp256k1 = 0,
    /// 48-byte BLS public key. Registrable, but this crate cannot sign with it.
    Bls12_381 = 1,
    /// 20-byte HASH160 of a secp256k1 key; the key itself is revealed by
    /// signature recovery.
    EcdsaHash160 = 2,
}

impl KeyType {
    /// Expected length of the key's `data`.
    pub fn data_length(self) -> usize {
        match self {
            Self::EcdsaSecp256k1 => PUBLIC_KEY_LENGTH,
            Self::Bls12_381 => BLS_PUBLIC_KEY_LENGTH,
            Self::EcdsaHash160 => PUBLIC_KEY_HASH_LENGTH,
        }
    }
}

impl TryFrom<i64> for KeyType {
    type Error = IdentityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::EcdsaSecp256k1),
            1 => Ok(Self::Bls12_381),
            2 => Ok(Self::EcdsaHash160),
            other => Err(IdentityError::UnknownKeyType { key_type: other }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPublicKey {
    id: u32,
    key_type: KeyType,
    data: Vec<u8>,
    /// Milliseconds since the Unix epoch; `None` while the key is active.
    disabled_at: Option<i64>,
}

impl IdentityPublicKey {
    /// Build a key, checking `data` has the length its type requires.
    pub fn new(id: u32, key_type: KeyType, data: Vec<u8>) -> Result<Self, IdentityError> {
        if data.len() != key_type.data_length() {
            return Err(IdentityError::InvalidKeyData {
                key_id: id,
                expected: key_type.data_length(),
                actual: data.len(),
            });
        }
        Ok(Self {
            id,
            key_type,
            data,
            disabled_at: None,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn disabled_at(&self) -> Option<i64> {
        self.disabled_at
    }

    pub fn set_disabled_at(&mut self, timestamp_ms: i64) {
        self.disabled_at = Some(timestamp_ms);
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled_at.is_some()
    }

    /// HASH160 of the key, or the data itself for `EcdsaHash160` keys.
    pub fn hash(&self) -> [u8; PUBLIC_KEY_HASH_LENGTH] {
        match self.key_type {
            KeyType::EcdsaHash160 => {
                let mut out = [0u8; PUBLIC_KEY_HASH_LENGTH];
                // Length is checked on construction.
                out.copy_from_slice(&self.data[..PUBLIC_KEY_HASH_LENGTH]);
                out
            }
            _ => hash160(&self.data),
        }
    }

    pub fn to_object(&self) -> CanonicalMap {
        let mut map = CanonicalMap::new();
        map.insert("id".into(), self.id.into());
        map.insert("type".into(), CanonicalValue::from(self.key_type as u32));
        map.insert("data".into(), self.data.clone().into());
        if let Some(disabled_at) = self.disabled_at {
            map.insert("disabledAt".into(), disabled_at.into());
        }
        map
    }

    pub fn from_object(map: &CanonicalMap) -> Result<Self, IdentityError> {
        let id = map.required_u32("id")?;
        let key_type = KeyType::try_from(map.required_integer("type")?)?;
        let data = map.required_bytes("data")?.to_vec();
        let mut key = Self::new(id, key_type, data)?;
        key.disabled_at = map.optional_integer("disabledAt")?;
        Ok(key)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut value = json!({
            "id": self.id,
            "type": self.key_type as u32,
            "data": encode_base64(&self.data),
        });
        if let Some(disabled_at) = self.disabled_at {
            value["disabledAt"] = json!(disabled_at);
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;

    #[test]
    fn test_data_length_enforced() {
        assert!(IdentityPublicKey::new(0, KeyType::EcdsaSecp256k1, vec![2; 33]).is_ok());
        assert_eq!(
            IdentityPublicKey::new(1, KeyType::EcdsaSecp256k1, vec![2; 32]),
            Err(IdentityError::InvalidKeyData { key_id: 1, expected: 33, actual: 32 })
        );
        assert!(IdentityPublicKey::new(0, KeyType::EcdsaHash160, vec![0; 20]).is_ok());
        assert!(IdentityPublicKey::new(0, KeyType::Bls12_381, vec![0; 48]).is_ok());
    }

    #[test]
    fn test_hash_by_key_type() {
        let public = PrivateKey::generate().public_key();
        let ecdsa = IdentityPublicKey::new(0, KeyType::EcdsaSecp256k1, public.to_vec()).unwrap();
        assert_eq!(ecdsa.hash(), public.hash160());

        let hashed = IdentityPublicKey::new(1, KeyType::EcdsaHash160, public.hash160().to_vec()).unwrap();
        assert_eq!(hashed.hash(), public.hash160());
    }

    #[test]
    fn test_object_round_trip_with_disabled_at() {
        let mut key = IdentityPublicKey::new(3, KeyType::EcdsaSecp256k1, vec![3; 33]).unwrap();
        assert!(!key.to_object().contains_key("disabledAt"));
        key.set_disabled_at(1_700_000_000_000);
        let back = IdentityPublicKey::from_object(&key.to_object()).unwrap();
        assert_eq!(back, key);
        assert!(back.is_disabled());
    }

    #[test]
    fn test_unknown_key_type() {
        let mut map = IdentityPublicKey::new(0, KeyType::EcdsaSecp256k1, vec![2; 33])
            .unwrap()
            .to_object();
        map.insert("type".into(), 9i64.into());
        assert_eq!(
            IdentityPublicKey::from_object(&map),
            Err(IdentityError::UnknownKeyType { key_type: 9 })
        );
    }

    #[test]
    fn test_json_view() {
        let key = IdentityPublicKey::new(0, KeyType::EcdsaHash160, vec![0; 20]).unwrap();
        let json = key.to_json();
        assert_eq!(json["type"], 2);
        assert_eq!(json["data"], "AAAAAAAAAAAAAAAAAAAAAAAAAAA=");
    }
}
