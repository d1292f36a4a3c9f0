//! Ed25519 publisher keys.
//!
//! A publisher's identity is its 32-byte verifying key. Every mutation is
//! signed by the secret half, so holding a [`KeyPair`] is what makes an actor
//! the owner of the roots and metadata filed under its [`PublisherId`].

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;
use crate::types::PublisherId;

/// Type alias for Ed25519 secret/signing key.
pub type SecretKey = SigningKey;

/// Ed25519 public key, serialized as its raw 32 bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[u8; 32]", into = "[u8; 32]")]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Create a PublicKey from raw bytes, rejecting points off the curve.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        VerifyingKey::from_bytes(bytes)
            .map(PublicKey)
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// Parse a hex-encoded public key.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes: [u8; 32] = hex::decode(s)
            .ok()
            .and_then(|v| v.try_into().ok())
            .ok_or(CryptoError::InvalidPublicKey)?;
        Self::from_bytes(&bytes)
    }

    /// Get the raw bytes of the public key.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    /// The publisher identity this key controls.
    #[inline]
    pub fn id(&self) -> PublisherId {
        PublisherId(*self.0.as_bytes())
    }

    pub(crate) fn inner(&self) -> &VerifyingKey {
        &self.0
    }
}

impl TryFrom<[u8; 32]> for PublicKey {
    type Error = CryptoError;

    fn try_from(bytes: [u8; 32]) -> Result<Self, Self::Error> {
        PublicKey::from_bytes(&bytes)
    }
}

impl From<PublicKey> for [u8; 32] {
    fn from(key: PublicKey) -> Self {
        *key.as_bytes()
    }
}

impl From<VerifyingKey> for PublicKey {
    fn from(key: VerifyingKey) -> Self {
        PublicKey(key)
    }
}

/// Ed25519 key pair owned by a publisher.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new random key pair using the OS random number generator.
    pub fn generate() -> Self {
        KeyPair {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Create a key pair from a 32-byte secret seed.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        KeyPair {
            signing_key: SigningKey::from_bytes(bytes),
        }
    }

    /// Parse a hex-encoded 32-byte secret seed.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes: [u8; 32] = hex::decode(s.trim())
            .ok()
            .and_then(|v| v.try_into().ok())
            .ok_or(CryptoError::InvalidSecretKey)?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key())
    }

    /// Shorthand for `public_key().id()`.
    pub fn id(&self) -> PublisherId {
        self.public_key().id()
    }

    /// Get the signing (secret) key.
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Get the raw bytes of the secret seed.
    ///
    /// Anyone holding these bytes controls every root the publisher owns.
    pub fn secret_bytes(&self) -> &[u8; 32] {
        self.signing_key.as_bytes()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.id())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation_uniqueness() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        assert_ne!(kp1.id(), kp2.id());
    }

    #[test]
    fn test_keypair_from_bytes() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::from_bytes(kp1.secret_bytes());
        assert_eq!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn test_keypair_from_hex() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::from_hex(&hex::encode(kp1.secret_bytes())).unwrap();
        assert_eq!(kp1.id(), kp2.id());

        assert!(matches!(
            KeyPair::from_hex("abcd"),
            Err(CryptoError::InvalidSecretKey)
        ));
    }

    #[test]
    fn test_public_key_serialization() {
        let pk = KeyPair::generate().public_key();
        let bytes = crate::serialization::serialize(&pk).unwrap();
        assert_eq!(bytes.len(), 32);

        let recovered: PublicKey = crate::serialization::deserialize(&bytes).unwrap();
        assert_eq!(pk, recovered);
    }

    #[test]
    fn test_public_key_hex_roundtrip() {
        let pk = KeyPair::generate().public_key();
        let parsed = PublicKey::from_hex(&hex::encode(pk.as_bytes())).unwrap();
        assert_eq!(pk, parsed);
        assert!(PublicKey::from_hex("zz").is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let kp = KeyPair::generate();
        let rendered = format!("{:?}", kp);
        assert!(!rendered.contains(&hex::encode(kp.secret_bytes())));
    }
}
