//! Ed25519 signature creation and verification.

use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Serialize};

use super::keys::{PublicKey, SecretKey};
use crate::error::CryptoError;

/// Ed25519 signature, serialized as its raw 64 bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Signature(ed25519_dalek::Signature);

impl Signature {
    /// Create a Signature from raw bytes.
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Signature(ed25519_dalek::Signature::from_bytes(bytes))
    }

    /// Get the raw bytes of the signature.
    #[inline]
    pub fn to_bytes(&self) -> [u8; 64] {
        self.0.to_bytes()
    }
}

impl TryFrom<Vec<u8>> for Signature {
    type Error = CryptoError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        let raw: [u8; 64] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignature)?;
        Ok(Signature::from_bytes(&raw))
    }
}

impl From<Signature> for Vec<u8> {
    fn from(sig: Signature) -> Self {
        sig.to_bytes().to_vec()
    }
}

/// Sign a message with a secret key.
pub fn sign(secret_key: &SecretKey, message: &[u8]) -> Signature {
    Signature(secret_key.sign(message))
}

/// Verify a signature against a message and public key.
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
    public_key
        .inner()
        .verify(message, &signature.0)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}
