//! Error types for the MetaMerkles core crate.

use thiserror::Error;

/// Top-level error type for metamerkles-core operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Cryptographic operation failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] SerializationError),
    /// Inclusion proof rejected.
    #[error("proof error: {0}")]
    Proof(#[from] ProofError),
    /// A tag value could not be interpreted.
    #[error("tag error: {0}")]
    Tag(#[from] TagError),
}

/// Errors related to cryptographic operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// The signature is malformed.
    #[error("invalid signature format")]
    InvalidSignature,
    /// The public key is malformed or invalid.
    #[error("invalid public key format")]
    InvalidPublicKey,
    /// The secret key is malformed or invalid.
    #[error("invalid secret key format")]
    InvalidSecretKey,
    /// Signature verification failed (signature doesn't match message/key).
    #[error("signature verification failed")]
    SignatureVerificationFailed,
}

/// Errors related to serialization and deserialization.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SerializationError {
    /// Failed to encode data to bytes.
    #[error("encode failed: {0}")]
    EncodeFailed(String),
    /// Failed to decode data from bytes.
    #[error("decode failed: {0}")]
    DecodeFailed(String),
}

/// Reasons an inclusion proof is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProofError {
    /// Proof length is not a whole number of 32-byte siblings.
    #[error("proof length {len} is not a multiple of 32")]
    MalformedLength {
        /// Length of the supplied proof in bytes.
        len: usize,
    },
    /// Proof carries more siblings than any accepted tree depth.
    #[error("proof has {siblings} siblings, limit is {limit}")]
    TooLong {
        /// Number of siblings supplied.
        siblings: usize,
        /// Maximum accepted.
        limit: usize,
    },
    /// Recomputed root does not match the committed root.
    #[error("recomputed root does not match")]
    RootMismatch,
}

/// Errors decoding a stored or supplied tag.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TagError {
    /// Stored tag value was not exactly 8 bytes.
    #[error("tag value must be 8 bytes, got {len}")]
    BadLength {
        /// Observed length.
        len: usize,
    },
    /// Value outside the closed `RootType` set.
    #[error("unknown root type {0}")]
    UnknownRootType(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = CoreError::Crypto(CryptoError::InvalidPublicKey);
        assert!(e.to_string().contains("invalid public key"));

        let e = CoreError::Serialization(SerializationError::EncodeFailed("test".into()));
        assert!(e.to_string().contains("encode failed"));

        let e = CoreError::Proof(ProofError::MalformedLength { len: 33 });
        assert!(e.to_string().contains("not a multiple of 32"));
    }

    #[test]
    fn test_error_conversion() {
        let proof_err = ProofError::RootMismatch;
        let core_err: CoreError = proof_err.into();
        assert!(matches!(core_err, CoreError::Proof(ProofError::RootMismatch)));

        let tag_err: CoreError = TagError::UnknownRootType(9).into();
        assert!(tag_err.to_string().contains("unknown root type 9"));
    }
}
