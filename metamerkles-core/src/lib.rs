//! # MetaMerkles Core
//!
//! Core types, cryptography, and serialization for the MetaMerkles registry.
//!
//! This crate provides the foundation for the other MetaMerkles crates:
//! - Cryptographic primitives (Ed25519 signatures, SHA-256 hashing)
//! - Sorted-pair Merkle inclusion-proof verification
//! - Tag types describing what a published root commits to
//! - Signed registry operations
//! - Deterministic binary serialization

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crypto;
pub mod error;
pub mod merkle;
pub mod operation;
pub mod serialization;
pub mod types;

// Re-export commonly used types at crate root
pub use crypto::{KeyPair, PublicKey, SecretKey, Signature};
pub use error::{CoreError, CryptoError, ProofError, SerializationError, TagError};
pub use operation::{Operation, SignedOperation};
pub use types::{
    Hash, ListType, Payment, PublisherId, RootTags, RootType, SchemaType, TypeConstraint,
};
