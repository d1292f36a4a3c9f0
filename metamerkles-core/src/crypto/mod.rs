//! Cryptographic primitives for the MetaMerkles registry.
//!
//! This module provides:
//! - SHA-256 hashing, including the sorted-pair node combiner
//! - Ed25519 key pair generation, signing, and verification
//! - Password-encrypted key files

mod hashing;
pub mod keyfile;
mod keys;
mod signing;

pub use keyfile::{decrypt_key, encrypt_key, KeyFileError};
pub use hashing::{hash_sorted_pair, sha256, sha256_concat};
pub use keys::{KeyPair, PublicKey, SecretKey};
pub use signing::{sign, verify, Signature};
