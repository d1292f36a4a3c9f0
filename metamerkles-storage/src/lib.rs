//! # MetaMerkles Storage
//!
//! Storage substrate for the MetaMerkles registry.
//!
//! This crate provides:
//! - The key codec mapping (publisher, root, metadata key) to storage keys
//! - A key-value backend trait with in-memory and RocksDB implementations
//! - Box semantics on top: explicit create, read, update and delete of
//!   length-bounded values, plus atomic batches of box changes
//!
//! ## Architecture
//!
//! Root entries, metadata entries and ledger balances share one backend and
//! are told apart by a one-byte key namespace. The registry never writes the
//! backend directly; it stages box changes and commits them as one batch.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod boxes;
pub mod error;
pub mod keys;
pub mod kv;

pub use boxes::{BoxBatch, BoxStore, MAX_BOX_VALUE_LEN};
pub use error::StorageError;
pub use keys::{DataKey, KeyCodec, KeyPrefix, RootKey, StorageKey, DEFAULT_PREFIX_LEN, ID_LEN};
pub use kv::{BatchOp, Entry, KvBackend, MemoryBackend, RocksBackend, WriteBatch};
