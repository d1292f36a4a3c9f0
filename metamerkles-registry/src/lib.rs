//! Registry of published Merkle roots for MetaMerkles.
//!
//! Publishers commit to a dataset by publishing its Merkle root, pay for
//! the storage it occupies, and attach bounded key/value metadata to it.
//! Verifiers check membership of an item with a proof and read metadata
//! only once the proof passes and the root's recorded type matches what
//! they expect.
//!
//! # Key Components
//!
//! - [`Registry`]: roots, metadata, and proof-gated reads over a storage
//!   backend and a [`Ledger`]
//! - [`StorageCostModel`]: the storage fee schedule
//! - [`TypePolicy`]: the reserved type tag scheme, [`ListTagPolicy`] or
//!   [`RootTypePolicy`]
//! - [`apply_operation`]: entry point for signed publisher operations
//! - [`RegistryError`]: error type for every failed operation
//!
//! # Example
//!
//! ```ignore
//! use metamerkles_registry::{apply_operation, MemoryLedger, Registry, RegistryConfig};
//! use metamerkles_storage::MemoryBackend;
//!
//! let mut registry = Registry::new(Arc::new(MemoryBackend::new()), MemoryLedger::new(), RegistryConfig::default())?;
//! apply_operation(&mut registry, &signed_op)?;
//! let royalty = registry.verified_read(&publisher, &root, &proof, leaf, "royalty", &TypeConstraint::listed(1, 1))?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod cost;
mod error;
mod executor;
mod ledger;
mod policy;
mod registry;

pub use config::{RegistryConfig, TagScheme, DEFAULT_MAX_KEY_LEN, DEFAULT_MAX_VALUE_LEN};
pub use cost::{StorageCostModel, DEFAULT_BASE_FEE, DEFAULT_PER_BYTE_FEE};
pub use error::{RegistryError, RegistryResult};
pub use executor::apply_operation;
pub use ledger::{KvLedger, Ledger, LedgerError, MemoryLedger};
pub use policy::{
    policy_for, ListTagPolicy, RootTypePolicy, TagSource, TypePolicy, LIST_SCHEMA_KEY,
    LIST_TYPE_KEY, ROOT_TYPE_KEY,
};
pub use registry::Registry;
