//! Key-value storage backends.
//!
//! This module provides an abstraction over the host's key-value substrate
//! with two implementations:
//! - `MemoryBackend`: In-memory BTreeMap-based storage for tests and tooling
//! - `RocksBackend`: RocksDB-based persistent storage for the CLI

mod memory_backend;
mod rocks_backend;

pub use memory_backend::MemoryBackend;
pub use rocks_backend::RocksBackend;

use crate::error::StorageError;

/// A key/value pair returned by a prefix scan.
pub type Entry = (Vec<u8>, Vec<u8>);

/// Trait for key-value storage backends.
///
/// Implementations must apply a [`WriteBatch`] atomically: either every
/// operation in it becomes visible or none does.
pub trait KvBackend: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    /// Put a key-value pair, replacing any previous value.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. Deleting an absent key is not an error at this layer.
    fn delete(&self, key: &[u8]) -> Result<(), StorageError>;

    /// Check if a key exists.
    fn exists(&self, key: &[u8]) -> Result<bool, StorageError> {
        Ok(self.get(key)?.is_some())
    }

    /// Apply a batch of writes atomically.
    fn write_batch(&self, batch: WriteBatch) -> Result<(), StorageError>;

    /// All entries whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<Entry>, StorageError>;

    /// Flush any buffered data to disk (if applicable).
    fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// A batch of write operations to be applied atomically.
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    /// Operations in the batch, applied in order.
    pub operations: Vec<BatchOp>,
}

/// A single operation in a write batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    /// Put a key-value pair.
    Put {
        /// The key to write.
        key: Vec<u8>,
        /// The value to write.
        value: Vec<u8>,
    },
    /// Delete a key.
    Delete {
        /// The key to delete.
        key: Vec<u8>,
    },
}

impl WriteBatch {
    /// Create a new empty write batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a put operation to the batch.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.operations.push(BatchOp::Put { key, value });
    }

    /// Add a delete operation to the batch.
    pub fn delete(&mut self, key: Vec<u8>) {
        self.operations.push(BatchOp::Delete { key });
    }

    /// Check if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Get the number of operations in the batch.
    pub fn len(&self) -> usize {
        self.operations.len()
    }
}
