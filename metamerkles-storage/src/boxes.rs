//! Box-store semantics over a raw key-value backend.
//!
//! A box is a bounded value under a key that must be explicitly created
//! before it can be read, and explicitly deleted. Unlike a plain `put`,
//! creating over an existing box fails, which is what the registry's
//! create-if-absent rules are built on.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::StorageError;
use crate::kv::{Entry, KvBackend, WriteBatch};

/// Per-box value size limit of the substrate.
pub const MAX_BOX_VALUE_LEN: usize = 2048;

fn show(key: &[u8]) -> String {
    hex::encode(&key[..key.len().min(12)])
}

/// Create/read/update/delete of bounded boxes.
pub struct BoxStore<B> {
    backend: Arc<B>,
    max_value_len: usize,
}

impl<B> Clone for BoxStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            max_value_len: self.max_value_len,
        }
    }
}

impl<B: KvBackend> BoxStore<B> {
    /// Wrap a backend with the default value limit.
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_max_value_len(backend, MAX_BOX_VALUE_LEN)
    }

    /// Wrap a backend with a custom value limit.
    pub fn with_max_value_len(backend: Arc<B>, max_value_len: usize) -> Self {
        Self {
            backend,
            max_value_len,
        }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Per-box value limit.
    pub fn max_value_len(&self) -> usize {
        self.max_value_len
    }

    fn check_len(&self, value: &[u8]) -> Result<(), StorageError> {
        if value.len() > self.max_value_len {
            return Err(StorageError::ValueTooLarge {
                len: value.len(),
                max: self.max_value_len,
            });
        }
        Ok(())
    }

    /// Whether a box exists.
    pub fn exists(&self, key: &[u8]) -> Result<bool, StorageError> {
        self.backend.exists(key)
    }

    /// Create a box. Fails if it already exists.
    pub fn create(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.check_len(value)?;
        if self.backend.exists(key)? {
            return Err(StorageError::AlreadyExists(show(key)));
        }
        self.backend.put(key, value)
    }

    /// Read a box. Fails if it does not exist.
    pub fn read(&self, key: &[u8]) -> Result<Vec<u8>, StorageError> {
        self.backend
            .get(key)?
            .ok_or_else(|| StorageError::NotFound(show(key)))
    }

    /// Replace the contents of an existing box.
    pub fn update(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.check_len(value)?;
        if !self.backend.exists(key)? {
            return Err(StorageError::NotFound(show(key)));
        }
        self.backend.put(key, value)
    }

    /// Delete a box, returning the length of the value it held.
    pub fn delete(&self, key: &[u8]) -> Result<usize, StorageError> {
        let len = self.read(key)?.len();
        self.backend.delete(key)?;
        Ok(len)
    }

    /// All boxes under a key prefix.
    pub fn scan(&self, prefix: &[u8]) -> Result<Vec<Entry>, StorageError> {
        self.backend.scan_prefix(prefix)
    }

    /// Start a batch of box changes that commit together.
    pub fn batch(&self) -> BoxBatch<'_, B> {
        BoxBatch {
            store: self,
            staged: HashMap::new(),
            batch: WriteBatch::new(),
        }
    }
}

/// Box writes and deletes staged against a [`BoxStore`].
///
/// Each staged change is checked against the store and against earlier
/// changes in the same batch, so a batch that stages successfully commits
/// as one atomic write.
pub struct BoxBatch<'a, B> {
    store: &'a BoxStore<B>,
    // key -> staged value length, `None` for a staged delete
    staged: HashMap<Vec<u8>, Option<usize>>,
    batch: WriteBatch,
}

impl<B: KvBackend> BoxBatch<'_, B> {
    fn current_len(&self, key: &[u8]) -> Result<Option<usize>, StorageError> {
        match self.staged.get(key) {
            Some(staged) => Ok(*staged),
            None => Ok(self.store.backend.get(key)?.map(|v| v.len())),
        }
    }

    /// Stage creation of a box.
    pub fn stage_create(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StorageError> {
        self.store.check_len(&value)?;
        if self.current_len(&key)?.is_some() {
            return Err(StorageError::AlreadyExists(show(&key)));
        }
        self.staged.insert(key.clone(), Some(value.len()));
        self.batch.put(key, value);
        Ok(())
    }

    /// Stage a write that creates the box or replaces its contents.
    pub fn stage_put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StorageError> {
        self.store.check_len(&value)?;
        self.staged.insert(key.clone(), Some(value.len()));
        self.batch.put(key, value);
        Ok(())
    }

    /// Stage deletion of a box, returning the length of the value it held.
    pub fn stage_delete(&mut self, key: Vec<u8>) -> Result<usize, StorageError> {
        let len = self
            .current_len(&key)?
            .ok_or_else(|| StorageError::NotFound(show(&key)))?;
        self.staged.insert(key.clone(), None);
        self.batch.delete(key);
        Ok(len)
    }

    /// Number of staged changes.
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Apply every staged change atomically.
    pub fn commit(self) -> Result<(), StorageError> {
        if self.batch.is_empty() {
            return Ok(());
        }
        self.store.backend.write_batch(self.batch)
    }
}
