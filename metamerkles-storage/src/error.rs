//! Storage error types.

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// RocksDB error.
    #[error("RocksDB error: {0}")]
    RocksDb(String),

    /// Create on a key that already holds a value.
    #[error("key already exists: {0}")]
    AlreadyExists(String),

    /// Read, update or delete on an absent key.
    #[error("key not found: {0}")]
    NotFound(String),

    /// Value longer than the substrate's per-entry limit.
    #[error("value of {len} bytes exceeds limit of {max}")]
    ValueTooLarge {
        /// Offered length.
        len: usize,
        /// Per-entry limit.
        max: usize,
    },

    /// Invalid key format or codec parameter.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A lock guarding an in-memory backend was poisoned.
    #[error("storage lock poisoned")]
    LockPoisoned,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for StorageError {
    fn from(e: rocksdb::Error) -> Self {
        StorageError::RocksDb(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for StorageError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        StorageError::LockPoisoned
    }
}
