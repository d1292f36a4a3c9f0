//! RocksDB key-value backend.

use std::path::Path;

use rocksdb::{Direction, IteratorMode, Options, DB};

use super::{BatchOp, Entry, KvBackend, WriteBatch};
use crate::error::StorageError;

/// RocksDB-based key-value backend.
///
/// Registry entries are small (a 2 KiB value at most), so the database is
/// opened with modest buffers and LZ4 compression.
pub struct RocksBackend {
    db: DB,
}

impl RocksBackend {
    /// Open or create a RocksDB database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts.set_write_buffer_size(8 * 1024 * 1024);
        opts.set_max_write_buffer_number(2);

        let db = DB::open(&opts, path)?;
        tracing::debug!("opened rocksdb at {:?}", db.path());
        Ok(Self { db })
    }
}

impl KvBackend for RocksBackend {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.db.get(key)?)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.db.put(key, value)?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        self.db.delete(key)?;
        Ok(())
    }

    fn write_batch(&self, batch: WriteBatch) -> Result<(), StorageError> {
        let mut rocks_batch = rocksdb::WriteBatch::default();
        for op in batch.operations {
            match op {
                BatchOp::Put { key, value } => rocks_batch.put(&key, &value),
                BatchOp::Delete { key } => rocks_batch.delete(&key),
            }
        }
        self.db.write(rocks_batch)?;
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<Entry>, StorageError> {
        let mut entries = Vec::new();
        for item in self.db.iterator(IteratorMode::From(prefix, Direction::Forward)) {
            let (k, v) = item?;
            if !k.starts_with(prefix) {
                break;
            }
            entries.push((k.to_vec(), v.to_vec()));
        }
        Ok(entries)
    }

    fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::tests::{check_backend_basic, check_backend_batch, check_backend_scan};
    use tempfile::TempDir;

    fn create_temp_backend() -> (RocksBackend, TempDir) {
        let dir = TempDir::new().unwrap();
        let backend = RocksBackend::open(dir.path()).unwrap();
        (backend, dir)
    }

    #[test]
    fn test_basic_operations() {
        let (backend, _dir) = create_temp_backend();
        check_backend_basic(backend);
    }

    #[test]
    fn test_write_batch() {
        let (backend, _dir) = create_temp_backend();
        check_backend_batch(backend);
    }

    #[test]
    fn test_scan_prefix() {
        let (backend, _dir) = create_temp_backend();
        check_backend_scan(backend);
    }

    #[test]
    fn test_persistence() {
        let dir = TempDir::new().unwrap();

        {
            let backend = RocksBackend::open(dir.path()).unwrap();
            backend.put(b"persistent", b"data").unwrap();
            backend.flush().unwrap();
        }

        {
            let backend = RocksBackend::open(dir.path()).unwrap();
            assert_eq!(backend.get(b"persistent").unwrap(), Some(b"data".to_vec()));
        }
    }
}
