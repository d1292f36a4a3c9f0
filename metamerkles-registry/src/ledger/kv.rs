//! Ledger persisted in the registry's key-value backend.

use std::sync::Arc;

use metamerkles_core::PublisherId;
use metamerkles_storage::{KeyCodec, KvBackend, WriteBatch};

use super::{apply_transfer, Ledger, LedgerError};

/// Balances stored as 8-byte big-endian values under the balance namespace.
///
/// Both legs of a transfer are written in one batch.
pub struct KvLedger<B> {
    backend: Arc<B>,
    codec: KeyCodec,
}

impl<B: KvBackend> KvLedger<B> {
    /// Ledger over `backend`.
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            codec: KeyCodec::new(),
        }
    }
}

fn storage_err(e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Storage(e.to_string())
}

impl<B: KvBackend> Ledger for KvLedger<B> {
    fn balance(&self, account: &PublisherId) -> Result<u64, LedgerError> {
        let Some(raw) = self
            .backend
            .get(&self.codec.balance_key(account))
            .map_err(storage_err)?
        else {
            return Ok(0);
        };
        let bytes: [u8; 8] = raw
            .as_slice()
            .try_into()
            .map_err(|_| storage_err(format!("corrupt balance for {}", account)))?;
        Ok(u64::from_be_bytes(bytes))
    }

    fn transfer(&mut self, from: &PublisherId, to: &PublisherId, amount: u64) -> Result<(), LedgerError> {
        let (debited, credited) =
            apply_transfer(from, self.balance(from)?, to, self.balance(to)?, amount)?;
        let mut batch = WriteBatch::new();
        batch.put(self.codec.balance_key(from), debited.to_be_bytes().to_vec());
        batch.put(self.codec.balance_key(to), credited.to_be_bytes().to_vec());
        self.backend.write_batch(batch).map_err(storage_err)
    }

    fn mint(&mut self, account: &PublisherId, amount: u64) -> Result<(), LedgerError> {
        let balance = self
            .balance(account)?
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { account: *account })?;
        self.backend
            .put(&self.codec.balance_key(account), &balance.to_be_bytes())
            .map_err(storage_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::check_ledger;
    use metamerkles_storage::MemoryBackend;

    #[test]
    fn test_kv_ledger() {
        check_ledger(KvLedger::new(Arc::new(MemoryBackend::new())));
    }

    #[test]
    fn test_balances_survive_new_handle() {
        let backend = Arc::new(MemoryBackend::new());
        let id = PublisherId([8; 32]);
        KvLedger::new(Arc::clone(&backend)).mint(&id, 500).unwrap();
        assert_eq!(KvLedger::new(backend).balance(&id).unwrap(), 500);
    }

    #[test]
    fn test_corrupt_balance_is_an_error() {
        let backend = Arc::new(MemoryBackend::new());
        let id = PublisherId([8; 32]);
        backend
            .put(&KeyCodec::new().balance_key(&id), b"bad")
            .unwrap();
        assert!(matches!(
            KvLedger::new(backend).balance(&id),
            Err(LedgerError::Storage(_))
        ));
    }
}
