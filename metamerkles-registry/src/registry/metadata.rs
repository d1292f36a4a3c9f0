//! Metadata records attached to published roots.

use metamerkles_core::{Hash, Payment, PublisherId};
use metamerkles_storage::{KvBackend, StorageKey};

use super::{settle, short, Registry};
use crate::error::{RegistryError, RegistryResult};
use crate::ledger::Ledger;

impl<B: KvBackend, L: Ledger> Registry<B, L> {
    fn check_key(&self, key: &str) -> RegistryResult<()> {
        if key.len() > self.config.max_key_len {
            return Err(RegistryError::SizeLimitExceeded {
                field: "key",
                len: key.len(),
                limit: self.config.max_key_len,
            });
        }
        if self.policy.is_reserved(key) {
            return Err(RegistryError::ReservedKey {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    /// Exact funding `add_data` requires for `key` and a value of
    /// `value_len` bytes.
    pub fn add_data_cost(&self, key: &str, value_len: usize) -> RegistryResult<u64> {
        let key_len = 2 * self.codec.prefix_len() + key.len();
        self.fees().cost(key_len, value_len)
    }

    /// Attach `key` → `value` to a published root.
    ///
    /// # Validation
    /// - Key at most 32 bytes, value at most 2048 bytes
    /// - Key is not a reserved tag key
    /// - Root must exist
    /// - Key must not already be set
    /// - `payment` must be exactly [`add_data_cost`](Self::add_data_cost)
    pub fn add_data(
        &mut self,
        publisher: &PublisherId,
        root: Hash,
        key: &str,
        value: Vec<u8>,
        payment: Payment,
    ) -> RegistryResult<()> {
        self.add_data_sequenced(publisher, root, key, value, payment, None)
    }

    pub(crate) fn add_data_sequenced(
        &mut self,
        publisher: &PublisherId,
        root: Hash,
        key: &str,
        value: Vec<u8>,
        payment: Payment,
        sequence: Option<u64>,
    ) -> RegistryResult<()> {
        self.check_key(key)?;
        if value.len() > self.config.max_value_len {
            return Err(RegistryError::SizeLimitExceeded {
                field: "value",
                len: value.len(),
                limit: self.config.max_value_len,
            });
        }
        self.require_root(publisher, &root)?;

        let data_key = self.data_key(publisher, &root, key);
        let required = self.fees().cost(data_key.logical_len(), value.len())?;
        let value_len = value.len();

        let mut batch = self.boxes.batch();
        self.stage_sequence(&mut batch, publisher, sequence)?;
        batch.stage_create(data_key.to_bytes(), value)?;
        self.check_payment(publisher, &payment, required)?;

        settle(
            &mut self.ledger,
            batch,
            &payment.sender,
            &payment.receiver,
            required,
        )?;
        tracing::debug!(
            publisher = %publisher,
            root = %short(&root),
            key,
            value_len,
            cost = required,
            "data added"
        );
        Ok(())
    }

    /// Remove `key` from a root and refund what it cost.
    ///
    /// The refund is priced from the stored value's length. The root need
    /// not still exist.
    ///
    /// # Validation
    /// - Caller must be the publisher
    /// - Key is not a reserved tag key
    /// - Entry must exist
    pub fn delete_data(
        &mut self,
        caller: &PublisherId,
        publisher: &PublisherId,
        root: Hash,
        key: &str,
    ) -> RegistryResult<()> {
        self.delete_data_sequenced(caller, publisher, root, key, None)
    }

    pub(crate) fn delete_data_sequenced(
        &mut self,
        caller: &PublisherId,
        publisher: &PublisherId,
        root: Hash,
        key: &str,
        sequence: Option<u64>,
    ) -> RegistryResult<()> {
        Self::authorize(caller, publisher)?;
        self.check_key(key)?;

        let data_key = self.data_key(publisher, &root, key);
        let mut batch = self.boxes.batch();
        self.stage_sequence(&mut batch, publisher, sequence)?;
        let value_len = batch.stage_delete(data_key.to_bytes())?;
        let refund = self.fees().cost(data_key.logical_len(), value_len)?;

        let escrow = self.config.escrow;
        settle(&mut self.ledger, batch, &escrow, publisher, refund)?;
        tracing::debug!(
            publisher = %publisher,
            root = %short(&root),
            key,
            refund,
            "data deleted"
        );
        Ok(())
    }

    /// Value stored under `key` for (publisher, root).
    ///
    /// Metadata is world-readable; no proof is required here.
    pub fn read(&self, publisher: &PublisherId, root: &Hash, key: &str) -> RegistryResult<Vec<u8>> {
        let data_key = self.data_key(publisher, root, key);
        Ok(self.boxes.read(&data_key.to_bytes())?)
    }

    /// Every metadata record addressed by (publisher, root), reserved tags
    /// included, in key order.
    ///
    /// Because keys carry truncated ids, records of another publisher or
    /// root sharing both prefixes are listed too.
    pub fn list_data(&self, publisher: &PublisherId, root: &Hash) -> RegistryResult<Vec<(String, Vec<u8>)>> {
        let entries = self.boxes.scan(&self.codec.data_namespace(publisher, root))?;
        Ok(entries
            .into_iter()
            .filter_map(|(key, value)| match self.codec.decode(&key) {
                Some(StorageKey::Data(data_key)) => {
                    data_key.key_str().map(|key| (key.to_string(), value))
                }
                _ => None,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use crate::error::RegistryError;
    use crate::ledger::Ledger;
    use crate::policy::{LIST_SCHEMA_KEY, LIST_TYPE_KEY};

    const ROOT: [u8; 32] = [0x24; 32];

    #[test]
    fn test_put_then_read_returns_value() {
        let (mut registry, kp) = registry();
        let id = kp.id();
        publish(&mut registry, &id, ROOT, listed(1, 1));

        for (i, len) in [0usize, 1, 31, 1024, 2048].into_iter().enumerate() {
            let key = format!("k{i}");
            let value: Vec<u8> = (0..len).map(|b| b as u8).collect();
            attach(&mut registry, &id, ROOT, &key, &value);
            assert_eq!(registry.read(&id, &ROOT, &key).unwrap(), value);
        }
    }

    #[test]
    fn test_cost_before_put_equals_refund_after_delete() {
        let (mut registry, kp) = registry();
        let id = kp.id();
        publish(&mut registry, &id, ROOT, listed(1, 1));

        let value = vec![9u8; 777];
        let cost = registry.add_data_cost("creator", value.len()).unwrap();
        let before = registry.ledger().balance(&id).unwrap();
        attach(&mut registry, &id, ROOT, "creator", &value);
        assert_eq!(registry.ledger().balance(&id).unwrap(), before - cost);

        registry.delete_data(&id, &id, ROOT, "creator").unwrap();
        assert_eq!(registry.ledger().balance(&id).unwrap(), before);
    }

    #[test]
    fn test_size_limits() {
        let (mut registry, kp) = registry();
        let id = kp.id();
        publish(&mut registry, &id, ROOT, listed(1, 1));

        let long_key = "k".repeat(33);
        assert_eq!(
            registry.add_data(&id, ROOT, &long_key, vec![], pay(&id, 0)),
            Err(RegistryError::SizeLimitExceeded {
                field: "key",
                len: 33,
                limit: 32
            })
        );
        assert_eq!(
            registry.add_data(&id, ROOT, "big", vec![0; 2049], pay(&id, 0)),
            Err(RegistryError::SizeLimitExceeded {
                field: "value",
                len: 2049,
                limit: 2048
            })
        );

        attach(&mut registry, &id, ROOT, &"k".repeat(32), &[]);
    }

    #[test]
    fn test_put_requires_root() {
        let (mut registry, kp) = registry();
        let id = kp.id();
        let cost = registry.add_data_cost("royalty", 1).unwrap();
        assert!(matches!(
            registry.add_data(&id, ROOT, "royalty", b"5".to_vec(), pay(&id, cost)),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_repeated_put_fails() {
        let (mut registry, kp) = registry();
        let id = kp.id();
        publish(&mut registry, &id, ROOT, listed(1, 1));
        attach(&mut registry, &id, ROOT, "royalty", b"5");

        let cost = registry.add_data_cost("royalty", 1).unwrap();
        assert!(matches!(
            registry.add_data(&id, ROOT, "royalty", b"6".to_vec(), pay(&id, cost)),
            Err(RegistryError::AlreadyExists { .. })
        ));
        assert_eq!(registry.read(&id, &ROOT, "royalty").unwrap(), b"5");
    }

    #[test]
    fn test_put_funding_must_be_exact() {
        let (mut registry, kp) = registry();
        let id = kp.id();
        publish(&mut registry, &id, ROOT, listed(1, 1));
        let cost = registry.add_data_cost("royalty", 1).unwrap();

        assert!(matches!(
            registry.add_data(&id, ROOT, "royalty", b"5".to_vec(), pay(&id, cost - 1)),
            Err(RegistryError::InsufficientFunding { .. })
        ));
        assert!(matches!(
            registry.add_data(&id, ROOT, "royalty", b"5".to_vec(), pay(&id, cost + 1)),
            Err(RegistryError::FundingMismatch { .. })
        ));
        assert!(matches!(
            registry.read(&id, &ROOT, "royalty"),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_reserved_keys_are_not_writable() {
        let (mut registry, kp) = registry();
        let id = kp.id();
        publish(&mut registry, &id, ROOT, listed(1, 1));

        for key in [LIST_SCHEMA_KEY, LIST_TYPE_KEY] {
            assert_eq!(
                registry.add_data(&id, ROOT, key, vec![0; 8], pay(&id, 0)),
                Err(RegistryError::ReservedKey { key: key.into() })
            );
            assert_eq!(
                registry.delete_data(&id, &id, ROOT, key),
                Err(RegistryError::ReservedKey { key: key.into() })
            );
        }
    }

    #[test]
    fn test_delete_data_rules() {
        let (mut registry, kp) = registry();
        let id = kp.id();
        publish(&mut registry, &id, ROOT, listed(1, 1));
        attach(&mut registry, &id, ROOT, "royalty", b"5");

        let other = metamerkles_core::KeyPair::generate().id();
        assert!(matches!(
            registry.delete_data(&other, &id, ROOT, "royalty"),
            Err(RegistryError::Unauthorized { .. })
        ));
        registry.delete_data(&id, &id, ROOT, "royalty").unwrap();
        assert!(matches!(
            registry.delete_data(&id, &id, ROOT, "royalty"),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_dangling_metadata_can_be_reclaimed() {
        let (mut registry, kp) = registry();
        let id = kp.id();
        publish(&mut registry, &id, ROOT, listed(1, 1));
        attach(&mut registry, &id, ROOT, "royalty", b"5");
        registry.delete_root(&id, &id, ROOT).unwrap();

        registry.delete_data(&id, &id, ROOT, "royalty").unwrap();
        assert_eq!(registry.ledger().balance(&id).unwrap(), FUNDS);
    }

    #[test]
    fn test_list_data() {
        let (mut registry, kp) = registry();
        let id = kp.id();
        publish(&mut registry, &id, ROOT, listed(2, 3));
        attach(&mut registry, &id, ROOT, "royalty", b"5");

        let keys: Vec<String> = registry
            .list_data(&id, &ROOT)
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["list.schema", "list.type", "royalty"]);
    }
}
