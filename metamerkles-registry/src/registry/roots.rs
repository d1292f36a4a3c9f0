//! Publishing and withdrawing roots.

use metamerkles_core::types::encode_tag;
use metamerkles_core::{Hash, Payment, PublisherId, RootTags};
use metamerkles_storage::{BoxBatch, KvBackend, StorageError};

use super::{settle, short, Registry, TAG_LEN};
use crate::cost::StorageCostModel;
use crate::error::RegistryResult;
use crate::ledger::Ledger;

/// Stage deletion of `key` if present and return the refund it is owed.
fn stage_refund<B: KvBackend>(
    batch: &mut BoxBatch<'_, B>,
    fees: &StorageCostModel,
    key: Vec<u8>,
) -> RegistryResult<Option<u64>> {
    // The namespace byte is not part of the priced key.
    let logical_len = key.len().saturating_sub(1);
    match batch.stage_delete(key) {
        Ok(value_len) => Ok(Some(fees.cost(logical_len, value_len)?)),
        Err(StorageError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl<B: KvBackend, L: Ledger> Registry<B, L> {
    /// Exact funding `add_root` requires: the root entry plus every reserved
    /// tag entry of the configured scheme.
    pub fn add_root_cost(&self) -> RegistryResult<u64> {
        let root_len = 2 * metamerkles_storage::ID_LEN;
        let tags_len = 2 * self.codec.prefix_len();
        let mut fees = vec![self.fees().cost(root_len, 0)?];
        for key in self.policy.reserved_keys() {
            fees.push(self.fees().cost(tags_len + key.len(), TAG_LEN)?);
        }
        StorageCostModel::total(fees)
    }

    /// Publish `root` for `publisher` and record its type tags.
    ///
    /// # Validation
    /// - Tags must belong to the configured scheme and not be unspecified
    /// - Neither the root entry nor any reserved tag entry may exist
    /// - `payment` must be exactly [`add_root_cost`](Self::add_root_cost),
    ///   from the publisher to escrow
    pub fn add_root(
        &mut self,
        publisher: &PublisherId,
        root: Hash,
        tags: RootTags,
        payment: Payment,
    ) -> RegistryResult<()> {
        self.add_root_sequenced(publisher, root, tags, payment, None)
    }

    pub(crate) fn add_root_sequenced(
        &mut self,
        publisher: &PublisherId,
        root: Hash,
        tags: RootTags,
        payment: Payment,
        sequence: Option<u64>,
    ) -> RegistryResult<()> {
        let seeds = self.policy.seed(&tags)?;

        let root_key = self.codec.root_key(publisher, &root);
        let mut batch = self.boxes.batch();
        self.stage_sequence(&mut batch, publisher, sequence)?;
        batch.stage_create(root_key.to_bytes(), Vec::new())?;
        let mut fees = vec![self.fees().cost(root_key.logical_len(), 0)?];

        for (name, value) in seeds {
            let key = self.data_key(publisher, &root, name);
            fees.push(self.fees().cost(key.logical_len(), TAG_LEN)?);
            batch.stage_create(key.to_bytes(), encode_tag(value).to_vec())?;
        }

        let required = StorageCostModel::total(fees)?;
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
            ?tags,
            cost = required,
            "root added"
        );
        Ok(())
    }

    /// Withdraw `root` and refund its funding to the publisher.
    ///
    /// The reserved tag entries go with the root. Other metadata stays
    /// readable unless the registry cascades metadata deletes.
    ///
    /// # Validation
    /// - Caller must be the publisher
    /// - Root must exist
    pub fn delete_root(
        &mut self,
        caller: &PublisherId,
        publisher: &PublisherId,
        root: Hash,
    ) -> RegistryResult<()> {
        self.delete_root_sequenced(caller, publisher, root, None)
    }

    pub(crate) fn delete_root_sequenced(
        &mut self,
        caller: &PublisherId,
        publisher: &PublisherId,
        root: Hash,
        sequence: Option<u64>,
    ) -> RegistryResult<()> {
        Self::authorize(caller, publisher)?;

        let fees = self.config.fees;
        let mut batch = self.boxes.batch();
        self.stage_sequence(&mut batch, publisher, sequence)?;
        let root_key = self.codec.root_key(publisher, &root);
        batch.stage_delete(root_key.to_bytes())?;
        let mut refunds = vec![fees.cost(root_key.logical_len(), 0)?];

        for name in self.policy.reserved_keys() {
            let key = self.data_key(publisher, &root, name).to_bytes();
            refunds.extend(stage_refund(&mut batch, &fees, key)?);
        }

        let mut cascaded = 0usize;
        if self.config.cascade_metadata {
            for (key, _) in self.boxes.scan(&self.codec.data_namespace(publisher, &root))? {
                // Reserved entries are already staged and come back as None.
                if let Some(refund) = stage_refund(&mut batch, &fees, key)? {
                    cascaded += 1;
                    refunds.push(refund);
                }
            }
        }

        let refund = StorageCostModel::total(refunds)?;
        let escrow = self.config.escrow;
        settle(&mut self.ledger, batch, &escrow, publisher, refund)?;
        tracing::debug!(
            publisher = %publisher,
            root = %short(&root),
            refund,
            cascaded,
            "root deleted"
        );
        Ok(())
    }
}
