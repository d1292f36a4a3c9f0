//! The registry: published roots, their metadata, and proof-gated reads.
//!
//! Every mutation follows the same shape. All preconditions are checked and
//! the storage changes are staged in one [`BoxBatch`]; then the funds move,
//! and the batch commits. If the commit fails the transfer is reversed, so
//! an operation either fully happens or leaves no trace.

mod access;
mod metadata;
mod roots;

use std::sync::Arc;

use metamerkles_core::{Hash, Payment, PublisherId};
use metamerkles_storage::{BoxBatch, BoxStore, DataKey, KeyCodec, KvBackend};

use crate::config::{RegistryConfig, StoredSettings};
use crate::cost::StorageCostModel;
use crate::error::{RegistryError, RegistryResult};
use crate::ledger::Ledger;
use crate::policy::{policy_for, TypePolicy};

/// Byte length of a stored tag.
pub(crate) const TAG_LEN: usize = 8;

/// Root registry and metadata store over a key-value backend and a ledger.
///
/// Mutations take `&mut self`; reads take `&self` and may run concurrently
/// behind a lock.
pub struct Registry<B, L> {
    config: RegistryConfig,
    codec: KeyCodec,
    boxes: BoxStore<B>,
    ledger: L,
    policy: Box<dyn TypePolicy>,
}

impl<B: KvBackend, L: Ledger> Registry<B, L> {
    /// Open a registry over `backend`, paying into and refunding from
    /// `ledger`.
    ///
    /// The first open records the scheme, prefix length, fees and escrow in
    /// the store. Later opens fail with
    /// [`SettingsMismatch`](RegistryError::SettingsMismatch) if any differ.
    pub fn new(backend: Arc<B>, ledger: L, config: RegistryConfig) -> RegistryResult<Self> {
        let codec = KeyCodec::with_prefix_len(config.prefix_len)?;
        let settings = StoredSettings::from_config(&config)?;
        let settings_key = codec.settings_key();
        match backend.get(&settings_key)? {
            Some(bytes) => settings.check(&StoredSettings::from_bytes(&bytes)?)?,
            None => backend.put(&settings_key, &settings.to_bytes())?,
        }

        let boxes = BoxStore::with_max_value_len(backend, config.max_value_len);
        let policy = policy_for(config.scheme);
        tracing::debug!(
            scheme = ?config.scheme,
            prefix_len = config.prefix_len,
            cascade = config.cascade_metadata,
            "registry opened"
        );
        Ok(Self {
            config,
            codec,
            boxes,
            ledger,
            policy,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Key codec in use.
    pub fn codec(&self) -> &KeyCodec {
        &self.codec
    }

    /// Funds ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Funds ledger, mutably. Used to fund accounts.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// Registry escrow account.
    pub fn escrow(&self) -> PublisherId {
        self.config.escrow
    }

    fn fees(&self) -> &StorageCostModel {
        &self.config.fees
    }

    fn data_key(&self, publisher: &PublisherId, root: &Hash, key: &str) -> DataKey {
        self.codec.derive_metadata_key(publisher, root, key)
    }

    /// Whether (publisher, root) is published.
    pub fn root_exists(&self, publisher: &PublisherId, root: &Hash) -> RegistryResult<bool> {
        let key = self.codec.root_key(publisher, root).to_bytes();
        Ok(self.boxes.exists(&key)?)
    }

    fn require_root(&self, publisher: &PublisherId, root: &Hash) -> RegistryResult<()> {
        if !self.root_exists(publisher, root)? {
            return Err(RegistryError::not_found(format!(
                "root {} of {}",
                short(root),
                publisher
            )));
        }
        Ok(())
    }

    /// Sequence number the next signed operation of `publisher` must carry.
    pub fn next_sequence(&self, publisher: &PublisherId) -> RegistryResult<u64> {
        let key = self.codec.sequence_key(publisher);
        match self.boxes.backend().get(&key)? {
            None => Ok(0),
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    RegistryError::Storage(format!("malformed sequence for {}", publisher))
                })?;
                Ok(u64::from_be_bytes(raw))
            }
        }
    }

    /// Stage the advance of `publisher`'s sequence past `sequence`, if the
    /// mutation was signed.
    fn stage_sequence(
        &self,
        batch: &mut BoxBatch<'_, B>,
        publisher: &PublisherId,
        sequence: Option<u64>,
    ) -> RegistryResult<()> {
        let Some(sequence) = sequence else {
            return Ok(());
        };
        let expected = self.next_sequence(publisher)?;
        if sequence != expected {
            return Err(RegistryError::SequenceMismatch {
                expected,
                got: sequence,
            });
        }
        let next = sequence
            .checked_add(1)
            .ok_or(RegistryError::ArithmeticOverflow)?;
        batch.stage_put(self.codec.sequence_key(publisher), next.to_be_bytes().to_vec())?;
        Ok(())
    }

    fn authorize(caller: &PublisherId, publisher: &PublisherId) -> RegistryResult<()> {
        if caller != publisher {
            return Err(RegistryError::Unauthorized {
                publisher: *publisher,
                caller: *caller,
            });
        }
        Ok(())
    }

    /// Check that `payment` is exactly `required` from `publisher` to escrow.
    fn check_payment(
        &self,
        publisher: &PublisherId,
        payment: &Payment,
        required: u64,
    ) -> RegistryResult<()> {
        if payment.sender != *publisher {
            return Err(RegistryError::InvalidPayment {
                reason: "sender is not the publisher",
            });
        }
        if payment.receiver != self.config.escrow {
            return Err(RegistryError::InvalidPayment {
                reason: "receiver is not the registry escrow",
            });
        }
        if payment.amount < required {
            return Err(RegistryError::InsufficientFunding {
                provided: payment.amount,
                required,
            });
        }
        if payment.amount > required {
            return Err(RegistryError::FundingMismatch {
                provided: payment.amount,
                required,
            });
        }
        Ok(())
    }
}

/// Move `amount` from `from` to `to`, then commit `batch`. A failed commit
/// reverses the transfer.
fn settle<B: KvBackend, L: Ledger>(
    ledger: &mut L,
    batch: BoxBatch<'_, B>,
    from: &PublisherId,
    to: &PublisherId,
    amount: u64,
) -> RegistryResult<()> {
    ledger.transfer(from, to, amount)?;
    if let Err(e) = batch.commit() {
        if let Err(undo) = ledger.transfer(to, from, amount) {
            tracing::error!(error = %undo, amount, "could not reverse transfer after failed commit");
        }
        return Err(e.into());
    }
    Ok(())
}

/// First four bytes of a hash, for logs and messages.
pub(crate) fn short(hash: &Hash) -> String {
    hex::encode(&hash[..4])
}
