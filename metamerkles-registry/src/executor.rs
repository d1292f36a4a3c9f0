//! Signed operation executor - entry point for publisher mutations.
//!
//! This module contains `apply_operation`, which authenticates a signed
//! operation and dispatches it to the registry. The signer's key is the
//! acting publisher, so a publisher can only ever touch its own entries.

use metamerkles_core::SignedOperation;
use metamerkles_core::Operation;
use metamerkles_storage::KvBackend;

use crate::error::{RegistryError, RegistryResult};
use crate::ledger::Ledger;
use crate::registry::{short, Registry};

/// Apply a signed operation to the registry.
///
/// This:
/// 1. Verifies the signature over the operation and its sequence number
/// 2. Takes the signer as the acting publisher
/// 3. Dispatches to the matching registry operation, which also advances
///    the publisher's sequence in the same commit
///
/// # Returns
/// - `Ok(())` if the operation was applied
/// - `Err(RegistryError)` if authentication, sequencing, validation or
///   execution failed; the registry is unchanged in that case
pub fn apply_operation<B: KvBackend, L: Ledger>(
    registry: &mut Registry<B, L>,
    signed: &SignedOperation,
) -> RegistryResult<()> {
    if let Err(e) = signed.verify_signature() {
        tracing::warn!(kind = signed.op.kind(), error = %e, "rejected operation with bad signature");
        return Err(RegistryError::InvalidSignature);
    }

    let publisher = signed.publisher();
    let sequence = Some(signed.sequence);

    let result = match &signed.op {
        Operation::AddRoot {
            root,
            tags,
            payment,
        } => registry.add_root_sequenced(&publisher, *root, *tags, *payment, sequence),

        Operation::DeleteRoot { root } => {
            registry.delete_root_sequenced(&publisher, &publisher, *root, sequence)
        }

        Operation::AddData {
            root,
            key,
            value,
            payment,
        } => registry.add_data_sequenced(&publisher, *root, key, value.clone(), *payment, sequence),

        Operation::DeleteData { root, key } => {
            registry.delete_data_sequenced(&publisher, &publisher, *root, key, sequence)
        }
    };

    match &result {
        Ok(()) => {
            if let Ok(id) = signed.id() {
                tracing::debug!(
                    kind = signed.op.kind(),
                    id = %hex::encode(&id[..8]),
                    sequence = signed.sequence,
                    "operation applied"
                );
            }
        }
        Err(e) => tracing::warn!(
            kind = signed.op.kind(),
            publisher = %publisher,
            root = %short(signed.op.root()),
            sequence = signed.sequence,
            paid = signed.op.payment().map(|p| p.amount),
            error = %e,
            "operation rejected"
        ),
    }
    result
}
