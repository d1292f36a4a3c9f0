//! Operation payloads.

use serde::{Deserialize, Serialize};

use crate::types::{Hash, Payment, RootTags};

/// A state-changing registry request.
///
/// The acting publisher is not part of the payload: it is the key that
/// signs the operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Publish a root and record its type tags.
    AddRoot {
        /// Merkle root being published.
        root: Hash,
        /// Tags stored in the reserved metadata entries.
        tags: RootTags,
        /// Funding for the root entry and every reserved entry.
        payment: Payment,
    },

    /// Withdraw a root and reclaim its funding.
    DeleteRoot {
        /// Merkle root being withdrawn.
        root: Hash,
    },

    /// Attach a metadata record to a published root.
    AddData {
        /// Root the record belongs to.
        root: Hash,
        /// Metadata key, at most 32 bytes.
        key: String,
        /// Opaque value, at most 2048 bytes.
        value: Vec<u8>,
        /// Funding for the record.
        payment: Payment,
    },

    /// Remove a metadata record and reclaim its funding.
    DeleteData {
        /// Root the record belongs to.
        root: Hash,
        /// Metadata key.
        key: String,
    },
}

impl Operation {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::AddRoot { .. } => "add_root",
            Operation::DeleteRoot { .. } => "delete_root",
            Operation::AddData { .. } => "add_data",
            Operation::DeleteData { .. } => "delete_data",
        }
    }

    /// Root the operation targets.
    pub fn root(&self) -> &Hash {
        match self {
            Operation::AddRoot { root, .. }
            | Operation::DeleteRoot { root }
            | Operation::AddData { root, .. }
            | Operation::DeleteData { root, .. } => root,
        }
    }

    /// Payment attached to the operation, if it allocates storage.
    pub fn payment(&self) -> Option<&Payment> {
        match self {
            Operation::AddRoot { payment, .. } | Operation::AddData { payment, .. } => Some(payment),
            Operation::DeleteRoot { .. } | Operation::DeleteData { .. } => None,
        }
    }
}
