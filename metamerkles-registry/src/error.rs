//! Error types for registry operations.

use metamerkles_core::{CoreError, ProofError, PublisherId, TagError};
use metamerkles_storage::StorageError;
use thiserror::Error;

use crate::ledger::LedgerError;

/// All validation and execution errors for registry operations.
///
/// Every error is terminal for the operation that raised it: no storage
/// entry and no funds have moved when one is returned.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    // === Existence ===
    /// Create on an entry that is already present.
    #[error("already exists: {what}")]
    AlreadyExists {
        /// Short description of the entry.
        what: String,
    },
    /// Operation on an absent entry.
    #[error("not found: {what}")]
    NotFound {
        /// Short description of the entry.
        what: String,
    },

    // === Funding ===
    /// Attached payment is below the required storage cost.
    #[error("insufficient funding: provided {provided}, required {required}")]
    InsufficientFunding {
        /// Amount attached.
        provided: u64,
        /// Exact cost of the allocation.
        required: u64,
    },
    /// Attached payment is above the required storage cost.
    #[error("funding mismatch: provided {provided}, required exactly {required}")]
    FundingMismatch {
        /// Amount attached.
        provided: u64,
        /// Exact cost of the allocation.
        required: u64,
    },
    /// Payment is not from the publisher to the registry escrow.
    #[error("invalid payment: {reason}")]
    InvalidPayment {
        /// What is wrong with it.
        reason: &'static str,
    },

    // === Limits ===
    /// Metadata key or value is longer than allowed.
    #[error("{field} of {len} bytes exceeds limit of {limit}")]
    SizeLimitExceeded {
        /// `"key"` or `"value"`.
        field: &'static str,
        /// Offered length.
        len: usize,
        /// Configured limit.
        limit: usize,
    },

    // === Verification ===
    /// Merkle proof is malformed or does not lead to the root.
    #[error("proof invalid: {0}")]
    ProofInvalid(ProofError),
    /// Recorded schema differs from the expected one.
    #[error("schema mismatch: expected {expected}, recorded {recorded:?}")]
    SchemaMismatch {
        /// Schema the caller asked for.
        expected: u64,
        /// Schema on record, if any.
        recorded: Option<u64>,
    },
    /// Recorded list type differs from the expected one.
    #[error("list type mismatch: expected {expected}, recorded {recorded:?}")]
    ListTypeMismatch {
        /// List type the caller asked for.
        expected: u64,
        /// List type on record, if any.
        recorded: Option<u64>,
    },
    /// Root type or tag scheme does not fit the request.
    #[error("type mismatch: {reason}")]
    TypeMismatch {
        /// What disagreed.
        reason: String,
    },

    // === Authorization ===
    /// Caller is not the publisher that owns the entry.
    #[error("unauthorized: {caller} is not publisher {publisher}")]
    Unauthorized {
        /// Owning publisher.
        publisher: PublisherId,
        /// Identity that attempted the mutation.
        caller: PublisherId,
    },
    /// Signed operation does not verify.
    #[error("invalid signature")]
    InvalidSignature,
    /// Signed operation is not the publisher's next in sequence.
    #[error("sequence mismatch: expected {expected}, got {got}")]
    SequenceMismatch {
        /// Next sequence number of the publisher.
        expected: u64,
        /// Sequence number the operation was signed with.
        got: u64,
    },

    // === Tags ===
    /// Key is reserved for type tags.
    #[error("metadata key {key:?} is reserved")]
    ReservedKey {
        /// The key.
        key: String,
    },
    /// Tag value not allowed at publish time.
    #[error("invalid tag {name} = {value}")]
    InvalidTag {
        /// Tag name.
        name: &'static str,
        /// Offered value.
        value: u64,
    },
    /// A stored tag could not be decoded.
    #[error("malformed tag: {0}")]
    MalformedTag(TagError),

    // === General ===
    /// Fee arithmetic overflowed.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
    /// Funds could not be moved.
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),
    /// Configuration differs from the settings the store was created with.
    #[error("{field} differs from the value this store was created with")]
    SettingsMismatch {
        /// First differing setting.
        field: &'static str,
    },
    /// Substrate failure.
    #[error("storage: {0}")]
    Storage(String),
}

impl RegistryError {
    pub(crate) fn already_exists(what: impl Into<String>) -> Self {
        RegistryError::AlreadyExists { what: what.into() }
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        RegistryError::NotFound { what: what.into() }
    }

    pub(crate) fn type_mismatch(reason: impl Into<String>) -> Self {
        RegistryError::TypeMismatch {
            reason: reason.into(),
        }
    }
}

impl From<StorageError> for RegistryError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::AlreadyExists(what) => RegistryError::already_exists(what),
            StorageError::NotFound(what) => RegistryError::not_found(what),
            StorageError::ValueTooLarge { len, max } => RegistryError::SizeLimitExceeded {
                field: "value",
                len,
                limit: max,
            },
            other => RegistryError::Storage(other.to_string()),
        }
    }
}

impl From<ProofError> for RegistryError {
    fn from(e: ProofError) -> Self {
        RegistryError::ProofInvalid(e)
    }
}

impl From<TagError> for RegistryError {
    fn from(e: TagError) -> Self {
        RegistryError::MalformedTag(e)
    }
}

impl From<CoreError> for RegistryError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Proof(e) => RegistryError::ProofInvalid(e),
            CoreError::Tag(e) => RegistryError::MalformedTag(e),
            CoreError::Crypto(_) | CoreError::Serialization(_) => RegistryError::InvalidSignature,
        }
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_map_to_registry_taxonomy() {
        assert_eq!(
            RegistryError::from(StorageError::AlreadyExists("ab".into())),
            RegistryError::already_exists("ab")
        );
        assert_eq!(
            RegistryError::from(StorageError::NotFound("cd".into())),
            RegistryError::not_found("cd")
        );
        assert!(matches!(
            RegistryError::from(StorageError::ValueTooLarge { len: 3000, max: 2048 }),
            RegistryError::SizeLimitExceeded { field: "value", len: 3000, limit: 2048 }
        ));
        assert!(matches!(
            RegistryError::from(StorageError::LockPoisoned),
            RegistryError::Storage(_)
        ));
    }

    #[test]
    fn test_display_is_readable() {
        let err = RegistryError::ListTypeMismatch {
            expected: 2,
            recorded: Some(1),
        };
        assert_eq!(err.to_string(), "list type mismatch: expected 2, recorded Some(1)");

        let err = RegistryError::Unauthorized {
            publisher: PublisherId([0xAA; 32]),
            caller: PublisherId([0xBB; 32]),
        };
        assert_eq!(err.to_string(), "unauthorized: bbbbbbbb is not publisher aaaaaaaa");
    }
}
