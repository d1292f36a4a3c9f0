//! Storage allocation fees.

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

/// Flat fee charged for any storage entry.
pub const DEFAULT_BASE_FEE: u64 = 2_500;

/// Fee per byte of key plus value.
pub const DEFAULT_PER_BYTE_FEE: u64 = 400;

/// Fee schedule for storage entries.
///
/// `cost = base + per_byte * (key_bytes + value_bytes)`. The same function
/// prices a create and the refund of the matching delete, so a refund must
/// be computed from the length actually stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageCostModel {
    /// Flat fee per entry.
    pub base: u64,
    /// Fee per key or value byte.
    pub per_byte: u64,
}

impl Default for StorageCostModel {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE_FEE,
            per_byte: DEFAULT_PER_BYTE_FEE,
        }
    }
}

impl StorageCostModel {
    /// Create a fee schedule.
    pub const fn new(base: u64, per_byte: u64) -> Self {
        Self { base, per_byte }
    }

    /// Fee for an entry with the given key and value lengths.
    pub fn cost(&self, key_bytes: usize, value_bytes: usize) -> RegistryResult<u64> {
        let bytes = key_bytes
            .checked_add(value_bytes)
            .and_then(|n| u64::try_from(n).ok())
            .ok_or(RegistryError::ArithmeticOverflow)?;
        self.per_byte
            .checked_mul(bytes)
            .and_then(|n| n.checked_add(self.base))
            .ok_or(RegistryError::ArithmeticOverflow)
    }

    /// Sum of several fees.
    pub fn total<I: IntoIterator<Item = u64>>(fees: I) -> RegistryResult<u64> {
        fees.into_iter()
            .try_fold(0u64, |acc, fee| acc.checked_add(fee))
            .ok_or(RegistryError::ArithmeticOverflow)
    }
}
