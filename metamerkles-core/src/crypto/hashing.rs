//! SHA-256 hashing utilities.

use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of the input data.
#[inline]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-256 hash of concatenated data slices.
///
/// More efficient than allocating a buffer for concatenation.
pub fn sha256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Hash two nodes in canonical order: `sha256(min(a, b) || max(a, b))`.
///
/// Byte arrays compare lexicographically, which for equal-length arrays is
/// the same as comparing them as big-endian unsigned integers. The operands
/// commute, so a proof never has to say which side a sibling sits on.
#[inline]
pub fn hash_sorted_pair(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    if a <= b {
        sha256_concat(&[a, b])
    } else {
        sha256_concat(&[b, a])
    }
}
