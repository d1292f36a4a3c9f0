//! Merkle inclusion proofs over sorted-pair trees.
//!
//! A proof is the concatenation of the 32-byte sibling hashes met on the
//! way from a leaf to the root, bottom level first. Each level combines the
//! running hash with its sibling via [`hash_sorted_pair`], so no left/right
//! direction bits are carried.
//!
//! The registry never sees a whole tree: publishers build trees off-system
//! and submit only the root. The [`MerkleTree`] builder behind the
//! `tree-builder` feature exists for that publisher-side tooling and for
//! tests.

#[cfg(any(test, feature = "tree-builder"))]
mod tree;

#[cfg(any(test, feature = "tree-builder"))]
pub use tree::MerkleTree;

use crate::crypto::{hash_sorted_pair, sha256};
use crate::error::ProofError;

/// Width of one sibling hash in a proof.
pub const HASH_LEN: usize = 32;

/// Deepest proof accepted by default. 2^64 leaves is beyond any real set.
pub const MAX_PROOF_SIBLINGS: usize = 64;

/// Hash raw leaf data into the leaf hash a proof starts from.
#[inline]
pub fn leaf_hash(leaf_data: &[u8]) -> [u8; 32] {
    sha256(leaf_data)
}

/// Fold `leaf` up through every sibling in `proof` and return the root it
/// implies.
///
/// Fails if `proof` is not a whole number of siblings or exceeds
/// `max_siblings`.
pub fn compute_root(
    leaf: &[u8; 32],
    proof: &[u8],
    max_siblings: usize,
) -> Result<[u8; 32], ProofError> {
    if proof.len() % HASH_LEN != 0 {
        return Err(ProofError::MalformedLength { len: proof.len() });
    }
    let siblings = proof.len() / HASH_LEN;
    if siblings > max_siblings {
        return Err(ProofError::TooLong {
            siblings,
            limit: max_siblings,
        });
    }

    // chunks_exact advances exactly one sibling per step; the length check
    // above guarantees there is no remainder.
    let root = proof.chunks_exact(HASH_LEN).fold(*leaf, |current, chunk| {
        let mut sibling = [0u8; HASH_LEN];
        sibling.copy_from_slice(chunk);
        hash_sorted_pair(&current, &sibling)
    });

    Ok(root)
}

/// Check that `leaf` is included under `root`, reporting why it is not.
///
/// An empty proof succeeds only when `leaf == root`, i.e. a one-leaf tree.
pub fn verify_strict(
    root: &[u8; 32],
    leaf: &[u8; 32],
    proof: &[u8],
    max_siblings: usize,
) -> Result<(), ProofError> {
    let computed = compute_root(leaf, proof, max_siblings)?;
    if computed != *root {
        return Err(ProofError::RootMismatch);
    }
    Ok(())
}

/// Check that `leaf` is included under `root`.
pub fn verify(root: &[u8; 32], leaf: &[u8; 32], proof: &[u8]) -> bool {
    verify_strict(root, leaf, proof, MAX_PROOF_SIBLINGS).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: usize) -> Vec<[u8; 32]> {
        (0..n).map(|i| leaf_hash(format!("leaf-{i}").as_bytes())).collect()
    }

    #[test]
    fn test_every_leaf_verifies() {
        for n in [1usize, 2, 3, 4, 5, 7, 8, 13] {
            let hashes = leaves(n);
            let tree = MerkleTree::from_leaf_hashes(hashes.clone());
            for (i, leaf) in hashes.iter().enumerate() {
                let proof = tree.proof(i).unwrap();
                assert!(verify(&tree.root(), leaf, &proof), "n={n} i={i}");
            }
        }
    }

    #[test]
    fn test_empty_proof_single_leaf() {
        let leaf = leaf_hash(b"only");
        assert!(verify(&leaf, &leaf, &[]));

        let other = leaf_hash(b"other");
        assert!(!verify(&other, &leaf, &[]));
    }

    #[test]
    fn test_two_leaf_root_by_hand() {
        let a = leaf_hash(b"a");
        let b = leaf_hash(b"b");
        let root = hash_sorted_pair(&a, &b);

        assert!(verify(&root, &a, &b));
        assert!(verify(&root, &b, &a));
    }

    #[test]
    fn test_malformed_length_rejected() {
        let leaf = leaf_hash(b"x");
        let proof = vec![0u8; 33];

        assert!(!verify(&leaf, &leaf, &proof));
        assert_eq!(
            verify_strict(&leaf, &leaf, &proof, MAX_PROOF_SIBLINGS),
            Err(ProofError::MalformedLength { len: 33 })
        );
    }

    #[test]
    fn test_too_many_siblings_rejected() {
        let leaf = leaf_hash(b"x");
        let proof = vec![0u8; HASH_LEN * 3];

        assert_eq!(
            compute_root(&leaf, &proof, 2),
            Err(ProofError::TooLong { siblings: 3, limit: 2 })
        );
    }

    #[test]
    fn test_bit_flip_in_proof_fails() {
        let hashes = leaves(8);
        let tree = MerkleTree::from_leaf_hashes(hashes.clone());
        let proof = tree.proof(5).unwrap();

        for byte in 0..proof.len() {
            for bit in [0u8, 3, 7] {
                let mut tampered = proof.clone();
                tampered[byte] ^= 1 << bit;
                assert!(!verify(&tree.root(), &hashes[5], &tampered));
            }
        }
    }

    #[test]
    fn test_bit_flip_in_leaf_fails() {
        let hashes = leaves(4);
        let tree = MerkleTree::from_leaf_hashes(hashes.clone());
        let proof = tree.proof(2).unwrap();

        for byte in 0..HASH_LEN {
            let mut leaf = hashes[2];
            leaf[byte] ^= 0x01;
            assert!(!verify(&tree.root(), &leaf, &proof));
        }
    }

    #[test]
    fn test_wrong_root_reports_mismatch() {
        let hashes = leaves(4);
        let tree = MerkleTree::from_leaf_hashes(hashes.clone());
        let proof = tree.proof(0).unwrap();

        assert_eq!(
            verify_strict(&[0u8; 32], &hashes[0], &proof, MAX_PROOF_SIBLINGS),
            Err(ProofError::RootMismatch)
        );
    }

    #[test]
    fn test_proof_for_one_tree_fails_on_another() {
        let tree_a = MerkleTree::from_leaf_hashes(leaves(4));
        let tree_b = MerkleTree::from_leaf_hashes(leaves(5));
        let proof = tree_a.proof(1).unwrap();

        assert!(!verify(&tree_b.root(), &leaves(4)[1], &proof));
    }
}
