//! Publisher-side sorted-pair Merkle tree.

use crate::crypto::hash_sorted_pair;

use super::{leaf_hash, HASH_LEN};

/// A fully materialized sorted-pair Merkle tree.
///
/// Levels are built bottom-up by pairing adjacent nodes. An odd node at the
/// end of a level is promoted unchanged, so it contributes no sibling to
/// proofs through it.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    /// `levels[0]` holds the leaf hashes, the last level holds the root.
    /// Empty when built from zero leaves.
    levels: Vec<Vec<[u8; 32]>>,
}

impl MerkleTree {
    /// Build a tree by hashing each raw leaf with SHA-256.
    pub fn from_leaves<I, T>(leaves: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        Self::from_leaf_hashes(leaves.into_iter().map(|l| leaf_hash(l.as_ref())).collect())
    }

    /// Build a tree over pre-hashed leaves.
    ///
    /// An empty input yields an all-zero root that no leaf can prove into.
    pub fn from_leaf_hashes(leaves: Vec<[u8; 32]>) -> Self {
        if leaves.is_empty() {
            return Self { levels: Vec::new() };
        }

        let mut levels = vec![leaves];
        while levels.last().map_or(0, Vec::len) > 1 {
            let current = &levels[levels.len() - 1];
            let next: Vec<[u8; 32]> = current
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => hash_sorted_pair(left, right),
                    [single] => *single,
                    _ => unreachable!("chunks(2) yields one or two items"),
                })
                .collect();
            levels.push(next);
        }

        Self { levels }
    }

    /// The committed root.
    pub fn root(&self) -> [u8; 32] {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or([0u8; 32])
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Whether the tree was built from zero leaves.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Concatenated sibling hashes for the leaf at `index`, bottom level first.
    pub fn proof(&self, index: usize) -> Option<Vec<u8>> {
        if index >= self.len() {
            return None;
        }

        let mut proof = Vec::with_capacity(HASH_LEN * self.levels.len());
        let mut position = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = position ^ 1;
            if let Some(hash) = level.get(sibling) {
                proof.extend_from_slice(hash);
            }
            position /= 2;
        }
        Some(proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sha256;

    #[test]
    fn test_single_leaf_root_is_leaf() {
        let tree = MerkleTree::from_leaves([b"solo"]);
        assert_eq!(tree.root(), sha256(b"solo"));
        assert_eq!(tree.proof(0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_four_leaf_structure() {
        let tree = MerkleTree::from_leaves([b"l0", b"l1", b"l2", b"l3"]);
        let h: Vec<[u8; 32]> = [b"l0", b"l1", b"l2", b"l3"].iter().map(|l| sha256(*l)).collect();

        let left = hash_sorted_pair(&h[0], &h[1]);
        let right = hash_sorted_pair(&h[2], &h[3]);
        assert_eq!(tree.root(), hash_sorted_pair(&left, &right));

        let proof = tree.proof(3).unwrap();
        assert_eq!(&proof[..32], &h[2]);
        assert_eq!(&proof[32..], &left);
    }

    #[test]
    fn test_odd_node_promoted() {
        let tree = MerkleTree::from_leaves([b"a", b"b", b"c"]);
        // "c" has no sibling on the first level, only the (a,b) node above.
        assert_eq!(tree.proof(2).unwrap().len(), HASH_LEN);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_out_of_range_index() {
        let tree = MerkleTree::from_leaves([b"a", b"b"]);
        assert!(tree.proof(2).is_none());
    }

    #[test]
    fn test_empty_tree() {
        let tree = MerkleTree::from_leaf_hashes(Vec::new());
        assert!(tree.is_empty());
        assert_eq!(tree.root(), [0u8; 32]);
        assert!(tree.proof(0).is_none());
    }
}
