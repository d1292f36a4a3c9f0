//! Proof verification and proof-gated reads.

use metamerkles_core::merkle::{leaf_hash, verify_strict};
use metamerkles_core::{Hash, PublisherId, RootType, TypeConstraint};
use metamerkles_storage::{BoxStore, KeyCodec, KvBackend};

use super::Registry;
use crate::error::RegistryResult;
use crate::ledger::Ledger;
use crate::policy::TagSource;

/// Reserved entries of one (publisher, root).
struct RootTagView<'a, B> {
    boxes: &'a BoxStore<B>,
    codec: &'a KeyCodec,
    publisher: &'a PublisherId,
    root: &'a Hash,
}

impl<B: KvBackend> TagSource for RootTagView<'_, B> {
    fn raw_tag(&self, key: &str) -> RegistryResult<Option<Vec<u8>>> {
        let data_key = self.codec.derive_metadata_key(self.publisher, self.root, key);
        Ok(self.boxes.backend().get(&data_key.to_bytes())?)
    }
}

impl<B: KvBackend, L: Ledger> Registry<B, L> {
    fn tag_view<'a>(&'a self, publisher: &'a PublisherId, root: &'a Hash) -> RootTagView<'a, B> {
        RootTagView {
            boxes: &self.boxes,
            codec: &self.codec,
            publisher,
            root,
        }
    }

    /// Require `leaf` to be included under `root` via `proof`.
    fn prove(&self, root: &Hash, leaf: &Hash, proof: &[u8]) -> RegistryResult<()> {
        verify_strict(root, leaf, proof, self.config.max_proof_siblings)?;
        Ok(())
    }

    /// Whether `leaf_data` is a member of the published `root`.
    ///
    /// Fails only if the root is not published; a bad or malformed proof
    /// yields `false`.
    pub fn verify(
        &self,
        publisher: &PublisherId,
        root: &Hash,
        proof: &[u8],
        leaf_data: &[u8],
    ) -> RegistryResult<bool> {
        self.require_root(publisher, root)?;
        Ok(self.prove(root, &leaf_hash(leaf_data), proof).is_ok())
    }

    /// Read `key` of a root only after proving `leaf_data` is in it and the
    /// root's recorded type satisfies `constraint`.
    ///
    /// # Validation
    /// - Root must exist
    /// - Proof must lead from `sha256(leaf_data)` to the root
    /// - Recorded tags must satisfy `constraint`
    /// - Entry must exist
    pub fn verified_read(
        &self,
        publisher: &PublisherId,
        root: &Hash,
        proof: &[u8],
        leaf_data: &[u8],
        key: &str,
        constraint: &TypeConstraint,
    ) -> RegistryResult<Vec<u8>> {
        self.require_root(publisher, root)?;
        self.prove(root, &leaf_hash(leaf_data), proof)?;
        self.policy
            .check(&self.tag_view(publisher, root), constraint)?;
        self.read(publisher, root, key)
    }

    /// Check membership of a leaf of kind `wanted`, encoded as `leaf_data`.
    fn verify_typed(
        &self,
        publisher: &PublisherId,
        root: &Hash,
        proof: &[u8],
        leaf_data: &[u8],
        wanted: RootType,
    ) -> RegistryResult<bool> {
        self.require_root(publisher, root)?;
        self.policy.check(
            &self.tag_view(publisher, root),
            &TypeConstraint::Typed(wanted),
        )?;
        Ok(self.prove(root, &leaf_hash(leaf_data), proof).is_ok())
    }

    /// Whether asset `asset_id` is in an asset (or mixed) root. The leaf is
    /// the id as 8 big-endian bytes.
    pub fn verify_asset(
        &self,
        publisher: &PublisherId,
        root: &Hash,
        proof: &[u8],
        asset_id: u64,
    ) -> RegistryResult<bool> {
        self.verify_typed(publisher, root, proof, &asset_id.to_be_bytes(), RootType::Asset)
    }

    /// Whether `address` is in an address (or mixed) root. The leaf is the
    /// raw 32 address bytes.
    pub fn verify_address(
        &self,
        publisher: &PublisherId,
        root: &Hash,
        proof: &[u8],
        address: &[u8; 32],
    ) -> RegistryResult<bool> {
        self.verify_typed(publisher, root, proof, address, RootType::Address)
    }

    /// Whether application `app_id` is in an app (or mixed) root. The leaf
    /// is the id as 8 big-endian bytes.
    pub fn verify_app(
        &self,
        publisher: &PublisherId,
        root: &Hash,
        proof: &[u8],
        app_id: u64,
    ) -> RegistryResult<bool> {
        self.verify_typed(publisher, root, proof, &app_id.to_be_bytes(), RootType::App)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use crate::error::RegistryError;
    use metamerkles_core::merkle::MerkleTree;
    use metamerkles_core::{ProofError, RootTags, RootType, TypeConstraint};

    fn tree() -> MerkleTree {
        MerkleTree::from_leaves([b"L0", b"L1", b"L2", b"L3"])
    }

    #[test]
    fn test_verify_requires_published_root() {
        let (registry, kp) = registry();
        let t = tree();
        assert!(matches!(
            registry.verify(&kp.id(), &t.root(), &t.proof(0).unwrap(), b"L0"),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_verify() {
        let (mut registry, kp) = registry();
        let id = kp.id();
        let t = tree();
        publish(&mut registry, &id, t.root(), listed(1, 1));

        let proof = t.proof(2).unwrap();
        assert!(registry.verify(&id, &t.root(), &proof, b"L2").unwrap());
        assert!(!registry.verify(&id, &t.root(), &proof, b"L3").unwrap());
        assert!(!registry.verify(&id, &t.root(), &proof[..31], b"L2").unwrap());
    }

    #[test]
    fn test_verified_read_gates() {
        let (mut registry, kp) = registry();
        let id = kp.id();
        let t = tree();
        let root = t.root();
        publish(&mut registry, &id, root, listed(1, 1));
        attach(&mut registry, &id, root, "royalty", b"5");
        let proof = t.proof(1).unwrap();

        assert_eq!(
            registry
                .verified_read(&id, &root, &proof, b"L1", "royalty", &TypeConstraint::listed(1, 1))
                .unwrap(),
            b"5"
        );
        assert_eq!(
            registry.verified_read(&id, &root, &proof, b"L0", "royalty", &TypeConstraint::listed(1, 1)),
            Err(RegistryError::ProofInvalid(ProofError::RootMismatch))
        );
        assert_eq!(
            registry.verified_read(&id, &root, &[0u8; 33], b"L1", "royalty", &TypeConstraint::listed(1, 1)),
            Err(RegistryError::ProofInvalid(ProofError::MalformedLength { len: 33 }))
        );
        assert!(matches!(
            registry.verified_read(&id, &root, &proof, b"L1", "royalty", &TypeConstraint::listed(3, 0)),
            Err(RegistryError::SchemaMismatch { expected: 3, .. })
        ));
        assert!(matches!(
            registry.verified_read(&id, &root, &proof, b"L1", "missing", &TypeConstraint::listed(0, 0)),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_proof_depth_limit() {
        let (mut registry, kp) = registry_with(
            crate::config::RegistryConfig::default().with_max_proof_siblings(1),
        );
        let id = kp.id();
        let t = tree();
        publish(&mut registry, &id, t.root(), listed(1, 1));
        attach(&mut registry, &id, t.root(), "royalty", b"5");

        assert_eq!(
            registry.verified_read(
                &id,
                &t.root(),
                &t.proof(0).unwrap(),
                b"L0",
                "royalty",
                &TypeConstraint::Unconstrained
            ),
            Err(RegistryError::ProofInvalid(ProofError::TooLong {
                siblings: 2,
                limit: 1
            }))
        );
    }

    #[test]
    fn test_typed_entrypoints() {
        let (mut registry, kp) = typed_registry();
        let id = kp.id();

        let assets = MerkleTree::from_leaves([1u64, 2, 3].map(u64::to_be_bytes));
        publish(&mut registry, &id, assets.root(), RootTags::Typed(RootType::Asset));

        let proof = assets.proof(1).unwrap();
        assert!(registry.verify_asset(&id, &assets.root(), &proof, 2).unwrap());
        assert!(!registry.verify_asset(&id, &assets.root(), &proof, 3).unwrap());
        assert!(matches!(
            registry.verify_app(&id, &assets.root(), &proof, 2),
            Err(RegistryError::TypeMismatch { .. })
        ));

        let addr = [0xA5; 32];
        let mixed = MerkleTree::from_leaves([addr.to_vec(), 7u64.to_be_bytes().to_vec()]);
        publish(&mut registry, &id, mixed.root(), RootTags::Typed(RootType::Mixed));
        assert!(registry
            .verify_address(&id, &mixed.root(), &mixed.proof(0).unwrap(), &addr)
            .unwrap());
        assert!(registry
            .verify_app(&id, &mixed.root(), &mixed.proof(1).unwrap(), 7)
            .unwrap());
    }

    #[test]
    fn test_typed_entrypoints_on_list_registry() {
        let (mut registry, kp) = registry();
        let id = kp.id();
        let t = tree();
        publish(&mut registry, &id, t.root(), listed(2, 1));
        assert!(matches!(
            registry.verify_asset(&id, &t.root(), &t.proof(0).unwrap(), 1),
            Err(RegistryError::TypeMismatch { .. })
        ));
    }
}
