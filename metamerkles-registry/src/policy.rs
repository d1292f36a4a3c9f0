//! Type tag schemes.
//!
//! A publisher records what a root commits to in reserved metadata entries
//! when it publishes the root. A verified read compares the caller's
//! expectation against those entries, so a proof for one of the publisher's
//! datasets cannot be passed off as membership in another of a different
//! purpose.

use metamerkles_core::types::decode_tag;
use metamerkles_core::{ListType, RootTags, RootType, SchemaType, TypeConstraint};

use crate::config::TagScheme;
use crate::error::{RegistryError, RegistryResult};

/// Reserved key holding the schema tag.
pub const LIST_SCHEMA_KEY: &str = "list.schema";

/// Reserved key holding the list-type tag.
pub const LIST_TYPE_KEY: &str = "list.type";

/// Reserved key holding the closed root-type tag.
pub const ROOT_TYPE_KEY: &str = "root.type";

/// Read access to the raw reserved entries of one root.
pub trait TagSource {
    /// Stored bytes under `key`, if present.
    fn raw_tag(&self, key: &str) -> RegistryResult<Option<Vec<u8>>>;

    /// Decoded tag under `key`, if present.
    fn tag(&self, key: &str) -> RegistryResult<Option<u64>> {
        match self.raw_tag(key)? {
            Some(raw) => Ok(Some(decode_tag(&raw)?)),
            None => Ok(None),
        }
    }
}

/// A scheme of reserved type tags.
pub trait TypePolicy: Send + Sync {
    /// Keys this scheme reserves. Publishers cannot write them directly.
    fn reserved_keys(&self) -> &'static [&'static str];

    /// Reserved entries to create for a newly published root.
    fn seed(&self, tags: &RootTags) -> RegistryResult<Vec<(&'static str, u64)>>;

    /// Whether the root whose tags `source` exposes satisfies `constraint`.
    fn check(&self, source: &dyn TagSource, constraint: &TypeConstraint) -> RegistryResult<()>;

    /// Whether `key` is one of [`reserved_keys`](Self::reserved_keys).
    fn is_reserved(&self, key: &str) -> bool {
        self.reserved_keys().contains(&key)
    }
}

/// Open schema + list-type tags.
#[derive(Clone, Copy, Debug, Default)]
pub struct ListTagPolicy;

impl TypePolicy for ListTagPolicy {
    fn reserved_keys(&self) -> &'static [&'static str] {
        &[LIST_SCHEMA_KEY, LIST_TYPE_KEY]
    }

    fn seed(&self, tags: &RootTags) -> RegistryResult<Vec<(&'static str, u64)>> {
        let RootTags::Listed { schema, list_type } = *tags else {
            return Err(RegistryError::type_mismatch(
                "registry records schema and list type tags",
            ));
        };
        if schema.is_unspecified() {
            return Err(RegistryError::InvalidTag {
                name: LIST_SCHEMA_KEY,
                value: schema.0,
            });
        }
        if list_type.is_unspecified() {
            return Err(RegistryError::InvalidTag {
                name: LIST_TYPE_KEY,
                value: list_type.0,
            });
        }
        Ok(vec![(LIST_SCHEMA_KEY, schema.0), (LIST_TYPE_KEY, list_type.0)])
    }

    fn check(&self, source: &dyn TagSource, constraint: &TypeConstraint) -> RegistryResult<()> {
        let (schema, list_type) = match *constraint {
            TypeConstraint::Unconstrained => return Ok(()),
            TypeConstraint::Listed { schema, list_type } => (schema, list_type),
            TypeConstraint::Typed(_) => {
                return Err(RegistryError::type_mismatch(
                    "root type constraint on a list-tag registry",
                ))
            }
        };

        if schema != SchemaType::UNSPECIFIED {
            let recorded = source.tag(LIST_SCHEMA_KEY)?;
            if recorded != Some(schema.0) {
                return Err(RegistryError::SchemaMismatch {
                    expected: schema.0,
                    recorded,
                });
            }
        }
        if list_type != ListType::UNSPECIFIED {
            let recorded = source.tag(LIST_TYPE_KEY)?;
            if recorded != Some(list_type.0) {
                return Err(RegistryError::ListTypeMismatch {
                    expected: list_type.0,
                    recorded,
                });
            }
        }
        Ok(())
    }
}

/// Closed root-type tag.
#[derive(Clone, Copy, Debug, Default)]
pub struct RootTypePolicy;

impl RootTypePolicy {
    /// The recorded root type.
    pub fn recorded(source: &dyn TagSource) -> RegistryResult<Option<RootType>> {
        match source.tag(ROOT_TYPE_KEY)? {
            Some(raw) => Ok(Some(RootType::try_from(raw)?)),
            None => Ok(None),
        }
    }
}

impl TypePolicy for RootTypePolicy {
    fn reserved_keys(&self) -> &'static [&'static str] {
        &[ROOT_TYPE_KEY]
    }

    fn seed(&self, tags: &RootTags) -> RegistryResult<Vec<(&'static str, u64)>> {
        match *tags {
            RootTags::Typed(root_type) => Ok(vec![(ROOT_TYPE_KEY, root_type.as_u64())]),
            RootTags::Listed { .. } => Err(RegistryError::type_mismatch(
                "registry records a root type tag",
            )),
        }
    }

    fn check(&self, source: &dyn TagSource, constraint: &TypeConstraint) -> RegistryResult<()> {
        let wanted = match *constraint {
            TypeConstraint::Unconstrained => return Ok(()),
            TypeConstraint::Typed(wanted) => wanted,
            TypeConstraint::Listed { .. } => {
                return Err(RegistryError::type_mismatch(
                    "list tag constraint on a root-type registry",
                ))
            }
        };

        match Self::recorded(source)? {
            Some(recorded) if recorded.admits(wanted) => Ok(()),
            Some(recorded) => Err(RegistryError::type_mismatch(format!(
                "root is {:?}, wanted {:?}",
                recorded, wanted
            ))),
            None => Err(RegistryError::type_mismatch("root has no type tag")),
        }
    }
}

/// The policy implementing `scheme`.
pub fn policy_for(scheme: TagScheme) -> Box<dyn TypePolicy> {
    match scheme {
        TagScheme::ListTags => Box::new(ListTagPolicy),
        TagScheme::RootType => Box::new(RootTypePolicy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metamerkles_core::types::encode_tag;
    use metamerkles_core::TagError;
    use std::collections::HashMap;

    struct Tags(HashMap<&'static str, Vec<u8>>);

    impl Tags {
        fn of(entries: &[(&'static str, u64)]) -> Self {
            Tags(
                entries
                    .iter()
                    .map(|(k, v)| (*k, encode_tag(*v).to_vec()))
                    .collect(),
            )
        }
    }

    impl TagSource for Tags {
        fn raw_tag(&self, key: &str) -> RegistryResult<Option<Vec<u8>>> {
            Ok(self.0.get(key).cloned())
        }
    }

    #[test]
    fn test_list_seed() {
        let seeded = ListTagPolicy
            .seed(&RootTags::Listed {
                schema: SchemaType::UINT64,
                list_type: ListType::COLLECTION,
            })
            .unwrap();
        assert_eq!(seeded, vec![(LIST_SCHEMA_KEY, 2), (LIST_TYPE_KEY, 1)]);
    }

    #[test]
    fn test_list_seed_rejects_unspecified_and_wrong_scheme() {
        let err = ListTagPolicy
            .seed(&RootTags::Listed {
                schema: SchemaType::STRING,
                list_type: ListType::UNSPECIFIED,
            })
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::InvalidTag {
                name: LIST_TYPE_KEY,
                value: 0
            }
        );
        assert!(matches!(
            ListTagPolicy.seed(&RootTags::Typed(RootType::Asset)),
            Err(RegistryError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_list_check() {
        let tags = Tags::of(&[(LIST_SCHEMA_KEY, 1), (LIST_TYPE_KEY, 1)]);

        ListTagPolicy.check(&tags, &TypeConstraint::listed(1, 1)).unwrap();
        ListTagPolicy.check(&tags, &TypeConstraint::listed(0, 0)).unwrap();
        ListTagPolicy.check(&tags, &TypeConstraint::Unconstrained).unwrap();
        assert_eq!(
            ListTagPolicy.check(&tags, &TypeConstraint::listed(2, 1)),
            Err(RegistryError::SchemaMismatch {
                expected: 2,
                recorded: Some(1)
            })
        );
        assert_eq!(
            ListTagPolicy.check(&tags, &TypeConstraint::listed(0, 2)),
            Err(RegistryError::ListTypeMismatch {
                expected: 2,
                recorded: Some(1)
            })
        );
    }

    #[test]
    fn test_list_check_fails_closed_on_missing_tag() {
        let tags = Tags::of(&[]);
        assert_eq!(
            ListTagPolicy.check(&tags, &TypeConstraint::listed(1, 0)),
            Err(RegistryError::SchemaMismatch {
                expected: 1,
                recorded: None
            })
        );
    }

    #[test]
    fn test_malformed_tag() {
        let mut tags = Tags::of(&[]);
        tags.0.insert(LIST_SCHEMA_KEY, vec![1, 2]);
        assert_eq!(
            ListTagPolicy.check(&tags, &TypeConstraint::listed(1, 0)),
            Err(RegistryError::MalformedTag(TagError::BadLength { len: 2 }))
        );
    }

    #[test]
    fn test_root_type_check() {
        let asset = Tags::of(&[(ROOT_TYPE_KEY, RootType::Asset.as_u64())]);
        let mixed = Tags::of(&[(ROOT_TYPE_KEY, RootType::Mixed.as_u64())]);

        RootTypePolicy
            .check(&asset, &TypeConstraint::Typed(RootType::Asset))
            .unwrap();
        RootTypePolicy
            .check(&mixed, &TypeConstraint::Typed(RootType::App))
            .unwrap();
        assert!(matches!(
            RootTypePolicy.check(&asset, &TypeConstraint::Typed(RootType::Address)),
            Err(RegistryError::TypeMismatch { .. })
        ));
        assert!(matches!(
            RootTypePolicy.check(&asset, &TypeConstraint::listed(1, 1)),
            Err(RegistryError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_root_type_is_malformed() {
        let tags = Tags::of(&[(ROOT_TYPE_KEY, 9)]);
        assert_eq!(
            RootTypePolicy.check(&tags, &TypeConstraint::Typed(RootType::Asset)),
            Err(RegistryError::MalformedTag(TagError::UnknownRootType(9)))
        );
    }

    #[test]
    fn test_mixed_root_type_may_be_seeded() {
        assert_eq!(
            RootTypePolicy.seed(&RootTags::Typed(RootType::Mixed)).unwrap(),
            vec![(ROOT_TYPE_KEY, 0)]
        );
    }

    #[test]
    fn test_reserved_keys() {
        assert!(policy_for(TagScheme::ListTags).is_reserved(LIST_TYPE_KEY));
        assert!(!policy_for(TagScheme::ListTags).is_reserved(ROOT_TYPE_KEY));
        assert!(policy_for(TagScheme::RootType).is_reserved(ROOT_TYPE_KEY));
        assert!(!policy_for(TagScheme::RootType).is_reserved("royalty"));
    }
}
