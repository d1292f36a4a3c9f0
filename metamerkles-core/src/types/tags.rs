//! Semantic tags recorded alongside a root.
//!
//! Tags let a verifier confirm that a root was published for the purpose it
//! is being used for. Without them, a proof against an unrelated dataset of
//! the same publisher (say a trait list) could be passed off where a
//! royalty list was expected.

use serde::{Deserialize, Serialize};

use crate::error::TagError;

/// Encode a tag as 8 big-endian bytes, the stored form of every tag.
#[inline]
pub fn encode_tag(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Decode a stored tag.
pub fn decode_tag(bytes: &[u8]) -> Result<u64, TagError> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| TagError::BadLength { len: bytes.len() })?;
    Ok(u64::from_be_bytes(raw))
}

/// Byte-level shape of the leaves in a dataset.
///
/// Values beyond the named constants are publisher-defined and accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaType(pub u64);

impl SchemaType {
    /// Verifier does not care. Never recorded.
    pub const UNSPECIFIED: SchemaType = SchemaType(0);
    /// Leaves are byte strings, e.g. 32-byte addresses.
    pub const STRING: SchemaType = SchemaType(1);
    /// Leaves are 8-byte big-endian integers such as asset or app ids.
    pub const UINT64: SchemaType = SchemaType(2);
    /// Leaves are two 8-byte big-endian integers: an id, then an amount.
    pub const DOUBLE_UINT64: SchemaType = SchemaType(3);

    /// Whether this is the "don't care" value.
    pub fn is_unspecified(self) -> bool {
        self == Self::UNSPECIFIED
    }
}

/// Intended purpose of a list.
///
/// Values beyond the named constants are publisher-defined and accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListType(pub u64);

impl ListType {
    /// Verifier does not care. Never recorded.
    pub const UNSPECIFIED: ListType = ListType(0);
    /// All asset ids of a collection.
    pub const COLLECTION: ListType = ListType(1);
    /// Asset ids sharing a trait.
    pub const TRAIT: ListType = ListType(2);
    /// Assets offered in a merkle-based swap.
    pub const TRADE: ListType = ListType(3);

    /// Whether this is the "don't care" value.
    pub fn is_unspecified(self) -> bool {
        self == Self::UNSPECIFIED
    }
}

/// Closed set of root kinds used by the typed verification entrypoints.
#[repr(u64)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RootType {
    /// Leaves may be of any kind.
    Mixed = 0,
    /// Leaves are asset ids (8-byte big-endian).
    Asset = 1,
    /// Leaves are 32-byte addresses.
    Address = 2,
    /// Leaves are application ids (8-byte big-endian).
    App = 3,
}

impl RootType {
    /// Numeric form stored in the reserved tag entry.
    pub fn as_u64(self) -> u64 {
        self as u64
    }

    /// Whether a root recorded as `self` may serve a lookup of kind `wanted`.
    ///
    /// A `Mixed` root satisfies every kind.
    pub fn admits(self, wanted: RootType) -> bool {
        self == RootType::Mixed || self == wanted
    }
}

impl TryFrom<u64> for RootType {
    type Error = TagError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RootType::Mixed),
            1 => Ok(RootType::Asset),
            2 => Ok(RootType::Address),
            3 => Ok(RootType::App),
            other => Err(TagError::UnknownRootType(other)),
        }
    }
}

/// Tags a publisher records when adding a root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RootTags {
    /// Open schema + list-type scheme.
    Listed {
        /// Leaf shape.
        schema: SchemaType,
        /// Purpose of the list.
        list_type: ListType,
    },
    /// Closed root-type scheme.
    Typed(RootType),
}

/// What a verifier requires of a root's recorded tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeConstraint {
    /// Accept whatever was recorded.
    Unconstrained,
    /// Compare against schema + list-type tags. `UNSPECIFIED` skips a check.
    Listed {
        /// Expected leaf shape.
        schema: SchemaType,
        /// Expected purpose.
        list_type: ListType,
    },
    /// Require the recorded root type to admit this kind.
    Typed(RootType),
}

impl TypeConstraint {
    /// Constraint from raw numeric expectations, `0` meaning "don't care".
    pub fn listed(schema: u64, list_type: u64) -> Self {
        TypeConstraint::Listed {
            schema: SchemaType(schema),
            list_type: ListType(list_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_encoding_is_big_endian() {
        assert_eq!(encode_tag(1), [0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(decode_tag(&encode_tag(0x0102_0304)).unwrap(), 0x0102_0304);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        assert_eq!(decode_tag(&[1, 2, 3]), Err(TagError::BadLength { len: 3 }));
        assert_eq!(decode_tag(&[0u8; 9]), Err(TagError::BadLength { len: 9 }));
    }

    #[test]
    fn test_root_type_conversion() {
        for ty in [RootType::Mixed, RootType::Asset, RootType::Address, RootType::App] {
            assert_eq!(RootType::try_from(ty.as_u64()).unwrap(), ty);
        }
        assert_eq!(RootType::try_from(4), Err(TagError::UnknownRootType(4)));
    }

    #[test]
    fn test_mixed_admits_everything() {
        assert!(RootType::Mixed.admits(RootType::Asset));
        assert!(RootType::Mixed.admits(RootType::App));
        assert!(RootType::Asset.admits(RootType::Asset));
        assert!(!RootType::Asset.admits(RootType::Address));
    }

    #[test]
    fn test_unspecified_flags() {
        assert!(SchemaType::UNSPECIFIED.is_unspecified());
        assert!(!SchemaType::STRING.is_unspecified());
        assert!(ListType(0).is_unspecified());
        assert!(!ListType::TRADE.is_unspecified());
    }
}
