//! Key schema encoding for storage.
//!
//! Roots, metadata, ledger balances and registry bookkeeping share one
//! substrate, so every key
//! starts with a one-byte namespace tag. Root keys carry the full
//! (publisher, root) pair. Metadata keys carry only a prefix of each so the
//! composite stays short; two publishers (or roots) sharing that prefix
//! address the same metadata slots.

use metamerkles_core::{Hash, PublisherId};

use crate::error::StorageError;

/// Width of a publisher id or root hash.
pub const ID_LEN: usize = 32;

/// Default truncated prefix length for metadata keys.
pub const DEFAULT_PREFIX_LEN: usize = 16;

/// Key prefixes for the storage namespaces.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyPrefix {
    /// Root entry: `0x01 || publisher || root`
    Root = 0x01,
    /// Metadata entry: `0x02 || prefix(publisher) || prefix(root) || key`
    Data = 0x02,
    /// Ledger balance: `0x03 || account`
    Balance = 0x03,
    /// Next operation sequence number of a publisher: `0x04 || publisher`
    Sequence = 0x04,
    /// Settings a database was created with: `0x05`
    Settings = 0x05,
}

/// Key of a published root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RootKey {
    /// Owning publisher.
    pub publisher: PublisherId,
    /// Committed root hash.
    pub root: Hash,
}

impl RootKey {
    /// Length counted by the storage fee schedule.
    pub fn logical_len(&self) -> usize {
        2 * ID_LEN
    }

    /// Convert to bytes for storage.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(1 + 2 * ID_LEN);
        key.push(KeyPrefix::Root as u8);
        key.extend_from_slice(self.publisher.as_bytes());
        key.extend_from_slice(&self.root);
        key
    }
}

/// Composite key of a metadata entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DataKey {
    /// Truncated publisher id.
    pub publisher_prefix: Vec<u8>,
    /// Truncated root hash.
    pub root_prefix: Vec<u8>,
    /// Metadata key as raw bytes.
    pub key: Vec<u8>,
}

impl DataKey {
    /// Length counted by the storage fee schedule: both prefixes plus the key.
    pub fn logical_len(&self) -> usize {
        self.publisher_prefix.len() + self.root_prefix.len() + self.key.len()
    }

    /// The metadata key as text, if it is valid UTF-8.
    pub fn key_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.key).ok()
    }

    /// Convert to bytes for storage.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.logical_len());
        out.push(KeyPrefix::Data as u8);
        out.extend_from_slice(&self.publisher_prefix);
        out.extend_from_slice(&self.root_prefix);
        out.extend_from_slice(&self.key);
        out
    }
}

/// Any key stored by the registry, decoded.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// A root entry.
    Root(RootKey),
    /// A metadata entry.
    Data(DataKey),
    /// A ledger balance.
    Balance(PublisherId),
    /// A publisher's operation sequence number.
    Sequence(PublisherId),
    /// The stored registry settings.
    Settings,
}

/// Derives storage keys with a fixed truncation length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyCodec {
    prefix_len: usize,
}

impl Default for KeyCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyCodec {
    /// Codec with the default 16-byte prefixes.
    pub const fn new() -> Self {
        Self {
            prefix_len: DEFAULT_PREFIX_LEN,
        }
    }

    /// Codec with a custom prefix length in `1..=32`. 32 disables truncation.
    pub fn with_prefix_len(prefix_len: usize) -> Result<Self, StorageError> {
        if prefix_len == 0 || prefix_len > ID_LEN {
            return Err(StorageError::InvalidKey(format!(
                "prefix length {} outside 1..={}",
                prefix_len, ID_LEN
            )));
        }
        Ok(Self { prefix_len })
    }

    /// Configured prefix length.
    pub fn prefix_len(&self) -> usize {
        self.prefix_len
    }

    /// Key of a root entry. Never truncated.
    pub fn root_key(&self, publisher: &PublisherId, root: &Hash) -> RootKey {
        RootKey {
            publisher: *publisher,
            root: *root,
        }
    }

    /// Composite key of a metadata entry.
    pub fn derive_metadata_key(&self, publisher: &PublisherId, root: &Hash, key: &str) -> DataKey {
        DataKey {
            publisher_prefix: publisher.as_bytes()[..self.prefix_len].to_vec(),
            root_prefix: root[..self.prefix_len].to_vec(),
            key: key.as_bytes().to_vec(),
        }
    }

    /// Byte prefix shared by every metadata entry of (publisher, root).
    pub fn data_namespace(&self, publisher: &PublisherId, root: &Hash) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + 2 * self.prefix_len);
        out.push(KeyPrefix::Data as u8);
        out.extend_from_slice(&publisher.as_bytes()[..self.prefix_len]);
        out.extend_from_slice(&root[..self.prefix_len]);
        out
    }

    /// Key of a ledger balance.
    pub fn balance_key(&self, account: &PublisherId) -> Vec<u8> {
        let mut key = Vec::with_capacity(1 + ID_LEN);
        key.push(KeyPrefix::Balance as u8);
        key.extend_from_slice(account.as_bytes());
        key
    }

    /// Key of a publisher's next operation sequence number.
    pub fn sequence_key(&self, publisher: &PublisherId) -> Vec<u8> {
        let mut key = Vec::with_capacity(1 + ID_LEN);
        key.push(KeyPrefix::Sequence as u8);
        key.extend_from_slice(publisher.as_bytes());
        key
    }

    /// Key of the stored registry settings.
    pub fn settings_key(&self) -> Vec<u8> {
        vec![KeyPrefix::Settings as u8]
    }

    /// Parse a stored key. Metadata keys are split using this codec's
    /// prefix length.
    pub fn decode(&self, bytes: &[u8]) -> Option<StorageKey> {
        let (&prefix, data) = bytes.split_first()?;

        match prefix {
            x if x == KeyPrefix::Root as u8 => {
                if data.len() != 2 * ID_LEN {
                    return None;
                }
                let mut publisher = [0u8; ID_LEN];
                let mut root = [0u8; ID_LEN];
                publisher.copy_from_slice(&data[..ID_LEN]);
                root.copy_from_slice(&data[ID_LEN..]);
                Some(StorageKey::Root(RootKey {
                    publisher: PublisherId(publisher),
                    root,
                }))
            }
            x if x == KeyPrefix::Data as u8 => {
                let n = self.prefix_len;
                if data.len() < 2 * n {
                    return None;
                }
                Some(StorageKey::Data(DataKey {
                    publisher_prefix: data[..n].to_vec(),
                    root_prefix: data[n..2 * n].to_vec(),
                    key: data[2 * n..].to_vec(),
                }))
            }
            x if x == KeyPrefix::Balance as u8 => {
                let account: [u8; ID_LEN] = data.try_into().ok()?;
                Some(StorageKey::Balance(PublisherId(account)))
            }
            x if x == KeyPrefix::Sequence as u8 => {
                let publisher: [u8; ID_LEN] = data.try_into().ok()?;
                Some(StorageKey::Sequence(PublisherId(publisher)))
            }
            x if x == KeyPrefix::Settings as u8 && data.is_empty() => Some(StorageKey::Settings),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publisher() -> PublisherId {
        let mut bytes = [0u8; 32];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        PublisherId(bytes)
    }

    #[test]
    fn test_metadata_key_truncates_to_sixteen_bytes() {
        let codec = KeyCodec::new();
        let root = [0xAB; 32];
        let key = codec.derive_metadata_key(&publisher(), &root, "royalty");

        assert_eq!(key.publisher_prefix, (0u8..16).collect::<Vec<_>>());
        assert_eq!(key.root_prefix, vec![0xAB; 16]);
        assert_eq!(key.key, b"royalty");
        assert_eq!(key.logical_len(), 32 + 7);
        assert_eq!(key.key_str(), Some("royalty"));
    }

    #[test]
    fn test_prefix_collision_is_shared_slot() {
        let codec = KeyCodec::new();
        let mut other = publisher();
        other.0[31] ^= 0xFF;
        let root = [7u8; 32];

        assert_eq!(
            codec.derive_metadata_key(&publisher(), &root, "k"),
            codec.derive_metadata_key(&other, &root, "k")
        );
        assert_ne!(codec.root_key(&publisher(), &root), codec.root_key(&other, &root));
    }

    #[test]
    fn test_full_width_prefix_disables_truncation() {
        let codec = KeyCodec::with_prefix_len(32).unwrap();
        let mut other = publisher();
        other.0[31] ^= 0xFF;
        let root = [7u8; 32];

        assert_ne!(
            codec.derive_metadata_key(&publisher(), &root, "k"),
            codec.derive_metadata_key(&other, &root, "k")
        );
    }

    #[test]
    fn test_prefix_len_bounds() {
        assert!(KeyCodec::with_prefix_len(0).is_err());
        assert!(KeyCodec::with_prefix_len(33).is_err());
        assert_eq!(KeyCodec::with_prefix_len(8).unwrap().prefix_len(), 8);
    }

    #[test]
    fn test_root_key_layout() {
        let codec = KeyCodec::new();
        let key = codec.root_key(&publisher(), &[9u8; 32]);
        let bytes = key.to_bytes();

        assert_eq!(bytes.len(), 65);
        assert_eq!(bytes[0], KeyPrefix::Root as u8);
        assert_eq!(key.logical_len(), 64);
        assert_eq!(codec.decode(&bytes), Some(StorageKey::Root(key)));
    }

    #[test]
    fn test_data_key_decodes_and_sits_under_namespace() {
        let codec = KeyCodec::new();
        let root = [3u8; 32];
        let key = codec.derive_metadata_key(&publisher(), &root, "list.type");
        let bytes = key.to_bytes();

        assert!(bytes.starts_with(&codec.data_namespace(&publisher(), &root)));
        assert_eq!(codec.decode(&bytes), Some(StorageKey::Data(key)));
    }

    #[test]
    fn test_balance_key_decodes() {
        let codec = KeyCodec::new();
        let bytes = codec.balance_key(&publisher());
        assert_eq!(codec.decode(&bytes), Some(StorageKey::Balance(publisher())));
    }

    #[test]
    fn test_bookkeeping_keys_decode() {
        let codec = KeyCodec::new();
        let bytes = codec.sequence_key(&publisher());
        assert_eq!(bytes.len(), 33);
        assert_eq!(codec.decode(&bytes), Some(StorageKey::Sequence(publisher())));
        assert_eq!(codec.decode(&codec.settings_key()), Some(StorageKey::Settings));
        assert_eq!(codec.decode(&[KeyPrefix::Settings as u8, 0]), None);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let codec = KeyCodec::new();
        assert_eq!(codec.decode(&[]), None);
        assert_eq!(codec.decode(&[0x01, 1, 2, 3]), None);
        assert_eq!(codec.decode(&[0x02; 10]), None);
        assert_eq!(codec.decode(&[0x7F; 40]), None);
    }

    #[test]
    fn test_key_prefixes_unique() {
        let prefixes = [
            KeyPrefix::Root,
            KeyPrefix::Data,
            KeyPrefix::Balance,
            KeyPrefix::Sequence,
            KeyPrefix::Settings,
        ];
        let values: Vec<u8> = prefixes.iter().map(|p| *p as u8).collect();
        let unique: std::collections::HashSet<u8> = values.iter().copied().collect();
        assert_eq!(values.len(), unique.len(), "Duplicate prefix values found");
    }
}
