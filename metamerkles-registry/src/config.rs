//! Registry configuration.

use serde::{Deserialize, Serialize};

use metamerkles_core::merkle::MAX_PROOF_SIBLINGS;
use metamerkles_core::PublisherId;
use metamerkles_storage::{DEFAULT_PREFIX_LEN, MAX_BOX_VALUE_LEN};

use crate::cost::StorageCostModel;
use crate::error::{RegistryError, RegistryResult};

/// Longest metadata key, in bytes.
pub const DEFAULT_MAX_KEY_LEN: usize = 32;

/// Longest metadata value, in bytes.
pub const DEFAULT_MAX_VALUE_LEN: usize = MAX_BOX_VALUE_LEN;

/// Which reserved tags describe a root's type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagScheme {
    /// Open `list.schema` + `list.type` tags.
    #[default]
    ListTags,
    /// Closed `root.type` enum with typed verify entrypoints.
    RootType,
}

/// Parameters a registry runs with.
///
/// One scheme applies to seeding, funding, deletion and verification alike.
/// The scheme, prefix length, fees and escrow are recorded in the store the
/// first time a registry opens it, and every later open must match them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Storage fee schedule.
    pub fees: StorageCostModel,
    /// Bytes of publisher id and root kept in metadata keys.
    pub prefix_len: usize,
    /// Longest metadata key.
    pub max_key_len: usize,
    /// Longest metadata value.
    pub max_value_len: usize,
    /// Deepest proof accepted.
    pub max_proof_siblings: usize,
    /// Type tag scheme.
    pub scheme: TagScheme,
    /// Remove all metadata of a root when the root is deleted.
    pub cascade_metadata: bool,
    /// Account that receives payments and issues refunds.
    pub escrow: PublisherId,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            fees: StorageCostModel::default(),
            prefix_len: DEFAULT_PREFIX_LEN,
            max_key_len: DEFAULT_MAX_KEY_LEN,
            max_value_len: DEFAULT_MAX_VALUE_LEN,
            max_proof_siblings: MAX_PROOF_SIBLINGS,
            scheme: TagScheme::default(),
            cascade_metadata: false,
            escrow: PublisherId::default(),
        }
    }
}

impl RegistryConfig {
    /// Set the fee schedule.
    pub fn with_fees(mut self, fees: StorageCostModel) -> Self {
        self.fees = fees;
        self
    }

    /// Set the metadata key prefix length. Checked when the registry opens.
    pub fn with_prefix_len(mut self, prefix_len: usize) -> Self {
        self.prefix_len = prefix_len;
        self
    }

    /// Set the tag scheme.
    pub fn with_scheme(mut self, scheme: TagScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Enable or disable metadata cascade on root deletion.
    pub fn with_cascade_metadata(mut self, cascade: bool) -> Self {
        self.cascade_metadata = cascade;
        self
    }

    /// Set the escrow account.
    pub fn with_escrow(mut self, escrow: PublisherId) -> Self {
        self.escrow = escrow;
        self
    }

    /// Set the proof depth limit.
    pub fn with_max_proof_siblings(mut self, max: usize) -> Self {
        self.max_proof_siblings = max;
        self
    }
}

/// Layout version of [`StoredSettings`].
const SETTINGS_VERSION: u8 = 1;

/// Encoded length: version, scheme, prefix length, two fees, escrow.
const SETTINGS_LEN: usize = 3 + 8 + 8 + 32;

/// The part of a [`RegistryConfig`] that is fixed for the life of a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct StoredSettings {
    scheme: TagScheme,
    prefix_len: u8,
    fees: StorageCostModel,
    escrow: PublisherId,
}

impl StoredSettings {
    pub(crate) fn from_config(config: &RegistryConfig) -> RegistryResult<Self> {
        let prefix_len = u8::try_from(config.prefix_len).map_err(|_| {
            RegistryError::Storage(format!("prefix length {} out of range", config.prefix_len))
        })?;
        Ok(Self {
            scheme: config.scheme,
            prefix_len,
            fees: config.fees,
            escrow: config.escrow,
        })
    }

    pub(crate) fn to_bytes(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SETTINGS_LEN);
        out.push(SETTINGS_VERSION);
        out.push(match self.scheme {
            TagScheme::ListTags => 0,
            TagScheme::RootType => 1,
        });
        out.push(self.prefix_len);
        out.extend_from_slice(&self.fees.base.to_be_bytes());
        out.extend_from_slice(&self.fees.per_byte.to_be_bytes());
        out.extend_from_slice(self.escrow.as_bytes());
        out
    }

    pub(crate) fn from_bytes(bytes: &[u8]) -> RegistryResult<Self> {
        let malformed = || RegistryError::Storage("malformed stored settings".into());
        if bytes.len() != SETTINGS_LEN || bytes[0] != SETTINGS_VERSION {
            return Err(malformed());
        }
        let scheme = match bytes[1] {
            0 => TagScheme::ListTags,
            1 => TagScheme::RootType,
            _ => return Err(malformed()),
        };
        let word = |at: usize| -> RegistryResult<u64> {
            let raw: [u8; 8] = bytes[at..at + 8].try_into().map_err(|_| malformed())?;
            Ok(u64::from_be_bytes(raw))
        };
        let escrow: [u8; 32] = bytes[19..].try_into().map_err(|_| malformed())?;
        Ok(Self {
            scheme,
            prefix_len: bytes[2],
            fees: StorageCostModel::new(word(3)?, word(11)?),
            escrow: PublisherId(escrow),
        })
    }

    /// Require `self` (the requested settings) to equal `stored`.
    pub(crate) fn check(&self, stored: &StoredSettings) -> RegistryResult<()> {
        let field = if self.scheme != stored.scheme {
            "scheme"
        } else if self.prefix_len != stored.prefix_len {
            "prefix_len"
        } else if self.fees != stored.fees {
            "fees"
        } else if self.escrow != stored.escrow {
            "escrow"
        } else {
            return Ok(());
        };
        Err(RegistryError::SettingsMismatch { field })
    }
}
