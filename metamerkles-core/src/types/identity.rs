//! Publisher identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a publisher, or of the registry escrow account.
///
/// For publishers this is the raw Ed25519 verifying key; the escrow is any
/// fixed 32-byte value and need not be a valid curve point.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct PublisherId(pub [u8; 32]);

impl PublisherId {
    /// Borrow the raw bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> Option<Self> {
        hex::decode(s).ok()?.try_into().ok().map(PublisherId)
    }

    /// Full hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; 32]> for PublisherId {
    fn from(bytes: [u8; 32]) -> Self {
        PublisherId(bytes)
    }
}

impl fmt::Display for PublisherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..4]))
    }
}

impl fmt::Debug for PublisherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublisherId({})", hex::encode(&self.0[..4]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let id = PublisherId([0xAB; 32]);
        assert_eq!(PublisherId::from_hex(&id.to_hex()), Some(id));
        assert_eq!(PublisherId::from_hex("abcd"), None);
        assert_eq!(PublisherId::from_hex("not hex"), None);
    }

    #[test]
    fn test_display_is_short() {
        let id = PublisherId([0x12; 32]);
        assert_eq!(id.to_string(), "12121212");
    }
}
