//! Deterministic bincode configuration.
//!
//! Uses fixed-size integer encoding and little-endian byte order
//! for consistent cross-platform serialization.

use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::SerializationError;

/// Upper bound on the length of any decoded message. A signed `AddData`
/// carrying a maximal value stays well below this.
pub const DECODE_LIMIT: usize = 16 * 1024;

/// Configuration:
/// - Fixed-size integer encoding (not variable-length)
/// - Little-endian byte order
/// - Reject trailing bytes on deserialization
fn config() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

/// Serialize a value to bytes using deterministic configuration.
pub fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    config()
        .serialize(value)
        .map_err(|e| SerializationError::EncodeFailed(e.to_string()))
}

/// Deserialize a value from bytes.
///
/// Fails on malformed input, trailing bytes, or input longer than
/// [`DECODE_LIMIT`].
pub fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    if bytes.len() > DECODE_LIMIT {
        return Err(SerializationError::DecodeFailed(format!(
            "input of {} bytes exceeds limit of {}",
            bytes.len(),
            DECODE_LIMIT
        )));
    }
    config()
        .deserialize(bytes)
        .map_err(|e| SerializationError::DecodeFailed(e.to_string()))
}
