//! Deterministic binary serialization.
//!
//! Signed operations are encoded with bincode under a fixed configuration so
//! that a signature produced by one client verifies on every host.

mod bincode_config;

pub use bincode_config::{deserialize, serialize, DECODE_LIMIT};
