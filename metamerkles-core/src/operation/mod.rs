//! Registry operations.
//!
//! Every mutation of the registry is an [`Operation`] signed by the
//! publisher that owns the affected entries.

mod signed;
mod types;

pub use signed::SignedOperation;
pub use types::Operation;
