//! Registry data types.
//!
//! - [`PublisherId`]: 32-byte identity that owns roots and metadata
//! - [`SchemaType`], [`ListType`], [`RootType`]: semantic tags recorded with a root
//! - [`RootTags`] / [`TypeConstraint`]: what a publisher records, what a verifier expects
//! - [`Payment`]: value transfer attached to funded operations

mod identity;
mod payment;
mod tags;

pub use identity::PublisherId;
pub use payment::Payment;
pub use tags::{
    decode_tag, encode_tag, ListType, RootTags, RootType, SchemaType, TypeConstraint,
};

/// A 32-byte SHA-256 digest, used for roots and leaf hashes.
pub type Hash = [u8; 32];
