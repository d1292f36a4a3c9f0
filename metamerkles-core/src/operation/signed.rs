//! Signed operation wrapper.

use serde::{Deserialize, Serialize};

use crate::crypto::{sha256, sign, verify, KeyPair, PublicKey, Signature};
use crate::error::CoreError;
use crate::serialization::serialize;
use crate::types::PublisherId;

use super::Operation;

/// Domain separator prepended to the operation bytes before signing, so a
/// registry signature can never be replayed as a signature over some other
/// protocol's message.
const SIGNING_DOMAIN: &[u8] = b"metamerkles/operation/v1";

/// An operation together with the publisher's signature over it.
///
/// The signature also covers `sequence`, the publisher's operation counter.
/// A registry accepts only the next sequence number of each publisher, so a
/// captured operation cannot be submitted twice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOperation {
    /// The operation payload.
    pub op: Operation,

    /// Position of this operation in the publisher's sequence, from 0.
    pub sequence: u64,

    /// The public key of the signer, which is the acting publisher.
    pub signer: PublicKey,

    /// Ed25519 signature over `SIGNING_DOMAIN || sequence (BE) || serialize(op)`.
    pub signature: Signature,
}

impl SignedOperation {
    /// Sign `op` as operation number `sequence` of the key holder.
    pub fn sign(op: Operation, sequence: u64, keys: &KeyPair) -> Result<Self, CoreError> {
        let message = signing_bytes(&op, sequence)?;
        let signature = sign(keys.signing_key(), &message);
        Ok(Self {
            op,
            sequence,
            signer: keys.public_key(),
            signature,
        })
    }

    /// Identity of the signer.
    pub fn publisher(&self) -> PublisherId {
        self.signer.id()
    }

    /// Check the signature against the embedded signer.
    pub fn verify_signature(&self) -> Result<(), CoreError> {
        let message = signing_bytes(&self.op, self.sequence)?;
        verify(&self.signer, &message, &self.signature)?;
        Ok(())
    }

    /// Operation id: SHA-256 of the serialized signed operation.
    pub fn id(&self) -> Result<[u8; 32], CoreError> {
        Ok(sha256(&serialize(self)?))
    }
}

fn signing_bytes(op: &Operation, sequence: u64) -> Result<Vec<u8>, CoreError> {
    let body = serialize(op)?;
    let mut message = Vec::with_capacity(SIGNING_DOMAIN.len() + 8 + body.len());
    message.extend_from_slice(SIGNING_DOMAIN);
    message.extend_from_slice(&sequence.to_be_bytes());
    message.extend_from_slice(&body);
    Ok(message)
}
