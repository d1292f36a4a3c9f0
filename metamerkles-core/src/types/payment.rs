//! Payment attached to funded operations.

use serde::{Deserialize, Serialize};

use super::PublisherId;

/// A value transfer a caller attaches to an operation that allocates
/// storage. The registry validates sender, receiver and amount before acting
/// on it; the transfer itself is carried out by the host ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Account the value is drawn from. Must be the caller.
    pub sender: PublisherId,
    /// Account receiving the value. Must be the registry escrow.
    pub receiver: PublisherId,
    /// Amount in the ledger's base unit.
    pub amount: u64,
}

impl Payment {
    /// Create a payment.
    pub fn new(sender: PublisherId, receiver: PublisherId, amount: u64) -> Self {
        Self {
            sender,
            receiver,
            amount,
        }
    }
}
