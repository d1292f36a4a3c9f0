//! Funds movement for storage payments and refunds.
//!
//! The registry only needs two things from the host's value-transfer
//! mechanism: the balance of an account, and a transfer between two
//! accounts that either fully happens or fails.

mod kv;
mod memory;

pub use kv::KvLedger;
pub use memory::MemoryLedger;

use metamerkles_core::PublisherId;
use thiserror::Error;

/// Errors raised by a [`Ledger`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Sender cannot cover the transfer.
    #[error("insufficient balance in {account}: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Debited account.
        account: PublisherId,
        /// Its balance.
        available: u64,
        /// Transfer amount.
        requested: u64,
    },
    /// Recipient balance would overflow.
    #[error("balance overflow in {account}")]
    Overflow {
        /// Credited account.
        account: PublisherId,
    },
    /// Stored balance could not be read or written.
    #[error("ledger storage: {0}")]
    Storage(String),
}

/// Account balances.
pub trait Ledger {
    /// Current balance of `account`; zero if never credited.
    fn balance(&self, account: &PublisherId) -> Result<u64, LedgerError>;

    /// Move `amount` from `from` to `to`. Nothing changes on error.
    fn transfer(&mut self, from: &PublisherId, to: &PublisherId, amount: u64) -> Result<(), LedgerError>;

    /// Create `amount` out of thin air in `account`. Used to fund devnet and
    /// test accounts.
    fn mint(&mut self, account: &PublisherId, amount: u64) -> Result<(), LedgerError>;
}

/// Debit and credit two balances, returning the new pair.
pub(crate) fn apply_transfer(
    from: &PublisherId,
    from_balance: u64,
    to: &PublisherId,
    to_balance: u64,
    amount: u64,
) -> Result<(u64, u64), LedgerError> {
    let debited = from_balance
        .checked_sub(amount)
        .ok_or(LedgerError::InsufficientBalance {
            account: *from,
            available: from_balance,
            requested: amount,
        })?;
    if from == to {
        return Ok((from_balance, from_balance));
    }
    let credited = to_balance
        .checked_add(amount)
        .ok_or(LedgerError::Overflow { account: *to })?;
    Ok((debited, credited))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn check_ledger<L: Ledger>(mut ledger: L) {
        let alice = PublisherId([1; 32]);
        let bob = PublisherId([2; 32]);

        assert_eq!(ledger.balance(&alice).unwrap(), 0);
        ledger.mint(&alice, 100).unwrap();
        ledger.transfer(&alice, &bob, 30).unwrap();
        assert_eq!(ledger.balance(&alice).unwrap(), 70);
        assert_eq!(ledger.balance(&bob).unwrap(), 30);

        let err = ledger.transfer(&bob, &alice, 31).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                account: bob,
                available: 30,
                requested: 31
            }
        );
        assert_eq!(ledger.balance(&bob).unwrap(), 30);

        ledger.transfer(&alice, &alice, 70).unwrap();
        assert_eq!(ledger.balance(&alice).unwrap(), 70);
    }

    #[test]
    fn test_self_transfer_still_requires_balance() {
        let id = PublisherId([5; 32]);
        assert!(apply_transfer(&id, 1, &id, 1, 2).is_err());
        assert_eq!(apply_transfer(&id, 5, &id, 5, 2).unwrap(), (5, 5));
    }

    #[test]
    fn test_credit_overflow() {
        let a = PublisherId([1; 32]);
        let b = PublisherId([2; 32]);
        assert_eq!(
            apply_transfer(&a, 10, &b, u64::MAX, 1),
            Err(LedgerError::Overflow { account: b })
        );
    }
}
