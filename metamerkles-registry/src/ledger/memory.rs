//! In-memory ledger.

use std::collections::HashMap;

use metamerkles_core::PublisherId;

use super::{apply_transfer, Ledger, LedgerError};

/// Balances held in a HashMap. Used in tests and embedded setups.
#[derive(Clone, Debug, Default)]
pub struct MemoryLedger {
    balances: HashMap<PublisherId, u64>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger with initial balances.
    pub fn with_balances<I: IntoIterator<Item = (PublisherId, u64)>>(balances: I) -> Self {
        Self {
            balances: balances.into_iter().collect(),
        }
    }
}

impl Ledger for MemoryLedger {
    fn balance(&self, account: &PublisherId) -> Result<u64, LedgerError> {
        Ok(self.balances.get(account).copied().unwrap_or(0))
    }

    fn transfer(&mut self, from: &PublisherId, to: &PublisherId, amount: u64) -> Result<(), LedgerError> {
        let (debited, credited) =
            apply_transfer(from, self.balance(from)?, to, self.balance(to)?, amount)?;
        self.balances.insert(*from, debited);
        self.balances.insert(*to, credited);
        Ok(())
    }

    fn mint(&mut self, account: &PublisherId, amount: u64) -> Result<(), LedgerError> {
        let balance = self.balances.entry(*account).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { account: *account })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::check_ledger;

    #[test]
    fn test_memory_ledger() {
        check_ledger(MemoryLedger::new());
    }

    #[test]
    fn test_with_balances() {
        let id = PublisherId([3; 32]);
        let ledger = MemoryLedger::with_balances([(id, 42)]);
        assert_eq!(ledger.balance(&id).unwrap(), 42);
    }
}
