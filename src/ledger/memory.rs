use super::{Ledger, LedgerStore};
use crate::entities::{AccountId, BankAccount};
use crate::error::StoreError;
use rust_decimal::Decimal;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// In-process ledger.
///
/// Writes are staged per transaction and applied together on commit, so a
/// failed unit of work leaves no trace. Reads are NOT isolated: two
/// transactions on the same account interleave freely unless the caller
/// serializes them (the account service does, via `AccountLocks`).
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    accounts: Arc<RwLock<HashMap<AccountId, BankAccount>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        MemoryLedger::default()
    }

    /// Insert or replace an account
    pub fn insert(&self, account: BankAccount) {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        accounts.insert(account.id, account);
    }

    pub fn balance(&self, id: AccountId) -> Option<Decimal> {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        accounts.get(&id).map(|account| account.balance)
    }

    /// Sum of all balances
    pub fn total_balance(&self) -> Decimal {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        accounts.values().map(|account| account.balance).sum()
    }
}

struct MemoryTx<'a> {
    accounts: &'a RwLock<HashMap<AccountId, BankAccount>>,
    staged: RefCell<HashMap<AccountId, Decimal>>,
}

impl Ledger for MemoryTx<'_> {
    fn read_balance(&self, id: AccountId) -> Result<BankAccount, StoreError> {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        let mut account = accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::account_not_found(id))?;

        if let Some(balance) = self.staged.borrow().get(&id) {
            account.balance = *balance;
        }
        Ok(account)
    }

    fn write_balance(&self, id: AccountId, balance: Decimal) -> Result<(), StoreError> {
        let exists = self
            .accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id);
        if !exists {
            return Err(StoreError::account_not_found(id));
        }

        self.staged.borrow_mut().insert(id, balance);
        Ok(())
    }
}

impl LedgerStore for MemoryLedger {
    fn with_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn Ledger) -> Result<T, E>,
        E: From<StoreError>,
    {
        let tx = MemoryTx {
            accounts: &self.accounts,
            staged: RefCell::new(HashMap::new()),
        };

        let value = work(&tx)?;

        // Commit
        let staged = tx.staged.into_inner();
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        for (id, balance) in staged {
            if let Some(account) = accounts.get_mut(&id) {
                account.balance = balance;
            }
        }

        Ok(value)
    }

    fn delete_account(&self, id: AccountId) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        accounts
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::account_not_found(id))
    }
}
