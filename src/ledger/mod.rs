// 📒 Ledger Store - persistence of account balances
//
// The account service only ever touches balances through these traits:
// - Ledger:      read / write one account's balance inside a unit of work
// - LedgerStore: opens units of work (all-or-nothing) and deletes accounts

pub mod memory;
pub mod sqlite;

use crate::entities::{AccountId, BankAccount};
use crate::error::StoreError;
use rust_decimal::Decimal;

pub use memory::MemoryLedger;
pub use sqlite::SqliteLedger;

/// Balance access scoped to one open transaction
pub trait Ledger {
    /// Fetch the account (balance and metadata). NotFound if absent.
    fn read_balance(&self, id: AccountId) -> Result<BankAccount, StoreError>;

    /// Overwrite the stored balance. NotFound if no such account.
    ///
    /// This is a blind write; callers must hold the account's lock for the
    /// whole read-modify-write sequence.
    fn write_balance(&self, id: AccountId, balance: Decimal) -> Result<(), StoreError>;
}

pub trait LedgerStore: Send + Sync {
    /// Run `work` inside a single transaction.
    ///
    /// Everything written through the `Ledger` is committed if `work` returns
    /// `Ok`, and discarded if it returns `Err`.
    fn with_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn Ledger) -> Result<T, E>,
        E: From<StoreError>;

    fn delete_account(&self, id: AccountId) -> Result<(), StoreError>;

    /// Read-only lookup outside of any mutation
    fn read_account(&self, id: AccountId) -> Result<BankAccount, StoreError> {
        self.with_transaction(|ledger| ledger.read_balance(id))
    }
}
