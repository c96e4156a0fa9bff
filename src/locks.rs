// 🔒 Per-account lock table
//
// Every balance mutation runs while holding its account's lock, so two
// read-modify-write sequences on one account never interleave.
// Pairs are always locked lowest id first: two opposite transfers
// (A -> B and B -> A) then queue instead of deadlocking.

use crate::entities::AccountId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct AccountLocks {
    table: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
}

/// Claim on one table entry. Dropping the last claim removes the entry,
/// so the table only ever holds accounts with an operation in flight.
struct Claim<'a> {
    locks: &'a AccountLocks,
    id: AccountId,
    handle: Arc<Mutex<()>>,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        let mut table = self.locks.table.lock().unwrap_or_else(PoisonError::into_inner);
        let only_holder = table.get(&self.id).map_or(false, |entry| {
            Arc::ptr_eq(entry, &self.handle) && Arc::strong_count(&self.handle) == 2
        });
        if only_holder {
            table.remove(&self.id);
        }
    }
}

impl AccountLocks {
    pub fn new() -> Self {
        AccountLocks::default()
    }

    fn claim(&self, id: AccountId) -> Claim<'_> {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        let handle = Arc::clone(table.entry(id).or_default());
        Claim {
            locks: self,
            id,
            handle,
        }
    }

    /// Run `f` while holding the lock of one account
    pub fn with_account<T>(&self, id: AccountId, f: impl FnOnce() -> T) -> T {
        let claim = self.claim(id);
        // The mutex guards no data, so poisoning carries nothing to recover
        let _guard = claim.handle.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Run `f` while holding the locks of two accounts, acquired in
    /// ascending id order.
    pub fn with_accounts<T>(&self, a: AccountId, b: AccountId, f: impl FnOnce() -> T) -> T {
        if a == b {
            return self.with_account(a, f);
        }

        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let low = self.claim(low);
        let high = self.claim(high);

        let _low_guard = low.handle.lock().unwrap_or_else(PoisonError::into_inner);
        let _high_guard = high.handle.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Number of accounts with an operation in flight
    pub fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
