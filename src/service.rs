// 🏦 Account Mutation Service - Withdraw, Deposit, Transfer
//
// Each mutation is one read-modify-write inside a single ledger transaction,
// executed while holding the affected accounts' locks:
//
//   validate amount -> lock account(s) -> BEGIN -> read -> compute -> write -> COMMIT
//
// A transfer writes both legs in the same transaction, so either both the
// debit and the credit persist or neither does.

use crate::entities::{AccountId, Amount, BankAccount};
use crate::error::{BankError, BankResult};
use crate::ledger::LedgerStore;
use crate::locks::AccountLocks;
use rust_decimal::Decimal;
use serde::Serialize;

// ============================================================================
// OVERDRAFT POLICY
// ============================================================================

/// Whether a withdrawal may take a balance below zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverdraftPolicy {
    /// Reject debits that would leave a negative balance
    #[default]
    Forbid,

    /// Permit negative balances (no limit)
    Allow,
}

impl OverdraftPolicy {
    pub fn from_allow_flag(allow: bool) -> Self {
        if allow {
            OverdraftPolicy::Allow
        } else {
            OverdraftPolicy::Forbid
        }
    }

    /// New balance after taking `amount` out of `account`
    pub fn debit(&self, account: &BankAccount, amount: Amount) -> BankResult<Decimal> {
        let new_balance = account.balance.checked_sub(amount.value()).ok_or_else(|| {
            BankError::InvalidAmount(format!("withdrawing {} overflows the balance", amount))
        })?;

        if *self == OverdraftPolicy::Forbid && new_balance < Decimal::ZERO {
            return Err(BankError::InsufficientFunds {
                account_id: account.id,
                balance: account.balance,
                requested: amount.value(),
            });
        }

        Ok(new_balance)
    }
}

/// New balance after putting `amount` into `account`
pub fn credit(account: &BankAccount, amount: Amount) -> BankResult<Decimal> {
    account.balance.checked_add(amount.value()).ok_or_else(|| {
        BankError::InvalidAmount(format!("depositing {} overflows the balance", amount))
    })
}

// ============================================================================
// TRANSFER RECEIPT
// ============================================================================

/// Both accounts as they stand after a committed transfer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferReceipt {
    pub from: BankAccount,
    pub to: BankAccount,
}

// ============================================================================
// ACCOUNT SERVICE
// ============================================================================

pub struct AccountService<S> {
    store: S,
    locks: AccountLocks,
    policy: OverdraftPolicy,
}

impl<S: LedgerStore> AccountService<S> {
    pub fn new(store: S, policy: OverdraftPolicy) -> Self {
        AccountService {
            store,
            locks: AccountLocks::new(),
            policy,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get_bank_account(&self, id: AccountId) -> BankResult<BankAccount> {
        Ok(self.store.read_account(id)?)
    }

    /// Take `amount` out of an account; returns the updated account
    pub fn withdraw(&self, id: AccountId, amount: Decimal) -> BankResult<BankAccount> {
        let amount = Amount::new(amount)?;

        let account = self.locks.with_account(id, || {
            self.store.with_transaction(|ledger| {
                let account = ledger.read_balance(id)?;
                let balance = self.policy.debit(&account, amount)?;
                ledger.write_balance(id, balance)?;
                Ok::<_, BankError>(BankAccount { balance, ..account })
            })
        });

        match &account {
            Ok(account) => {
                tracing::info!(account_id = id, %amount, balance = %account.balance, "withdraw");
            }
            Err(err) => {
                tracing::warn!(account_id = id, %amount, error = %err, "withdraw rejected");
            }
        }
        account
    }

    /// Put `amount` into an account; returns the updated account
    pub fn deposit(&self, id: AccountId, amount: Decimal) -> BankResult<BankAccount> {
        let amount = Amount::new(amount)?;

        let account = self.locks.with_account(id, || {
            self.store.with_transaction(|ledger| {
                let account = ledger.read_balance(id)?;
                let balance = credit(&account, amount)?;
                ledger.write_balance(id, balance)?;
                Ok::<_, BankError>(BankAccount { balance, ..account })
            })
        });

        match &account {
            Ok(account) => {
                tracing::info!(account_id = id, %amount, balance = %account.balance, "deposit");
            }
            Err(err) => {
                tracing::warn!(account_id = id, %amount, error = %err, "deposit rejected");
            }
        }
        account
    }

    /// Move `amount` from one account to another, all-or-nothing.
    ///
    /// Both accounts are read before anything is written, so a missing
    /// destination fails the transfer without touching the source.
    pub fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> BankResult<TransferReceipt> {
        let amount = Amount::new(amount)?;
        if from == to {
            return Err(BankError::SameAccount(from));
        }

        let receipt = self.locks.with_accounts(from, to, || {
            self.store.with_transaction(|ledger| {
                let source = ledger.read_balance(from)?;
                let destination = ledger.read_balance(to)?;

                let debited = self.policy.debit(&source, amount)?;
                let credited = credit(&destination, amount)?;

                ledger.write_balance(from, debited)?;
                ledger
                    .write_balance(to, credited)
                    .map_err(|source| BankError::PartialTransfer { from, to, source })?;

                Ok::<_, BankError>(TransferReceipt {
                    from: BankAccount {
                        balance: debited,
                        ..source
                    },
                    to: BankAccount {
                        balance: credited,
                        ..destination
                    },
                })
            })
        });

        match &receipt {
            Ok(_) => tracing::info!(from, to, %amount, "transfer committed"),
            Err(err @ BankError::PartialTransfer { .. }) => {
                tracing::error!(from, to, %amount, error = %err, "transfer rolled back")
            }
            Err(err) => tracing::warn!(from, to, %amount, error = %err, "transfer rejected"),
        }
        receipt
    }

    /// Remove an account. Its balance is not checked.
    pub fn delete_bank_account(&self, id: AccountId) -> BankResult<()> {
        self.locks
            .with_account(id, || self.store.delete_account(id))?;

        tracing::info!(account_id = id, "bank account deleted");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::ledger::{Ledger, MemoryLedger};
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::thread;

    fn account(id: AccountId, balance: Decimal) -> BankAccount {
        BankAccount {
            id,
            user_id: 1,
            account_number: format!("{:010}", id),
            name: "Test Owner".to_string(),
            balance,
        }
    }

    fn create_test_service(balances: &[(AccountId, Decimal)]) -> AccountService<MemoryLedger> {
        let ledger = MemoryLedger::new();
        for (id, balance) in balances {
            ledger.insert(account(*id, *balance));
        }
        AccountService::new(ledger, OverdraftPolicy::Forbid)
    }

    /// Store whose writes to one account always fail
    struct FailingWrites {
        inner: MemoryLedger,
        fail_for: AccountId,
    }

    struct FailingTx<'a> {
        inner: &'a dyn Ledger,
        fail_for: AccountId,
    }

    impl Ledger for FailingTx<'_> {
        fn read_balance(&self, id: AccountId) -> Result<BankAccount, StoreError> {
            self.inner.read_balance(id)
        }

        fn write_balance(&self, id: AccountId, balance: Decimal) -> Result<(), StoreError> {
            if id == self.fail_for {
                return Err(StoreError::Unavailable("write failed".to_string()));
            }
            self.inner.write_balance(id, balance)
        }
    }

    impl LedgerStore for FailingWrites {
        fn with_transaction<T, E, F>(&self, work: F) -> Result<T, E>
        where
            F: FnOnce(&dyn Ledger) -> Result<T, E>,
            E: From<StoreError>,
        {
            self.inner.with_transaction(|ledger| {
                work(&FailingTx {
                    inner: ledger,
                    fail_for: self.fail_for,
                })
            })
        }

        fn delete_account(&self, id: AccountId) -> Result<(), StoreError> {
            self.inner.delete_account(id)
        }
    }

    #[test]
    fn test_withdraw_then_deposit() {
        let service = create_test_service(&[(1, dec!(100.00))]);

        let after_withdraw = service.withdraw(1, dec!(30.00)).unwrap();
        assert_eq!(after_withdraw.balance, dec!(70.00));

        let after_deposit = service.deposit(1, dec!(5.25)).unwrap();
        assert_eq!(after_deposit.balance, dec!(75.25));
        assert_eq!(service.store().balance(1), Some(dec!(75.25)));
    }

    #[test]
    fn test_transfer_moves_amount_and_preserves_sum() {
        let service = create_test_service(&[(1, dec!(70.00)), (2, dec!(0.00))]);
        let total_before = service.store().total_balance();

        let receipt = service.transfer(1, 2, dec!(50.00)).unwrap();

        assert_eq!(receipt.from.balance, dec!(20.00));
        assert_eq!(receipt.to.balance, dec!(50.00));
        assert_eq!(service.store().balance(1), Some(dec!(20.00)));
        assert_eq!(service.store().balance(2), Some(dec!(50.00)));
        assert_eq!(service.store().total_balance(), total_before);
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-10.00))]
    fn test_non_positive_amounts_are_rejected(#[case] amount: Decimal) {
        let service = create_test_service(&[(1, dec!(100.00)), (2, dec!(0))]);

        assert!(matches!(service.withdraw(1, amount), Err(BankError::InvalidAmount(_))));
        assert!(matches!(service.deposit(1, amount), Err(BankError::InvalidAmount(_))));
        assert!(matches!(
            service.transfer(1, 2, amount),
            Err(BankError::InvalidAmount(_))
        ));

        assert_eq!(service.store().balance(1), Some(dec!(100.00)));
        assert_eq!(service.store().balance(2), Some(dec!(0)));
    }

    #[test]
    fn test_missing_account_is_not_found() {
        let service = create_test_service(&[]);

        assert!(service.withdraw(9, dec!(1)).unwrap_err().is_not_found());
        assert!(service.deposit(9, dec!(1)).unwrap_err().is_not_found());
        assert!(service.get_bank_account(9).unwrap_err().is_not_found());
        assert!(service.delete_bank_account(9).unwrap_err().is_not_found());
    }

    #[test]
    fn test_forbid_policy_rejects_overdraft() {
        let service = create_test_service(&[(1, dec!(20.00)), (2, dec!(0))]);

        let err = service.withdraw(1, dec!(20.01)).unwrap_err();
        assert!(matches!(
            err,
            BankError::InsufficientFunds { account_id: 1, .. }
        ));

        let err = service.transfer(1, 2, dec!(50.00)).unwrap_err();
        assert!(matches!(err, BankError::InsufficientFunds { .. }));

        assert_eq!(service.store().balance(1), Some(dec!(20.00)));
        assert_eq!(service.store().balance(2), Some(dec!(0)));

        // Draining to exactly zero is fine
        assert_eq!(service.withdraw(1, dec!(20.00)).unwrap().balance, dec!(0));
    }

    #[test]
    fn test_allow_policy_permits_negative_balance() {
        let ledger = MemoryLedger::new();
        ledger.insert(account(1, dec!(10.00)));
        let service = AccountService::new(ledger, OverdraftPolicy::Allow);

        let account = service.withdraw(1, dec!(25.00)).unwrap();

        assert_eq!(account.balance, dec!(-15.00));
        assert!(account.is_overdrawn());
    }

    #[test]
    fn test_transfer_to_missing_destination_leaves_source_untouched() {
        let service = create_test_service(&[(1, dec!(100.00))]);

        let err = service.transfer(1, 2, dec!(50.00)).unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(service.store().balance(1), Some(dec!(100.00)));
    }

    #[test]
    fn test_transfer_from_missing_source() {
        let service = create_test_service(&[(2, dec!(0))]);

        assert!(service.transfer(1, 2, dec!(5)).unwrap_err().is_not_found());
        assert_eq!(service.store().balance(2), Some(dec!(0)));
    }

    #[test]
    fn test_transfer_to_same_account_is_rejected() {
        let service = create_test_service(&[(1, dec!(100.00))]);

        let err = service.transfer(1, 1, dec!(10.00)).unwrap_err();

        assert!(matches!(err, BankError::SameAccount(1)));
        assert_eq!(service.store().balance(1), Some(dec!(100.00)));
    }

    #[test]
    fn test_failed_credit_leg_rolls_back_debit() {
        let inner = MemoryLedger::new();
        inner.insert(account(1, dec!(100.00)));
        inner.insert(account(2, dec!(0)));
        let service = AccountService::new(
            FailingWrites {
                inner: inner.clone(),
                fail_for: 2,
            },
            OverdraftPolicy::Forbid,
        );

        let err = service.transfer(1, 2, dec!(40.00)).unwrap_err();

        assert!(matches!(
            err,
            BankError::PartialTransfer { from: 1, to: 2, .. }
        ));
        assert_eq!(inner.balance(1), Some(dec!(100.00)));
        assert_eq!(inner.balance(2), Some(dec!(0)));
    }

    #[test]
    fn test_failed_debit_leg_is_a_storage_error() {
        let inner = MemoryLedger::new();
        inner.insert(account(1, dec!(100.00)));
        inner.insert(account(2, dec!(0)));
        let service = AccountService::new(
            FailingWrites {
                inner: inner.clone(),
                fail_for: 1,
            },
            OverdraftPolicy::Forbid,
        );

        let err = service.transfer(1, 2, dec!(40.00)).unwrap_err();

        assert!(matches!(err, BankError::Storage(StoreError::Unavailable(_))));
        assert_eq!(inner.total_balance(), dec!(100.00));
    }

    #[test]
    fn test_delete_then_get_is_not_found() {
        let service = create_test_service(&[(1, dec!(100.00))]);

        service.delete_bank_account(1).unwrap();

        assert!(service.get_bank_account(1).unwrap_err().is_not_found());
        assert!(service.withdraw(1, dec!(1)).unwrap_err().is_not_found());
        assert!(service.locks.is_empty());
    }

    #[test]
    fn test_missing_ids_leave_no_lock_entries() {
        let service = create_test_service(&[(1, dec!(100.00))]);

        for id in 1_000..11_000 {
            assert!(service.withdraw(id, dec!(1)).unwrap_err().is_not_found());
            assert!(service.deposit(id, dec!(1)).unwrap_err().is_not_found());
            assert!(service.transfer(1, id, dec!(1)).unwrap_err().is_not_found());
            assert!(service.delete_bank_account(id).unwrap_err().is_not_found());
        }

        assert!(service.locks.is_empty());
        assert_eq!(service.get_bank_account(1).unwrap().balance, dec!(100.00));
    }

    #[test]
    fn test_concurrent_withdrawals_lose_no_updates() {
        const THREADS: usize = 16;
        const PER_THREAD: usize = 25;
        let service = create_test_service(&[(1, dec!(1000.00))]);

        thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| {
                    for _ in 0..PER_THREAD {
                        service.withdraw(1, dec!(2.00)).unwrap();
                    }
                });
            }
        });

        // 16 * 25 * 2.00 = 800.00
        assert_eq!(service.store().balance(1), Some(dec!(200.00)));
    }

    #[test]
    fn test_concurrent_opposite_transfers_preserve_total() {
        let service = create_test_service(&[(1, dec!(500.00)), (2, dec!(500.00))]);

        thread::scope(|s| {
            for i in 0..8 {
                let service = &service;
                s.spawn(move || {
                    let (from, to) = if i % 2 == 0 { (1, 2) } else { (2, 1) };
                    for _ in 0..50 {
                        service.transfer(from, to, dec!(1.00)).unwrap();
                    }
                });
            }
        });

        // Four threads each way, equal volume: balances return to the start
        assert_eq!(service.store().balance(1), Some(dec!(500.00)));
        assert_eq!(service.store().balance(2), Some(dec!(500.00)));
        assert_eq!(service.store().total_balance(), dec!(1000.00));
    }

    #[test]
    fn test_concurrent_overdraw_attempts_never_go_negative() {
        let service = create_test_service(&[(1, dec!(10.00))]);

        let successes: usize = thread::scope(|s| {
            let handles: Vec<_> = (0..20)
                .map(|_| s.spawn(|| service.withdraw(1, dec!(1.00)).is_ok()))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap() as usize)
                .sum()
        });

        assert_eq!(successes, 10);
        assert_eq!(service.store().balance(1), Some(dec!(0)));
    }
}
