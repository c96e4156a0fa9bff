use super::{Ledger, LedgerStore};
use crate::db;
use crate::entities::{AccountId, BankAccount};
use crate::error::StoreError;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Ledger backed by the `bankaccounts` table.
///
/// The connection is shared with the user/account catalogue, so the same
/// handle can be given to the HTTP layer.
#[derive(Clone)]
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedger {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        SqliteLedger { conn }
    }

    pub fn from_connection(conn: Connection) -> Self {
        SqliteLedger::new(Arc::new(Mutex::new(conn)))
    }

    /// Shared handle to the underlying connection
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    /// Lock the connection. An open transaction is rolled back when a
    /// panicking holder unwinds, so a poisoned lock is still usable.
    pub fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct SqliteTx<'conn> {
    tx: &'conn Transaction<'conn>,
}

impl Ledger for SqliteTx<'_> {
    fn read_balance(&self, id: AccountId) -> Result<BankAccount, StoreError> {
        db::get_bank_account(self.tx, id)
    }

    fn write_balance(&self, id: AccountId, balance: Decimal) -> Result<(), StoreError> {
        db::update_balance(self.tx, id, balance)
    }
}

impl LedgerStore for SqliteLedger {
    fn with_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn Ledger) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut conn = self.lock();
        // IMMEDIATE takes the write lock up front, so another process
        // sharing the file cannot slip in between our read and write.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| E::from(StoreError::from(e)))?;

        match work(&SqliteTx { tx: &tx }) {
            Ok(value) => {
                tx.commit().map_err(|e| E::from(StoreError::from(e)))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    tracing::error!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    fn delete_account(&self, id: AccountId) -> Result<(), StoreError> {
        let conn = self.lock();
        db::delete_bank_account(&conn, id)
    }
}
