// ⚠️ Error taxonomy for the ledger and the account mutation service
//
// StoreError: what the persistence layer can report
// BankError:  what callers of the service can observe

use crate::entities::AccountId;
use rust_decimal::Decimal;
use thiserror::Error;

// ============================================================================
// STORE ERRORS
// ============================================================================

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("no unique account number found after {attempts} attempts")]
    AccountNumbersExhausted { attempts: usize },

    /// Injected or backend-specific failure with no better category
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn account_not_found(id: AccountId) -> Self {
        StoreError::NotFound {
            entity: "bank account",
            id,
        }
    }

    pub fn user_not_found(id: i64) -> Self {
        StoreError::NotFound { entity: "user", id }
    }
}

// ============================================================================
// SERVICE ERRORS
// ============================================================================

#[derive(Error, Debug)]
pub enum BankError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("insufficient funds in account {account_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account_id: AccountId,
        balance: Decimal,
        requested: Decimal,
    },

    #[error("cannot transfer from account {0} to itself")]
    SameAccount(AccountId),

    #[error("storage error: {0}")]
    Storage(#[source] StoreError),

    /// The credit leg failed after the debit leg was written; the whole
    /// transfer was rolled back.
    #[error("transfer {from} -> {to} rolled back after the credit leg failed: {source}")]
    PartialTransfer {
        from: AccountId,
        to: AccountId,
        #[source]
        source: StoreError,
    },
}

impl BankError {
    /// Stable machine-readable name for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            BankError::NotFound { .. } => "not_found",
            BankError::InvalidAmount(_) => "invalid_amount",
            BankError::InsufficientFunds { .. } => "insufficient_funds",
            BankError::SameAccount(_) => "same_account",
            BankError::Storage(_) => "storage_error",
            BankError::PartialTransfer { .. } => "partial_transfer_failure",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BankError::NotFound { .. })
    }
}

impl From<StoreError> for BankError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => BankError::NotFound { entity, id },
            other => BankError::Storage(other),
        }
    }
}

pub type BankResult<T> = std::result::Result<T, BankError>;
