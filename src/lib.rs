// Simple Bank - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod ledger;
pub mod locks;
pub mod service;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::{AppConfig, ConfigError};
pub use db::{
    all_users, count_bank_accounts, delete_bank_account, delete_user, find_user_by_id,
    find_users_by_name, get_bank_account, get_bank_accounts, insert_bank_account, insert_user,
    open_database, setup_database, update_user,
};
pub use entities::{AccountId, Amount, BankAccount, NewUser, User, UserId, UserUpdate};
pub use error::{BankError, BankResult, StoreError};
pub use ledger::{Ledger, LedgerStore, MemoryLedger, SqliteLedger};
pub use locks::AccountLocks;
pub use service::{AccountService, OverdraftPolicy, TransferReceipt};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
