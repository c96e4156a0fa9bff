// Entity Models
//
// Users own bank accounts; bank accounts hold balances.
// Ids are database-assigned integers and never change.

pub mod account;
pub mod user;

pub type AccountId = i64;
pub type UserId = i64;

pub use account::{
    generate_account_number, Amount, BankAccount, NewBankAccount, ACCOUNT_NUMBER_DIGITS,
};
pub use user::{NewUser, User, UserUpdate};
