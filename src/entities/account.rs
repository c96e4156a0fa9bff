// 💳 Bank Account Entity - balance holder owned by a user
//
// Identity: integer id assigned by the database (never changes)
// Values:   name, account number, balance (balance mutated only by the service)

use crate::entities::user::User;
use crate::entities::{AccountId, UserId};
use crate::error::BankError;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// Number of decimal digits in a generated account number
pub const ACCOUNT_NUMBER_DIGITS: u32 = 10;

/// Largest number of fractional digits accepted in an amount (cents)
pub const MAX_AMOUNT_SCALE: u32 = 2;

// ============================================================================
// BANK ACCOUNT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankAccount {
    pub id: AccountId,

    /// Owning user (foreign key to users.id, not enforced by a cascade)
    pub user_id: UserId,

    /// Opaque account number, e.g. "0042137795"
    #[serde(rename = "account_no")]
    pub account_number: String,

    /// Display name, derived from the owner's full name at creation time
    pub name: String,

    /// Current balance, serialized as a JSON number
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

impl BankAccount {
    /// Check if account is overdrawn (negative balance)
    pub fn is_overdrawn(&self) -> bool {
        self.balance < Decimal::ZERO
    }
}

/// Account data before the database assigns an id
#[derive(Debug, Clone, PartialEq)]
pub struct NewBankAccount {
    pub user_id: UserId,
    pub account_number: String,
    pub name: String,
    pub balance: Decimal,
}

impl NewBankAccount {
    /// Open a fresh account for a user: zero balance, owner's full name,
    /// freshly generated account number.
    pub fn for_user(user: &User) -> Self {
        NewBankAccount {
            user_id: user.id,
            account_number: generate_account_number(),
            name: user.full_name(),
            balance: Decimal::ZERO,
        }
    }

    /// Replace the account number (used when a generated one collides)
    pub fn regenerate_number(&mut self) {
        self.account_number = generate_account_number();
    }

    pub fn with_id(self, id: AccountId) -> BankAccount {
        BankAccount {
            id,
            user_id: self.user_id,
            account_number: self.account_number,
            name: self.name,
            balance: self.balance,
        }
    }
}

/// Generate a random fixed-width numeric account number.
///
/// Uniqueness is not guaranteed here; the `bankaccounts.account_no` UNIQUE
/// constraint rejects collisions and the caller retries.
pub fn generate_account_number() -> String {
    let modulus = 10u128.pow(ACCOUNT_NUMBER_DIGITS);
    let value = uuid::Uuid::new_v4().as_u128() % modulus;
    format!("{:0width$}", value, width = ACCOUNT_NUMBER_DIGITS as usize)
}

// ============================================================================
// AMOUNT
// ============================================================================

/// Strictly positive money amount with at most two fractional digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, BankError> {
        if value <= Decimal::ZERO {
            return Err(BankError::InvalidAmount(format!(
                "amount must be positive, got {}",
                value
            )));
        }

        if value.normalize().scale() > MAX_AMOUNT_SCALE {
            return Err(BankError::InvalidAmount(format!(
                "amount must have at most {} decimal places, got {}",
                MAX_AMOUNT_SCALE, value
            )));
        }

        Ok(Amount(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// TESTS
// ============================================================================
