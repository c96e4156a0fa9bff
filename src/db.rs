use crate::entities::{AccountId, BankAccount, NewBankAccount, NewUser, User, UserId, UserUpdate};
use crate::error::StoreError;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::str::FromStr;

/// How many fresh account numbers to try before giving up on a collision streak
pub const MAX_ACCOUNT_NUMBER_ATTEMPTS: usize = 5;

const ACCOUNT_COLUMNS: &str = "id, user_id, account_no, name, balance";

/// Open a database by URL and make sure the schema exists.
///
/// Accepts a plain file path, a `sqlite://` prefixed path, or `:memory:`.
pub fn open_database(url: &str) -> Result<Connection, StoreError> {
    let path = url.strip_prefix("sqlite://").unwrap_or(url);

    let conn = if path == ":memory:" {
        Connection::open_in_memory()?
    } else {
        let conn = Connection::open(path)?;
        // Enable WAL mode for crash recovery
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(path, journal_mode = %mode, "database opened");
        conn
    };

    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<(), StoreError> {
    // ==========================================================================
    // Users Table
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Bank Accounts Table (balance stored as canonical decimal text)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS bankaccounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            account_no TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            balance TEXT NOT NULL DEFAULT '0'
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_bankaccounts_user ON bankaccounts(user_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// USERS
// ============================================================================

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
    })
}

pub fn insert_user(conn: &Connection, user: NewUser) -> Result<User, StoreError> {
    conn.execute(
        "INSERT INTO users (first_name, last_name) VALUES (?1, ?2)",
        params![user.first_name, user.last_name],
    )?;

    Ok(user.with_id(conn.last_insert_rowid()))
}

pub fn all_users(conn: &Connection) -> Result<Vec<User>, StoreError> {
    let mut stmt =
        conn.prepare("SELECT id, first_name, last_name FROM users ORDER BY id DESC")?;

    let users = stmt
        .query_map([], user_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(users)
}

pub fn find_user_by_id(conn: &Connection, id: UserId) -> Result<User, StoreError> {
    conn.query_row(
        "SELECT id, first_name, last_name FROM users WHERE id = ?1",
        [id],
        user_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::user_not_found(id))
}

/// Exact match on both names; several users may share a name
pub fn find_users_by_name(
    conn: &Connection,
    first_name: &str,
    last_name: &str,
) -> Result<Vec<User>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name FROM users
         WHERE first_name = ?1 AND last_name = ?2
         ORDER BY id DESC",
    )?;

    let users = stmt
        .query_map(params![first_name, last_name], user_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(users)
}

pub fn update_user(conn: &Connection, id: UserId, update: &UserUpdate) -> Result<User, StoreError> {
    let mut user = find_user_by_id(conn, id)?;
    update.apply(&mut user);

    conn.execute(
        "UPDATE users SET first_name = ?1, last_name = ?2 WHERE id = ?3",
        params![user.first_name, user.last_name, user.id],
    )?;

    Ok(user)
}

pub fn delete_user(conn: &Connection, id: UserId) -> Result<(), StoreError> {
    let deleted = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
    if deleted == 0 {
        return Err(StoreError::user_not_found(id));
    }
    Ok(())
}

// ============================================================================
// BANK ACCOUNTS
// ============================================================================

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<BankAccount> {
    let balance_text: String = row.get(4)?;
    let balance = Decimal::from_str(&balance_text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(BankAccount {
        id: row.get(0)?,
        user_id: row.get(1)?,
        account_number: row.get(2)?,
        name: row.get(3)?,
        balance,
    })
}

/// Open a zero-balance account for an existing user.
///
/// Retries with a fresh number when the generated one is already taken.
pub fn insert_bank_account(conn: &Connection, user: &User) -> Result<BankAccount, StoreError> {
    let mut account = NewBankAccount::for_user(user);

    for attempt in 1..=MAX_ACCOUNT_NUMBER_ATTEMPTS {
        let result = conn.execute(
            "INSERT INTO bankaccounts (user_id, account_no, name, balance)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                account.user_id,
                account.account_number,
                account.name,
                account.balance.to_string(),
            ],
        );

        match result {
            Ok(_) => return Ok(account.with_id(conn.last_insert_rowid())),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                tracing::warn!(
                    attempt,
                    account_no = %account.account_number,
                    "account number collision, regenerating"
                );
                account.regenerate_number();
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(StoreError::AccountNumbersExhausted {
        attempts: MAX_ACCOUNT_NUMBER_ATTEMPTS,
    })
}

pub fn get_bank_account(conn: &Connection, id: AccountId) -> Result<BankAccount, StoreError> {
    conn.query_row(
        &format!("SELECT {} FROM bankaccounts WHERE id = ?1", ACCOUNT_COLUMNS),
        [id],
        account_from_row,
    )
    .optional()?
    .ok_or_else(|| StoreError::account_not_found(id))
}

/// All accounts of a user, newest first
pub fn get_bank_accounts(conn: &Connection, user_id: UserId) -> Result<Vec<BankAccount>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM bankaccounts WHERE user_id = ?1 ORDER BY id DESC",
        ACCOUNT_COLUMNS
    ))?;

    let accounts = stmt
        .query_map([user_id], account_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(accounts)
}

/// Unconditional overwrite of one account's balance
pub fn update_balance(conn: &Connection, id: AccountId, balance: Decimal) -> Result<(), StoreError> {
    let updated = conn.execute(
        "UPDATE bankaccounts SET balance = ?1 WHERE id = ?2",
        params![balance.to_string(), id],
    )?;
    if updated == 0 {
        return Err(StoreError::account_not_found(id));
    }
    Ok(())
}

pub fn delete_bank_account(conn: &Connection, id: AccountId) -> Result<(), StoreError> {
    let deleted = conn.execute("DELETE FROM bankaccounts WHERE id = ?1", [id])?;
    if deleted == 0 {
        return Err(StoreError::account_not_found(id));
    }
    Ok(())
}

pub fn count_bank_accounts(conn: &Connection) -> Result<i64, StoreError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM bankaccounts", [], |row| row.get(0))?;

    Ok(count)
}
