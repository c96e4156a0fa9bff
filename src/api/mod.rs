// Simple Bank - REST API with Axum
//
// Routes (all bodies JSON):
//
//   GET    /health
//   GET    /users                       ?first_name=&last_name=
//   POST   /users
//   GET    /users/:id
//   PUT    /users/:id
//   DELETE /users/:id
//   GET    /users/:id/bankAccounts
//   POST   /users/:id/bankAccounts
//   GET    /bankAccounts/:id
//   DELETE /bankAccounts/:id
//   PUT    /bankAccounts/:id/withdraw   {"amount": 30.0}
//   PUT    /bankAccounts/:id/deposit    {"amount": 30.0}
//   POST   /transfers                   {"amount": 50.0, "from": 1, "to": 2}

pub mod accounts;
pub mod error;
pub mod users;

use crate::error::{BankResult, StoreError};
use crate::ledger::SqliteLedger;
use crate::service::{AccountService, OverdraftPolicy};
use axum::{
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    accounts: Arc<AccountService<SqliteLedger>>,
}

impl AppState {
    /// The catalogue and the ledger share one connection
    pub fn new(conn: Connection, policy: OverdraftPolicy) -> Self {
        let ledger = SqliteLedger::from_connection(conn);
        AppState {
            db: ledger.connection(),
            accounts: Arc::new(AccountService::new(ledger, policy)),
        }
    }

    pub fn accounts(&self) -> &AccountService<SqliteLedger> {
        &self.accounts
    }

    /// Run a catalogue query on the blocking pool
    pub(crate) async fn with_db<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let conn = db.lock().unwrap_or_else(PoisonError::into_inner);
            f(&conn).map_err(ApiError::from)
        })
        .await
    }

    /// Run an account service call on the blocking pool
    pub(crate) async fn with_accounts<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&AccountService<SqliteLedger>) -> BankResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let accounts = Arc::clone(&self.accounts);
        run_blocking(move || f(&accounts).map_err(ApiError::from)).await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal(format!("worker task failed: {}", e)))?
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// GET /health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/users", get(users::all_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/users/:id/bankAccounts",
            get(accounts::get_bank_accounts).post(accounts::add_bank_account),
        )
        .route(
            "/bankAccounts/:id",
            get(accounts::get_bank_account).delete(accounts::delete_bank_account),
        )
        .route("/bankAccounts/:id/withdraw", put(accounts::withdraw))
        .route("/bankAccounts/:id/deposit", put(accounts::deposit))
        .route("/transfers", post(accounts::transfers))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
