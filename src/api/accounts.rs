use super::{ApiError, AppState};
use crate::db;
use crate::entities::{AccountId, BankAccount, UserId};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Body of withdraw / deposit
#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// Body of POST /transfers
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub from: AccountId,
    pub to: AccountId,
}

/// POST /users/:id/bankAccounts - Open a zero-balance account for the user
pub async fn add_bank_account(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<(StatusCode, Json<BankAccount>), ApiError> {
    let account = state
        .with_db(move |conn| {
            let user = db::find_user_by_id(conn, user_id)?;
            db::insert_bank_account(conn, &user)
        })
        .await?;
    tracing::info!(user_id, account_id = account.id, "bank account opened");

    Ok((StatusCode::CREATED, Json(account)))
}

/// GET /users/:id/bankAccounts - Newest first
pub async fn get_bank_accounts(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<BankAccount>>, ApiError> {
    let accounts = state
        .with_db(move |conn| {
            db::find_user_by_id(conn, user_id)?;
            db::get_bank_accounts(conn, user_id)
        })
        .await?;
    Ok(Json(accounts))
}

/// GET /bankAccounts/:id
pub async fn get_bank_account(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
) -> Result<Json<BankAccount>, ApiError> {
    let account = state
        .with_accounts(move |accounts| accounts.get_bank_account(id))
        .await?;
    Ok(Json(account))
}

/// DELETE /bankAccounts/:id
pub async fn delete_bank_account(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
) -> Result<Json<&'static str>, ApiError> {
    state
        .with_accounts(move |accounts| accounts.delete_bank_account(id))
        .await?;
    Ok(Json("Bank Account Deleted"))
}

/// PUT /bankAccounts/:id/withdraw
pub async fn withdraw(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<&'static str>, ApiError> {
    state
        .with_accounts(move |accounts| accounts.withdraw(id, request.amount))
        .await?;
    Ok(Json("Withdraw success"))
}

/// PUT /bankAccounts/:id/deposit
pub async fn deposit(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<&'static str>, ApiError> {
    state
        .with_accounts(move |accounts| accounts.deposit(id, request.amount))
        .await?;
    Ok(Json("Deposit Success"))
}

/// POST /transfers
pub async fn transfers(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<&'static str>, ApiError> {
    let TransferRequest { amount, from, to } = request;
    state
        .with_accounts(move |accounts| accounts.transfer(from, to, amount))
        .await?;
    Ok(Json("Transfers success"))
}
