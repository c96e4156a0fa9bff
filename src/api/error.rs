use crate::error::{BankError, StoreError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub kind: &'static str,
}

/// Failure of a request, already mapped to an HTTP status
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            kind: "invalid_request",
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal_error",
            message: message.into(),
        }
    }
}

/// One status per error kind
pub fn status_for(err: &BankError) -> StatusCode {
    match err {
        BankError::NotFound { .. } => StatusCode::NOT_FOUND,
        BankError::InvalidAmount(_) | BankError::SameAccount(_) => StatusCode::BAD_REQUEST,
        BankError::InsufficientFunds { .. } => StatusCode::CONFLICT,
        BankError::Storage(_) | BankError::PartialTransfer { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<BankError> for ApiError {
    fn from(err: BankError) -> Self {
        ApiError {
            status: status_for(&err),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        BankError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(kind = self.kind, error = %self.message, "request failed");
        } else {
            tracing::debug!(kind = self.kind, error = %self.message, "request rejected");
        }

        let body = ErrorBody {
            success: false,
            error: self.message,
            kind: self.kind,
        };
        (self.status, Json(body)).into_response()
    }
}
