//! Error responses.
//!
//! Every failure leaves a handler as an [`ApiError`], which renders as
//! `{"error": CODE, "message": text}` with the matching status code.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tally_core::{ErrorKind, LedgerError};
use tally_shared::AppError;
use tracing::error;

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// An error on its way to the client.
#[derive(Debug)]
pub struct ApiError {
    code: &'static str,
    error: AppError,
}

impl ApiError {
    /// A 400 with a custom code.
    #[must_use]
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            error: AppError::Validation(message.into()),
        }
    }

    /// Status code of the response.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let code = err.error_code();
        let message = err.to_string();
        let error = match err.kind() {
            ErrorKind::NotFound => AppError::NotFound(message),
            ErrorKind::Conflict => AppError::Conflict(message),
            ErrorKind::Forbidden => AppError::Forbidden(message),
            ErrorKind::Validation => AppError::Validation(message),
            ErrorKind::StoreFailure => {
                error!(error = %message, "Store failure");
                AppError::Database(message)
            }
            ErrorKind::Internal => {
                error!(error = %message, "Internal error");
                AppError::Internal(message)
            }
        };
        Self { code, error }
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self {
            code: error.error_code(),
            error,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = if self.error.is_internal() {
            "An error occurred".to_string()
        } else {
            match &self.error {
                AppError::Forbidden(m)
                | AppError::NotFound(m)
                | AppError::Validation(m)
                | AppError::Conflict(m)
                | AppError::Database(m)
                | AppError::Internal(m) => m.clone(),
            }
        };
        (
            self.status(),
            Json(json!({
                "error": self.code,
                "message": message
            })),
        )
            .into_response()
    }
}
