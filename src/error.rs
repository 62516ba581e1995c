use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use thiserror::Error;
use tracing::error;

use crate::schemas::ErrorResponse;

/// Error taxonomy for every domain operation. Handlers return
/// `Result<_, ApiError>` and the boundary maps each variant to a status
/// code and an [`ErrorResponse`] body. Database errors are logged
/// server-side and never leak details to the client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),
    /// Missing or invalid session token.
    #[error("{0}")]
    Unauthorized(String),
    /// Valid identity, insufficient role or unapproved account.
    #[error("{0}")]
    Forbidden(String),
    /// Resource absent or not owned by the caller.
    #[error("{0}")]
    NotFound(String),
    /// Duplicate resource, or a delete blocked by references.
    #[error("{0}")]
    Conflict(String),
    /// Unexpected database failure.
    #[error(transparent)]
    Database(#[from] DbErr),
    /// Anything else that should surface as a 500.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ApiError::Database(db_error) => {
                error!("Database error: {}", db_error);
                "Server error".to_string()
            }
            ApiError::Internal(detail) => {
                error!("Internal error: {}", detail);
                "Server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: message,
            code: self.code().to_string(),
            success: false,
        };

        (status, Json(body)).into_response()
    }
}
