//! Consistent error responses.
//!
//! Every failure leaves the API as `{"error": <kind>, "message": <text>}`.
//! The kinds are a closed set; handlers return [`ApiError`] and conversion
//! to a response happens in one place.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use captable_auth::{AccessError, TokenError};
use captable_core::DomainError;
use captable_store::StoreError;

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    NotFound(String),
    Forbidden(&'static str),
    Unauthorized(&'static str),
    Conflict(String),
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Validation(msg) => {
                json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
            }
            ApiError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::Unauthorized(msg) => {
                json_error(StatusCode::UNAUTHORIZED, "unauthorized", msg)
            }
            ApiError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
            ApiError::Internal => json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "internal error",
            ),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => ApiError::Validation(msg),
            DomainError::InvalidId(msg) => ApiError::Validation(msg),
            DomainError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        let AccessError::Forbidden(msg) = err;
        ApiError::Forbidden(msg)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            other => {
                tracing::error!(error = %other, "storage failure");
                ApiError::Internal
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(_err: TokenError) -> Self {
        ApiError::Unauthorized("invalid token")
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
