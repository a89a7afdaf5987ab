//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Deterministic business failures only (validation, missing records,
/// uniqueness conflicts). Transport and storage concerns live in their own
/// error types and are mapped at the API boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (malformed or out-of-range input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A requested record does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness rule was violated (e.g. duplicate shareholder link).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
