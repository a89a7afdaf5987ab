use thiserror::Error;

/// Failures surfaced by a [`crate::Store`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness rule was violated (duplicate email, duplicate
    /// certificate number).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A persisted row could not be decoded back into a domain type.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        StoreError::Conflict(msg.into())
    }

    pub fn corrupt(msg: impl Into<String>) -> Self {
        StoreError::Corrupt(msg.into())
    }
}
