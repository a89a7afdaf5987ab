use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use captable_core::{DomainError, UserId};

use crate::Role;

/// A login account: credentials plus role.
///
/// # Invariants
/// - Emails are stored trimmed and lowercased; uniqueness is enforced by the
///   store.
/// - Accounts are never hard-deleted. `active = false` soft-disables login
///   while historical records (issuances, audit events) keep referencing the
///   id, preserving audit continuity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub email: String,
    /// Argon2 PHC string; never the plaintext.
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn create(
        email: impl Into<String>,
        password_hash: String,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let email = normalize_email(&email.into())?;
        Ok(Self {
            id: UserId::new(),
            email,
            password_hash,
            role,
            active: true,
            created_at: now,
        })
    }
}

/// Trim, lowercase, and shape-check an email address.
pub fn normalize_email(raw: &str) -> Result<String, DomainError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(DomainError::validation("email cannot be empty"));
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(DomainError::validation("invalid email format"));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(DomainError::validation("invalid email format"));
    }
    Ok(email)
}
