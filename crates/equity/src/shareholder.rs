use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use captable_core::{DomainError, ShareholderId, UserId};

/// Validated input for creating a shareholder.
///
/// Carries the profile fields only; the linked user account is provisioned by
/// the service layer. Construction is the validation boundary: a
/// `ShareholderProfile` that exists is well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareholderProfile {
    full_name: String,
    phone: Option<String>,
    address: Option<String>,
}

impl ShareholderProfile {
    pub fn new(
        full_name: impl Into<String>,
        phone: Option<String>,
        address: Option<String>,
    ) -> Result<Self, DomainError> {
        let full_name = full_name.into().trim().to_string();
        if full_name.len() < 2 {
            return Err(DomainError::validation(
                "full name must be at least 2 characters",
            ));
        }
        if full_name.len() > 255 {
            return Err(DomainError::validation("full name exceeds 255 characters"));
        }
        if let Some(phone) = &phone {
            if phone.len() > 20 {
                return Err(DomainError::validation("phone exceeds 20 characters"));
            }
        }
        Ok(Self {
            full_name,
            phone,
            address,
        })
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
}

/// A shareholder record: one profile linked 1—1 with a user account.
///
/// # Invariants
/// - `user_id` links to exactly one shareholder (enforced by the store).
/// - Holdings are never stored here; totals and ownership percentages are
///   derived from the issuance ledger on read (see [`crate::ownership`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shareholder {
    pub id: ShareholderId,
    pub user_id: UserId,
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Shareholder {
    pub fn create(user_id: UserId, profile: ShareholderProfile, now: DateTime<Utc>) -> Self {
        Self {
            id: ShareholderId::new(),
            user_id,
            full_name: profile.full_name,
            phone: profile.phone,
            address: profile.address,
            created_at: now,
        }
    }
}
