use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use captable_core::{DomainError, IssuanceId, ShareholderId, UserId};

/// Hard cap on a single issuance, carried over from the registry's operating
/// rules. Larger grants are split across multiple issuances.
pub const MAX_SHARES_PER_ISSUANCE: i64 = 1_000_000;

/// Hard cap on the per-share price ($10,000.00), also from the operating
/// rules. Together with [`MAX_SHARES_PER_ISSUANCE`] this bounds
/// `quantity * price` well inside `i64`, so totals never overflow.
pub const MAX_PRICE_PER_SHARE_CENTS: i64 = 1_000_000;

/// Category of stock issued.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareClass {
    Common,
    Preferred,
}

impl ShareClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareClass::Common => "common",
            ShareClass::Preferred => "preferred",
        }
    }
}

impl core::fmt::Display for ShareClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShareClass {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "common" => Ok(ShareClass::Common),
            "preferred" => Ok(ShareClass::Preferred),
            other => Err(DomainError::validation(format!(
                "share class must be 'common' or 'preferred', got '{other}'"
            ))),
        }
    }
}

/// Validated input for issuing shares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuanceRequest {
    pub shareholder_id: ShareholderId,
    pub class: ShareClass,
    pub quantity: i64,
    pub price_per_share_cents: i64,
    pub notes: Option<String>,
}

impl IssuanceRequest {
    pub fn new(
        shareholder_id: ShareholderId,
        class: ShareClass,
        quantity: i64,
        price_per_share_cents: i64,
        notes: Option<String>,
    ) -> Result<Self, DomainError> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if quantity > MAX_SHARES_PER_ISSUANCE {
            return Err(DomainError::validation(format!(
                "cannot issue more than {MAX_SHARES_PER_ISSUANCE} shares in one issuance"
            )));
        }
        if price_per_share_cents < 0 {
            return Err(DomainError::validation("price per share cannot be negative"));
        }
        if price_per_share_cents > MAX_PRICE_PER_SHARE_CENTS {
            return Err(DomainError::validation(format!(
                "price per share cannot exceed {MAX_PRICE_PER_SHARE_CENTS} cents"
            )));
        }
        Ok(Self {
            shareholder_id,
            class,
            quantity,
            price_per_share_cents,
            notes,
        })
    }
}

/// One immutable row of the issuance ledger.
///
/// # Invariants
/// - `quantity` in `1..=MAX_SHARES_PER_ISSUANCE`, `price_per_share_cents` in
///   `0..=MAX_PRICE_PER_SHARE_CENTS` (checked at construction and again by
///   the database schema), which keeps `total_value_cents` within `i64`.
/// - Never mutated or deleted once created; no update operation exists at any
///   layer, which is what gives the ledger its audit-trail property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareIssuance {
    pub id: IssuanceId,
    pub shareholder_id: ShareholderId,
    pub class: ShareClass,
    pub quantity: i64,
    /// Price in integer minor units (cents); avoids float drift in totals.
    pub price_per_share_cents: i64,
    pub certificate_number: String,
    pub issued_at: DateTime<Utc>,
    /// Admin account that issued the shares.
    pub issued_by: UserId,
    pub notes: Option<String>,
}

impl ShareIssuance {
    /// Materialize a validated request into a ledger row.
    pub fn create(request: IssuanceRequest, issued_by: UserId, now: DateTime<Utc>) -> Self {
        let id = IssuanceId::new();
        Self {
            certificate_number: certificate_number(&id),
            id,
            shareholder_id: request.shareholder_id,
            class: request.class,
            quantity: request.quantity,
            price_per_share_cents: request.price_per_share_cents,
            issued_at: now,
            issued_by,
            notes: request.notes,
        }
    }

    /// Total value of the issuance in cents.
    pub fn total_value_cents(&self) -> i64 {
        self.quantity * self.price_per_share_cents
    }
}

/// Certificate numbers are derived from the issuance id at creation time, so
/// they are unique without a counter and stable for the life of the row.
fn certificate_number(id: &IssuanceId) -> String {
    let simple = id.as_uuid().simple().to_string();
    format!("CERT-{}", simple[..12].to_uppercase())
}
