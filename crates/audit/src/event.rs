use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use captable_core::{AuditEventId, DomainError, UserId};

/// Classification of an audited action. Wire form follows the
/// `area.event` convention.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    #[serde(rename = "auth.login_succeeded")]
    LoginSucceeded,
    #[serde(rename = "auth.login_failed")]
    LoginFailed,
    #[serde(rename = "registry.shareholder_created")]
    ShareholderCreated,
    #[serde(rename = "ledger.shares_issued")]
    SharesIssued,
    #[serde(rename = "certificate.rendered")]
    CertificateRendered,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::LoginSucceeded => "auth.login_succeeded",
            AuditAction::LoginFailed => "auth.login_failed",
            AuditAction::ShareholderCreated => "registry.shareholder_created",
            AuditAction::SharesIssued => "ledger.shares_issued",
            AuditAction::CertificateRendered => "certificate.rendered",
        }
    }
}

impl FromStr for AuditAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auth.login_succeeded" => Ok(AuditAction::LoginSucceeded),
            "auth.login_failed" => Ok(AuditAction::LoginFailed),
            "registry.shareholder_created" => Ok(AuditAction::ShareholderCreated),
            "ledger.shares_issued" => Ok(AuditAction::SharesIssued),
            "certificate.rendered" => Ok(AuditAction::CertificateRendered),
            other => Err(DomainError::validation(format!(
                "unknown audit action: {other}"
            ))),
        }
    }
}

/// One audit trail entry: who did what to which entity, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: AuditEventId,
    /// Acting user. `None` for unauthenticated actions (failed logins).
    pub actor: Option<UserId>,
    pub action: AuditAction,
    /// Reference to the affected entity, e.g. `issuance/<id>`.
    pub entity: Option<String>,
    /// Free-form structured context (quantities, emails, certificate numbers).
    pub detail: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        actor: Option<UserId>,
        action: AuditAction,
        entity: Option<String>,
        detail: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AuditEventId::new(),
            actor,
            action,
            entity,
            detail,
            recorded_at: now,
        }
    }
}
