//! Request DTOs and JSON mapping helpers.
//!
//! Responses are built with `serde_json::json!` maps rather than dedicated
//! response structs; the wire shape lives here in one place per entity.

use serde::Deserialize;
use serde_json::json;

use captable_audit::AuditEvent;
use captable_equity::ShareIssuance;

use crate::app::services::{RegisteredShareholder, ShareholderView, TokenGrant};

// -------------------------
// Request DTOs
// -------------------------

/// OAuth2 password-grant form body. The field is `username` on the wire
/// even though it carries an email address.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateShareholderRequest {
    pub full_name: String,
    pub email: String,
    /// Optional; a random password is generated (and returned once) when
    /// absent.
    pub password: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IssueSharesRequest {
    pub shareholder_id: String,
    pub share_class: String,
    pub quantity: i64,
    pub price_per_share_cents: i64,
    pub notes: Option<String>,
}

// -------------------------
// Response mapping
// -------------------------

pub fn grant_to_json(grant: &TokenGrant) -> serde_json::Value {
    json!({
        "access_token": grant.access_token,
        "token_type": grant.token_type,
        "expires_in": grant.expires_in_secs,
    })
}

pub fn shareholder_to_json(view: &ShareholderView) -> serde_json::Value {
    json!({
        "id": view.shareholder.id,
        "user_id": view.shareholder.user_id,
        "full_name": view.shareholder.full_name,
        "email": view.email,
        "phone": view.shareholder.phone,
        "address": view.shareholder.address,
        "total_shares": view.total_shares,
        "ownership_pct": view.ownership_pct,
        "created_at": view.shareholder.created_at.to_rfc3339(),
    })
}

pub fn registered_to_json(registered: &RegisteredShareholder) -> serde_json::Value {
    let mut body = json!({
        "id": registered.shareholder.id,
        "user_id": registered.shareholder.user_id,
        "full_name": registered.shareholder.full_name,
        "email": registered.email,
        "phone": registered.shareholder.phone,
        "address": registered.shareholder.address,
        "created_at": registered.shareholder.created_at.to_rfc3339(),
    });
    if let (Some(map), Some(password)) =
        (body.as_object_mut(), registered.initial_password.as_deref())
    {
        map.insert("initial_password".to_string(), json!(password));
    }
    body
}

pub fn issuance_to_json(issuance: &ShareIssuance) -> serde_json::Value {
    json!({
        "id": issuance.id,
        "shareholder_id": issuance.shareholder_id,
        "share_class": issuance.class,
        "quantity": issuance.quantity,
        "price_per_share_cents": issuance.price_per_share_cents,
        "total_value_cents": issuance.total_value_cents(),
        "certificate_number": issuance.certificate_number,
        "issued_at": issuance.issued_at.to_rfc3339(),
        "issued_by": issuance.issued_by,
        "notes": issuance.notes,
    })
}

pub fn audit_to_json(event: &AuditEvent) -> serde_json::Value {
    json!({
        "id": event.id,
        "actor": event.actor,
        "action": event.action,
        "entity": event.entity,
        "detail": event.detail,
        "recorded_at": event.recorded_at.to_rfc3339(),
    })
}
