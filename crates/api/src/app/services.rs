//! Use-case layer: everything the HTTP handlers call.
//!
//! Handlers stay thin; authorization, auditing, and storage access all land
//! here. Methods take the caller's [`Principal`] explicitly so the access
//! rules are visible at every call site.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use captable_audit::{AuditAction, AuditEvent};
use captable_auth::{
    self as auth, JwtClaims, Principal, Role, TokenCodec, UserAccount, normalize_email,
};
use captable_certificate::{CertificateData, render_certificate};
use captable_core::{IssuanceId, ShareholderId, UserId};
use captable_equity::{
    IssuanceRequest, ShareClass, ShareIssuance, Shareholder, ShareholderProfile,
    ownership_breakdown,
};
use captable_store::Store;

use crate::app::errors::ApiError;

pub struct AppServices {
    store: Arc<dyn Store>,
    codec: Arc<dyn TokenCodec>,
    token_ttl: Duration,
    company_name: String,
}

/// A successfully minted access token, in OAuth2 password-grant shape.
#[derive(Debug)]
pub struct TokenGrant {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in_secs: i64,
}

/// A shareholder joined with their account email and derived holdings.
pub struct ShareholderView {
    pub shareholder: Shareholder,
    pub email: String,
    pub total_shares: i64,
    pub ownership_pct: f64,
}

/// Outcome of registering a shareholder. `initial_password` is only set
/// when the service generated one; it is shown exactly once.
pub struct RegisteredShareholder {
    pub shareholder: Shareholder,
    pub email: String,
    pub initial_password: Option<String>,
}

pub struct NewShareholder {
    pub full_name: String,
    pub email: String,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

pub struct NewIssuance {
    pub shareholder_id: ShareholderId,
    pub class: ShareClass,
    pub quantity: i64,
    pub price_per_share_cents: i64,
    pub notes: Option<String>,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn Store>,
        codec: Arc<dyn TokenCodec>,
        token_ttl_secs: i64,
        company_name: String,
    ) -> Self {
        Self {
            store,
            codec,
            token_ttl: Duration::seconds(token_ttl_secs),
            company_name,
        }
    }

    /// Provision an admin account if the email is not yet registered.
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let email = normalize_email(email)?;
        if self.store.user_by_email(&email).await?.is_some() {
            return Ok(());
        }
        let hash = auth::hash_password(password).map_err(internal)?;
        let account = UserAccount::create(email.clone(), hash, Role::Admin, Utc::now())?;
        self.store.insert_user(account).await?;
        tracing::info!(%email, "provisioned admin account");
        Ok(())
    }

    // ---- identity & access ----

    /// Verify credentials and mint a bearer token. Failures are audited
    /// without an actor and always surface as the same `unauthorized`
    /// response, so the API never reveals whether the email exists.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<TokenGrant, ApiError> {
        let email = match normalize_email(email) {
            Ok(email) => email,
            Err(_) => return self.reject_login(email).await,
        };

        let user = match self.store.user_by_email(&email).await? {
            Some(user) => user,
            None => return self.reject_login(&email).await,
        };

        if !user.active || !auth::verify_password(password, &user.password_hash) {
            return self.reject_login(&email).await;
        }

        let now = Utc::now();
        let claims = JwtClaims {
            sub: user.id,
            role: user.role,
            issued_at: now,
            expires_at: now + self.token_ttl,
        };
        let access_token = self.codec.encode(&claims)?;

        self.audit(AuditEvent::new(
            Some(user.id),
            AuditAction::LoginSucceeded,
            Some(format!("user/{}", user.id)),
            json!({ "email": email }),
            now,
        ))
        .await;

        Ok(TokenGrant {
            access_token,
            token_type: "bearer",
            expires_in_secs: self.token_ttl.num_seconds(),
        })
    }

    async fn reject_login(&self, email: &str) -> Result<TokenGrant, ApiError> {
        self.audit(AuditEvent::new(
            None,
            AuditAction::LoginFailed,
            None,
            json!({ "email": email }),
            Utc::now(),
        ))
        .await;
        Err(ApiError::Unauthorized("invalid credentials"))
    }

    // ---- shareholder registry ----

    pub async fn create_shareholder(
        &self,
        principal: &Principal,
        req: NewShareholder,
    ) -> Result<RegisteredShareholder, ApiError> {
        auth::require_admin(principal)?;

        let email = normalize_email(&req.email)?;
        let profile = ShareholderProfile::new(req.full_name, req.phone, req.address)?;

        let (password, generated) = match req.password {
            Some(password) if !password.is_empty() => (password, false),
            _ => (Uuid::now_v7().simple().to_string(), true),
        };
        let hash = auth::hash_password(&password).map_err(internal)?;

        let now = Utc::now();
        let account = UserAccount::create(email.clone(), hash, Role::Shareholder, now)?;
        let shareholder = Shareholder::create(account.id, profile, now);

        let audit = AuditEvent::new(
            Some(principal.user_id),
            AuditAction::ShareholderCreated,
            Some(format!("shareholder/{}", shareholder.id)),
            json!({ "email": email, "full_name": shareholder.full_name }),
            now,
        );
        self.store
            .insert_shareholder(account, shareholder.clone(), audit)
            .await?;

        Ok(RegisteredShareholder {
            shareholder,
            email,
            initial_password: generated.then_some(password),
        })
    }

    pub async fn shareholder_view(
        &self,
        principal: &Principal,
        id: ShareholderId,
    ) -> Result<ShareholderView, ApiError> {
        let shareholder = self
            .store
            .shareholder_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("shareholder not found".to_string()))?;
        auth::can_view_shareholder(principal, shareholder.user_id)?;
        self.view_of(shareholder).await
    }

    pub async fn shareholder_view_by_user(
        &self,
        principal: &Principal,
        user_id: UserId,
    ) -> Result<ShareholderView, ApiError> {
        let shareholder = self
            .store
            .shareholder_by_user(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("shareholder not found".to_string()))?;
        auth::can_view_shareholder(principal, shareholder.user_id)?;
        self.view_of(shareholder).await
    }

    pub async fn list_shareholders(
        &self,
        principal: &Principal,
    ) -> Result<Vec<ShareholderView>, ApiError> {
        auth::require_admin(principal)?;

        let shareholders = self.store.list_shareholders().await?;
        let issuances = self.store.list_issuances().await?;
        let breakdown = ownership_breakdown(&issuances);

        let mut views = Vec::with_capacity(shareholders.len());
        for shareholder in shareholders {
            let stake = breakdown.iter().find(|s| s.shareholder_id == shareholder.id);
            let email = self.email_of(shareholder.user_id).await?;
            views.push(ShareholderView {
                email,
                total_shares: stake.map_or(0, |s| s.total_shares),
                ownership_pct: stake.map_or(0.0, |s| s.ownership_pct),
                shareholder,
            });
        }
        Ok(views)
    }

    async fn view_of(&self, shareholder: Shareholder) -> Result<ShareholderView, ApiError> {
        let issuances = self.store.list_issuances().await?;
        let breakdown = ownership_breakdown(&issuances);
        let stake = breakdown.iter().find(|s| s.shareholder_id == shareholder.id);
        let email = self.email_of(shareholder.user_id).await?;
        Ok(ShareholderView {
            email,
            total_shares: stake.map_or(0, |s| s.total_shares),
            ownership_pct: stake.map_or(0.0, |s| s.ownership_pct),
            shareholder,
        })
    }

    async fn email_of(&self, user_id: UserId) -> Result<String, ApiError> {
        let user = self.store.user_by_id(user_id).await?.ok_or_else(|| {
            tracing::error!(%user_id, "shareholder linked to missing user account");
            ApiError::Internal
        })?;
        Ok(user.email)
    }

    // ---- issuance ledger ----

    pub async fn issue_shares(
        &self,
        principal: &Principal,
        req: NewIssuance,
    ) -> Result<ShareIssuance, ApiError> {
        auth::require_admin(principal)?;

        let shareholder = self
            .store
            .shareholder_by_id(req.shareholder_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("shareholder not found".to_string()))?;

        let account = self.store.user_by_id(shareholder.user_id).await?;
        if !account.is_some_and(|a| a.active) {
            return Err(ApiError::Validation(
                "cannot issue shares to a disabled account".to_string(),
            ));
        }

        let request = IssuanceRequest::new(
            shareholder.id,
            req.class,
            req.quantity,
            req.price_per_share_cents,
            req.notes,
        )?;

        let now = Utc::now();
        let issuance = ShareIssuance::create(request, principal.user_id, now);
        let audit = AuditEvent::new(
            Some(principal.user_id),
            AuditAction::SharesIssued,
            Some(format!("issuance/{}", issuance.id)),
            json!({
                "shareholder_id": shareholder.id,
                "class": issuance.class,
                "quantity": issuance.quantity,
                "certificate_number": issuance.certificate_number,
            }),
            now,
        );
        self.store.append_issuance(issuance.clone(), audit).await?;

        Ok(issuance)
    }

    /// Admins see the whole ledger; shareholders only their own rows.
    /// A shareholder with no registry entry gets an empty list, not an error.
    pub async fn list_issuances(
        &self,
        principal: &Principal,
    ) -> Result<Vec<ShareIssuance>, ApiError> {
        if principal.is_admin() {
            return Ok(self.store.list_issuances().await?);
        }
        match self.store.shareholder_by_user(principal.user_id).await? {
            Some(shareholder) => Ok(self.store.list_issuances_for(shareholder.id).await?),
            None => Ok(Vec::new()),
        }
    }

    /// Existence is checked before access, so a shareholder probing another
    /// holder's issuance gets `forbidden`, never a masking `not_found`.
    pub async fn get_issuance(
        &self,
        principal: &Principal,
        id: IssuanceId,
    ) -> Result<ShareIssuance, ApiError> {
        let issuance = self
            .store
            .issuance_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("issuance not found".to_string()))?;

        let owner = self
            .store
            .shareholder_by_id(issuance.shareholder_id)
            .await?
            .ok_or_else(|| {
                tracing::error!(issuance = %issuance.id, "issuance references missing shareholder");
                ApiError::Internal
            })?;
        auth::can_view_issuance(principal, owner.user_id)?;

        Ok(issuance)
    }

    // ---- certificates ----

    /// Render the PDF certificate for an issuance. Access rules are the
    /// same as [`Self::get_issuance`]. Rendering is pure, so repeated calls
    /// return byte-identical documents.
    pub async fn render_certificate(
        &self,
        principal: &Principal,
        id: IssuanceId,
    ) -> Result<(ShareIssuance, Vec<u8>), ApiError> {
        let issuance = self.get_issuance(principal, id).await?;
        let holder = self
            .store
            .shareholder_by_id(issuance.shareholder_id)
            .await?
            .ok_or(ApiError::Internal)?;

        let data = CertificateData::from_issuance(&issuance, holder.full_name, &self.company_name);
        let pdf = render_certificate(&data);

        self.audit(AuditEvent::new(
            Some(principal.user_id),
            AuditAction::CertificateRendered,
            Some(format!("issuance/{}", issuance.id)),
            json!({ "certificate_number": issuance.certificate_number }),
            Utc::now(),
        ))
        .await;

        Ok((issuance, pdf))
    }

    // ---- audit trail ----

    pub async fn list_audit(&self, principal: &Principal) -> Result<Vec<AuditEvent>, ApiError> {
        auth::require_admin(principal)?;
        Ok(self.store.list_audit().await?)
    }

    /// Best-effort audit append. Failures are logged, never propagated;
    /// only ledger writes insist on their audit event landing atomically.
    async fn audit(&self, event: AuditEvent) {
        if let Err(err) = self.store.append_audit(event).await {
            tracing::error!(error = %err, "failed to record audit event");
        }
    }

    // ---- health ----

    pub async fn healthy(&self) -> bool {
        self.store.ping().await.is_ok()
    }
}

fn internal(err: auth::PasswordError) -> ApiError {
    tracing::error!(error = %err, "password hashing failed");
    ApiError::Internal
}
