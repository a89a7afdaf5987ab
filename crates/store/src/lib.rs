//! `captable-store` — persistence boundary.
//!
//! A single [`Store`] trait fronts two backends: [`MemoryStore`] for tests
//! and secret-free local runs, and [`PgStore`] for production. Writes that
//! the ledger treats as one fact (an issuance and its audit event, a
//! shareholder with their login account) go through single trait methods so
//! each backend can make them atomic its own way.

pub mod error;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use captable_auth::UserAccount;
use captable_audit::AuditEvent;
use captable_core::{IssuanceId, ShareholderId, UserId};
use captable_equity::{ShareIssuance, Shareholder};

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence operations the service layer is written against.
///
/// Ordering contract: issuance listings are newest-first by `issued_at`,
/// with the id as tiebreak; audit listings are newest-first by
/// `recorded_at`. Backends enforce this, callers never re-sort.
#[async_trait]
pub trait Store: Send + Sync {
    // ---- users ----

    /// Persist a standalone login account (admin bootstrap). Fails with
    /// [`StoreError::Conflict`] when the email is already registered.
    async fn insert_user(&self, user: UserAccount) -> Result<(), StoreError>;

    async fn user_by_id(&self, id: UserId) -> Result<Option<UserAccount>, StoreError>;

    /// Lookup by normalized (lowercased) email.
    async fn user_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError>;

    // ---- shareholders ----

    /// Atomically persist a new shareholder, the login account provisioned
    /// for them, and the audit event recording the registration. Either all
    /// three land or none do.
    async fn insert_shareholder(
        &self,
        user: UserAccount,
        shareholder: Shareholder,
        audit: AuditEvent,
    ) -> Result<(), StoreError>;

    async fn shareholder_by_id(
        &self,
        id: ShareholderId,
    ) -> Result<Option<Shareholder>, StoreError>;

    async fn shareholder_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Shareholder>, StoreError>;

    async fn list_shareholders(&self) -> Result<Vec<Shareholder>, StoreError>;

    // ---- issuance ledger ----

    /// Append to the ledger together with its audit event. The ledger is
    /// append-only; there is no update or delete counterpart.
    async fn append_issuance(
        &self,
        issuance: ShareIssuance,
        audit: AuditEvent,
    ) -> Result<(), StoreError>;

    async fn issuance_by_id(
        &self,
        id: IssuanceId,
    ) -> Result<Option<ShareIssuance>, StoreError>;

    async fn list_issuances(&self) -> Result<Vec<ShareIssuance>, StoreError>;

    async fn list_issuances_for(
        &self,
        shareholder_id: ShareholderId,
    ) -> Result<Vec<ShareIssuance>, StoreError>;

    // ---- audit trail ----

    async fn append_audit(&self, event: AuditEvent) -> Result<(), StoreError>;

    async fn list_audit(&self) -> Result<Vec<AuditEvent>, StoreError>;

    // ---- health ----

    /// Cheap liveness check against the backend.
    async fn ping(&self) -> Result<(), StoreError>;
}
