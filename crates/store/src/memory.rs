//! In-memory [`Store`] backend.
//!
//! Backs tests and local runs without a database. All maps live behind one
//! `RwLock` so the multi-row writes (`insert_shareholder`,
//! `append_issuance`) are atomic under the single guard.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use captable_auth::UserAccount;
use captable_audit::AuditEvent;
use captable_core::{IssuanceId, ShareholderId, UserId};
use captable_equity::{ShareIssuance, Shareholder};

use crate::{Store, StoreError};

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, UserAccount>,
    user_id_by_email: HashMap<String, UserId>,
    shareholders: HashMap<ShareholderId, Shareholder>,
    shareholder_id_by_user: HashMap<UserId, ShareholderId>,
    issuances: Vec<ShareIssuance>,
    audit: Vec<AuditEvent>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::corrupt("store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::corrupt("store lock poisoned"))
    }
}

impl Inner {
    fn insert_user_locked(&mut self, user: UserAccount) -> Result<(), StoreError> {
        if self.user_id_by_email.contains_key(&user.email) {
            return Err(StoreError::conflict(format!(
                "email already registered: {}",
                user.email
            )));
        }
        self.user_id_by_email.insert(user.email.clone(), user.id);
        self.users.insert(user.id, user);
        Ok(())
    }
}

fn newest_first_issuances(mut rows: Vec<ShareIssuance>) -> Vec<ShareIssuance> {
    rows.sort_by(|a, b| (b.issued_at, b.id).cmp(&(a.issued_at, a.id)));
    rows
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: UserAccount) -> Result<(), StoreError> {
        self.write()?.insert_user_locked(user)
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .user_id_by_email
            .get(email)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn insert_shareholder(
        &self,
        user: UserAccount,
        shareholder: Shareholder,
        audit: AuditEvent,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner.shareholder_id_by_user.contains_key(&shareholder.user_id) {
            return Err(StoreError::conflict(
                "user already linked to a shareholder".to_string(),
            ));
        }
        inner.insert_user_locked(user)?;
        inner
            .shareholder_id_by_user
            .insert(shareholder.user_id, shareholder.id);
        inner.shareholders.insert(shareholder.id, shareholder);
        inner.audit.push(audit);
        Ok(())
    }

    async fn shareholder_by_id(
        &self,
        id: ShareholderId,
    ) -> Result<Option<Shareholder>, StoreError> {
        Ok(self.read()?.shareholders.get(&id).cloned())
    }

    async fn shareholder_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Shareholder>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .shareholder_id_by_user
            .get(&user_id)
            .and_then(|id| inner.shareholders.get(id))
            .cloned())
    }

    async fn list_shareholders(&self) -> Result<Vec<Shareholder>, StoreError> {
        let mut rows: Vec<_> = self.read()?.shareholders.values().cloned().collect();
        rows.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(rows)
    }

    async fn append_issuance(
        &self,
        issuance: ShareIssuance,
        audit: AuditEvent,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner
            .issuances
            .iter()
            .any(|i| i.certificate_number == issuance.certificate_number)
        {
            return Err(StoreError::conflict(format!(
                "duplicate certificate number: {}",
                issuance.certificate_number
            )));
        }
        inner.issuances.push(issuance);
        inner.audit.push(audit);
        Ok(())
    }

    async fn issuance_by_id(
        &self,
        id: IssuanceId,
    ) -> Result<Option<ShareIssuance>, StoreError> {
        Ok(self
            .read()?
            .issuances
            .iter()
            .find(|i| i.id == id)
            .cloned())
    }

    async fn list_issuances(&self) -> Result<Vec<ShareIssuance>, StoreError> {
        Ok(newest_first_issuances(self.read()?.issuances.clone()))
    }

    async fn list_issuances_for(
        &self,
        shareholder_id: ShareholderId,
    ) -> Result<Vec<ShareIssuance>, StoreError> {
        let rows: Vec<_> = self
            .read()?
            .issuances
            .iter()
            .filter(|i| i.shareholder_id == shareholder_id)
            .cloned()
            .collect();
        Ok(newest_first_issuances(rows))
    }

    async fn append_audit(&self, event: AuditEvent) -> Result<(), StoreError> {
        self.write()?.audit.push(event);
        Ok(())
    }

    async fn list_audit(&self) -> Result<Vec<AuditEvent>, StoreError> {
        let mut rows = self.read()?.audit.clone();
        rows.sort_by(|a, b| (b.recorded_at, b.id).cmp(&(a.recorded_at, a.id)));
        Ok(rows)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.read().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use captable_audit::AuditAction;
    use captable_auth::Role;
    use captable_equity::{IssuanceRequest, ShareClass, ShareholderProfile};

    use super::*;

    fn account(email: &str) -> UserAccount {
        UserAccount::create(email, "$argon2id$stub".to_string(), Role::Shareholder, Utc::now())
            .unwrap()
    }

    fn holder(store_user: &UserAccount, name: &str) -> Shareholder {
        let profile = ShareholderProfile::new(name, None, None).unwrap();
        Shareholder::create(store_user.id, profile, Utc::now())
    }

    fn registered(action: AuditAction) -> AuditEvent {
        AuditEvent::new(None, action, None, serde_json::json!({}), Utc::now())
    }

    fn issuance_for(shareholder: &Shareholder, quantity: i64) -> ShareIssuance {
        let request =
            IssuanceRequest::new(shareholder.id, ShareClass::Common, quantity, 100, None)
                .unwrap();
        ShareIssuance::create(request, UserId::new(), Utc::now())
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        store.insert_user(account("a@example.com")).await.unwrap();
        let err = store.insert_user(account("a@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn shareholder_registration_is_atomic_on_conflict() {
        let store = MemoryStore::new();
        store.insert_user(account("taken@example.com")).await.unwrap();

        let user = account("taken@example.com");
        let shareholder = holder(&user, "Grace Hopper");
        let err = store
            .insert_shareholder(
                user,
                shareholder.clone(),
                registered(AuditAction::ShareholderCreated),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // Nothing from the failed registration is visible.
        assert!(store
            .shareholder_by_id(shareholder.id)
            .await
            .unwrap()
            .is_none());
        assert!(store.list_audit().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn issuances_list_newest_first() {
        let store = MemoryStore::new();
        let user = account("h@example.com");
        let shareholder = holder(&user, "Grace Hopper");
        store
            .insert_shareholder(
                user,
                shareholder.clone(),
                registered(AuditAction::ShareholderCreated),
            )
            .await
            .unwrap();

        let mut older = issuance_for(&shareholder, 10);
        older.issued_at = Utc::now() - Duration::days(1);
        let newer = issuance_for(&shareholder, 20);

        store
            .append_issuance(older.clone(), registered(AuditAction::SharesIssued))
            .await
            .unwrap();
        store
            .append_issuance(newer.clone(), registered(AuditAction::SharesIssued))
            .await
            .unwrap();

        let rows = store.list_issuances().await.unwrap();
        assert_eq!(rows[0].id, newer.id);
        assert_eq!(rows[1].id, older.id);
    }

    #[tokio::test]
    async fn issuance_append_pairs_with_audit() {
        let store = MemoryStore::new();
        let user = account("h@example.com");
        let shareholder = holder(&user, "Grace Hopper");
        store
            .insert_shareholder(
                user,
                shareholder.clone(),
                registered(AuditAction::ShareholderCreated),
            )
            .await
            .unwrap();

        store
            .append_issuance(
                issuance_for(&shareholder, 10),
                registered(AuditAction::SharesIssued),
            )
            .await
            .unwrap();

        let trail = store.list_audit().await.unwrap();
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].action, AuditAction::SharesIssued);
    }

    #[tokio::test]
    async fn lookup_misses_are_none_not_errors() {
        let store = MemoryStore::new();
        assert!(store.user_by_id(UserId::new()).await.unwrap().is_none());
        assert!(store
            .issuance_by_id(IssuanceId::new())
            .await
            .unwrap()
            .is_none());
        assert!(store
            .shareholder_by_user(UserId::new())
            .await
            .unwrap()
            .is_none());
    }
}
