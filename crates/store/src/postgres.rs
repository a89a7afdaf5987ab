//! Postgres-backed [`Store`].
//!
//! Schema lives in `schema.sql` next to this crate. Uniqueness (emails,
//! user links, certificate numbers) is enforced by database constraints and
//! surfaced as [`StoreError::Conflict`]; the paired writes run inside
//! transactions.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use captable_auth::{Role, UserAccount};
use captable_audit::{AuditAction, AuditEvent};
use captable_core::{AuditEventId, IssuanceId, ShareholderId, UserId};
use captable_equity::{ShareClass, ShareIssuance, Shareholder};

use crate::{Store, StoreError};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn conflict_on_unique(err: sqlx::Error, what: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::conflict(format!("{what} already exists"))
        }
        _ => StoreError::Database(err),
    }
}

fn user_from_row(row: &PgRow) -> Result<UserAccount, StoreError> {
    let role: String = row.try_get("role")?;
    let role = role
        .parse::<Role>()
        .map_err(|e| StoreError::corrupt(e.to_string()))?;
    Ok(UserAccount {
        id: UserId::from(row.try_get::<Uuid, _>("id")?),
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn shareholder_from_row(row: &PgRow) -> Result<Shareholder, StoreError> {
    Ok(Shareholder {
        id: ShareholderId::from(row.try_get::<Uuid, _>("id")?),
        user_id: UserId::from(row.try_get::<Uuid, _>("user_id")?),
        full_name: row.try_get("full_name")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        created_at: row.try_get("created_at")?,
    })
}

fn issuance_from_row(row: &PgRow) -> Result<ShareIssuance, StoreError> {
    let class: String = row.try_get("class")?;
    let class = class
        .parse::<ShareClass>()
        .map_err(|e| StoreError::corrupt(e.to_string()))?;
    Ok(ShareIssuance {
        id: IssuanceId::from(row.try_get::<Uuid, _>("id")?),
        shareholder_id: ShareholderId::from(row.try_get::<Uuid, _>("shareholder_id")?),
        class,
        quantity: row.try_get("quantity")?,
        price_per_share_cents: row.try_get("price_per_share_cents")?,
        certificate_number: row.try_get("certificate_number")?,
        issued_at: row.try_get("issued_at")?,
        issued_by: UserId::from(row.try_get::<Uuid, _>("issued_by")?),
        notes: row.try_get("notes")?,
    })
}

fn audit_from_row(row: &PgRow) -> Result<AuditEvent, StoreError> {
    let action: String = row.try_get("action")?;
    let action = action
        .parse::<AuditAction>()
        .map_err(|e| StoreError::corrupt(e.to_string()))?;
    Ok(AuditEvent {
        id: AuditEventId::from(row.try_get::<Uuid, _>("id")?),
        actor: row
            .try_get::<Option<Uuid>, _>("actor")?
            .map(UserId::from),
        action,
        entity: row.try_get("entity")?,
        detail: row.try_get("detail")?,
        recorded_at: row.try_get("recorded_at")?,
    })
}

const INSERT_USER: &str = "INSERT INTO users \
    (id, email, password_hash, role, active, created_at) \
    VALUES ($1, $2, $3, $4, $5, $6)";

const INSERT_SHAREHOLDER: &str = "INSERT INTO shareholders \
    (id, user_id, full_name, phone, address, created_at) \
    VALUES ($1, $2, $3, $4, $5, $6)";

const INSERT_ISSUANCE: &str = "INSERT INTO share_issuances \
    (id, shareholder_id, class, quantity, price_per_share_cents, \
     certificate_number, issued_at, issued_by, notes) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)";

const INSERT_AUDIT: &str = "INSERT INTO audit_events \
    (id, actor, action, entity, detail, recorded_at) \
    VALUES ($1, $2, $3, $4, $5, $6)";

const SELECT_USER: &str =
    "SELECT id, email, password_hash, role, active, created_at FROM users";

const SELECT_SHAREHOLDER: &str =
    "SELECT id, user_id, full_name, phone, address, created_at FROM shareholders";

const SELECT_ISSUANCE: &str = "SELECT id, shareholder_id, class, quantity, \
    price_per_share_cents, certificate_number, issued_at, issued_by, notes \
    FROM share_issuances";

fn bind_user<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    user: &'q UserAccount,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.active)
        .bind(user.created_at)
}

fn bind_audit<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    event: &'q AuditEvent,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(event.id.as_uuid())
        .bind(event.actor.map(Uuid::from))
        .bind(event.action.as_str())
        .bind(&event.entity)
        .bind(&event.detail)
        .bind(event.recorded_at)
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: UserAccount) -> Result<(), StoreError> {
        bind_user(sqlx::query(INSERT_USER), &user)
            .execute(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "email"))?;
        Ok(())
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_USER} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_USER} WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn insert_shareholder(
        &self,
        user: UserAccount,
        shareholder: Shareholder,
        audit: AuditEvent,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        bind_user(sqlx::query(INSERT_USER), &user)
            .execute(&mut *tx)
            .await
            .map_err(|e| conflict_on_unique(e, "email"))?;
        sqlx::query(INSERT_SHAREHOLDER)
            .bind(shareholder.id.as_uuid())
            .bind(shareholder.user_id.as_uuid())
            .bind(&shareholder.full_name)
            .bind(&shareholder.phone)
            .bind(&shareholder.address)
            .bind(shareholder.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| conflict_on_unique(e, "shareholder link"))?;
        bind_audit(sqlx::query(INSERT_AUDIT), &audit)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn shareholder_by_id(
        &self,
        id: ShareholderId,
    ) -> Result<Option<Shareholder>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_SHAREHOLDER} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(shareholder_from_row).transpose()
    }

    async fn shareholder_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Shareholder>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_SHAREHOLDER} WHERE user_id = $1"))
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(shareholder_from_row).transpose()
    }

    async fn list_shareholders(&self) -> Result<Vec<Shareholder>, StoreError> {
        let rows = sqlx::query(&format!(
            "{SELECT_SHAREHOLDER} ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(shareholder_from_row).collect()
    }

    async fn append_issuance(
        &self,
        issuance: ShareIssuance,
        audit: AuditEvent,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(INSERT_ISSUANCE)
            .bind(issuance.id.as_uuid())
            .bind(issuance.shareholder_id.as_uuid())
            .bind(issuance.class.as_str())
            .bind(issuance.quantity)
            .bind(issuance.price_per_share_cents)
            .bind(&issuance.certificate_number)
            .bind(issuance.issued_at)
            .bind(issuance.issued_by.as_uuid())
            .bind(&issuance.notes)
            .execute(&mut *tx)
            .await
            .map_err(|e| conflict_on_unique(e, "certificate number"))?;
        bind_audit(sqlx::query(INSERT_AUDIT), &audit)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn issuance_by_id(
        &self,
        id: IssuanceId,
    ) -> Result<Option<ShareIssuance>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_ISSUANCE} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(issuance_from_row).transpose()
    }

    async fn list_issuances(&self) -> Result<Vec<ShareIssuance>, StoreError> {
        let rows = sqlx::query(&format!(
            "{SELECT_ISSUANCE} ORDER BY issued_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(issuance_from_row).collect()
    }

    async fn list_issuances_for(
        &self,
        shareholder_id: ShareholderId,
    ) -> Result<Vec<ShareIssuance>, StoreError> {
        let rows = sqlx::query(&format!(
            "{SELECT_ISSUANCE} WHERE shareholder_id = $1 ORDER BY issued_at DESC, id DESC"
        ))
        .bind(shareholder_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(issuance_from_row).collect()
    }

    async fn append_audit(&self, event: AuditEvent) -> Result<(), StoreError> {
        bind_audit(sqlx::query(INSERT_AUDIT), &event)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_audit(&self) -> Result<Vec<AuditEvent>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, actor, action, entity, detail, recorded_at \
             FROM audit_events ORDER BY recorded_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(audit_from_row).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
