//! PostgreSQL implementation of AuditLog.
//!
//! Event payloads land in a JSONB column carrying the tagged kind, with
//! the event type and provider dedup key broken out into indexed columns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::account::{AuditEvent, AuditEventKind, SubscriptionStatus};
use crate::domain::foundation::{AccountId, AuditEventId, DomainError, ErrorCode, Timestamp};
use crate::ports::AuditLog;

pub struct PostgresAuditLog {
    pool: PgPool,
}

impl PostgresAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an audit event.
#[derive(Debug, sqlx::FromRow)]
struct AuditEventRow {
    id: Uuid,
    account_id: Option<Uuid>,
    payload: serde_json::Value,
    subscription_status: Option<String>,
    provider_event_id: Option<String>,
    occurred_at: DateTime<Utc>,
}

impl TryFrom<AuditEventRow> for AuditEvent {
    type Error = DomainError;

    fn try_from(row: AuditEventRow) -> Result<Self, Self::Error> {
        let kind: AuditEventKind = serde_json::from_value(row.payload)
            .map_err(|e| invalid_column("payload", &e.to_string()))?;

        let subscription_status = row
            .subscription_status
            .as_deref()
            .map(|s| {
                SubscriptionStatus::parse(s).ok_or_else(|| invalid_column("subscription_status", s))
            })
            .transpose()?;

        Ok(AuditEvent {
            id: AuditEventId::from_uuid(row.id),
            account_id: row.account_id.map(AccountId::from_uuid),
            kind,
            subscription_status,
            provider_event_id: row.provider_event_id,
            occurred_at: Timestamp::from_datetime(row.occurred_at),
        })
    }
}

fn invalid_column(column: &str, detail: &str) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid {} value: {}", column, detail),
    )
}

#[async_trait]
impl AuditLog for PostgresAuditLog {
    async fn append(&self, event: &AuditEvent) -> Result<(), DomainError> {
        let payload = serde_json::to_value(&event.kind)
            .map_err(|e| DomainError::database(format!("Failed to encode audit payload: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO audit_events (
                id, account_id, event_type, payload, subscription_status,
                provider_event_id, occurred_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(event.account_id.map(|id| *id.as_uuid()))
        .bind(event.event_type())
        .bind(payload)
        .bind(event.subscription_status.map(|s| s.as_str()))
        .bind(&event.provider_event_id)
        .bind(*event.occurred_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to append audit event: {}", e)))?;

        Ok(())
    }

    async fn append_if_new(&self, event: &AuditEvent) -> Result<bool, DomainError> {
        let payload = serde_json::to_value(&event.kind)
            .map_err(|e| DomainError::database(format!("Failed to encode audit payload: {}", e)))?;

        // The partial unique index on provider_event_id arbitrates
        // concurrent claims; a conflicting insert affects zero rows.
        let result = sqlx::query(
            r#"
            INSERT INTO audit_events (
                id, account_id, event_type, payload, subscription_status,
                provider_event_id, occurred_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (provider_event_id) WHERE provider_event_id IS NOT NULL
            DO NOTHING
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(event.account_id.map(|id| *id.as_uuid()))
        .bind(event.event_type())
        .bind(payload)
        .bind(event.subscription_status.map(|s| s.as_str()))
        .bind(&event.provider_event_id)
        .bind(*event.occurred_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to claim audit event: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn contains_provider_event(
        &self,
        provider_event_id: &str,
    ) -> Result<bool, DomainError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM audit_events WHERE provider_event_id = $1)",
        )
        .bind(provider_event_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to check provider event: {}", e)))
    }

    async fn events_for_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<AuditEvent>, DomainError> {
        let rows: Vec<AuditEventRow> = sqlx::query_as(
            r#"
            SELECT id, account_id, payload, subscription_status,
                   provider_event_id, occurred_at
            FROM audit_events
            WHERE account_id = $1
            ORDER BY occurred_at ASC
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load audit events: {}", e)))?;

        rows.into_iter().map(AuditEvent::try_from).collect()
    }
}
