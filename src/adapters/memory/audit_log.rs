//! In-memory implementation of AuditLog.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::account::AuditEvent;
use crate::domain::foundation::{AccountId, DomainError};
use crate::ports::AuditLog;

/// Append-only in-memory audit trail.
#[derive(Default)]
pub struct InMemoryAuditLog {
    events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in append order. Test helper.
    pub async fn all_events(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn append(&self, event: &AuditEvent) -> Result<(), DomainError> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn append_if_new(&self, event: &AuditEvent) -> Result<bool, DomainError> {
        // Check and push under one write guard so concurrent claims of
        // the same id admit exactly one caller.
        let mut events = self.events.write().await;
        if let Some(id) = event.provider_event_id.as_deref() {
            if events
                .iter()
                .any(|e| e.provider_event_id.as_deref() == Some(id))
            {
                return Ok(false);
            }
        }
        events.push(event.clone());
        Ok(true)
    }

    async fn contains_provider_event(
        &self,
        provider_event_id: &str,
    ) -> Result<bool, DomainError> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .any(|e| e.provider_event_id.as_deref() == Some(provider_event_id)))
    }

    async fn events_for_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<AuditEvent>, DomainError> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .filter(|e| e.account_id.as_ref() == Some(account_id))
            .cloned()
            .collect())
    }
}
