//! Audit log port - append-only trail of account lifecycle changes.
//!
//! Every mutation of consequence writes one event here. The log doubles
//! as the webhook idempotency store: a provider event id that already
//! appears in the log has been processed and must not be applied again.
//!
//! ## Why Webhook Idempotency Matters
//!
//! The payment relay delivers at least once. The same event arrives
//! multiple times after network timeouts, 5xx responses from our
//! endpoint, or a success response the relay never received. Deliveries
//! can also overlap in flight, so a read-then-write gate is not enough:
//! the webhook handler claims an event id with `append_if_new`, and only
//! the claim winner mutates the account.

use crate::domain::account::AuditEvent;
use crate::domain::foundation::{AccountId, DomainError};
use async_trait::async_trait;

/// Port for the append-only audit trail.
///
/// Implementations should index `provider_event_id` so the idempotency
/// lookup stays cheap on the webhook hot path.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append an event to the log.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn append(&self, event: &AuditEvent) -> Result<(), DomainError>;

    /// Append the event only if its `provider_event_id` has not been
    /// recorded yet.
    ///
    /// Returns `false` without appending when another event already
    /// carries the same id. The check and the append are one atomic
    /// step; concurrent claims of one id admit exactly one caller.
    /// Events without a `provider_event_id` always append.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn append_if_new(&self, event: &AuditEvent) -> Result<bool, DomainError>;

    /// Check whether a provider event id has already been recorded.
    ///
    /// Covers both applied updates and recorded failures; a failed
    /// delivery is still a processed delivery.
    async fn contains_provider_event(&self, provider_event_id: &str)
        -> Result<bool, DomainError>;

    /// All events recorded for an account, oldest first.
    async fn events_for_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<AuditEvent>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn audit_log_is_object_safe() {
        fn _accepts_dyn(_log: &dyn AuditLog) {}
    }
}
