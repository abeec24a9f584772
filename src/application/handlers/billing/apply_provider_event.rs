//! ApplyProviderEventHandler - Command handler for relay-delivered
//! subscription updates.
//!
//! The relay delivers at least once, so the handler is gated on the
//! audit log: the audit row claims the `provider_event_id` atomically
//! via `append_if_new`, and only the claim winner writes the account.
//! Deliveries that lose the claim, including concurrent ones, are
//! skipped without side effects. Failures are audited under the event
//! id too, so a retried failure deduplicates the same way a retried
//! success does.

use std::sync::Arc;

use crate::domain::account::{Account, AuditEvent, AuditEventKind};
use crate::domain::billing::ProviderEvent;
use crate::domain::foundation::{DomainError, EmailAddress, Timestamp};
use crate::ports::{AccountRepository, AuditLog};

/// Command carrying an already-verified provider event.
#[derive(Debug, Clone)]
pub struct ApplyProviderEventCommand {
    pub event: ProviderEvent,
}

/// Result of processing a provider event.
#[derive(Debug, Clone)]
pub struct ApplyProviderEventResult {
    /// `false` when the event id had already been processed.
    pub applied: bool,
    /// The updated account; `None` on an idempotent skip.
    pub account: Option<Account>,
}

/// Handler for provider subscription events.
pub struct ApplyProviderEventHandler {
    accounts: Arc<dyn AccountRepository>,
    audit_log: Arc<dyn AuditLog>,
}

impl ApplyProviderEventHandler {
    pub fn new(accounts: Arc<dyn AccountRepository>, audit_log: Arc<dyn AuditLog>) -> Self {
        Self { accounts, audit_log }
    }

    pub async fn handle(
        &self,
        cmd: ApplyProviderEventCommand,
    ) -> Result<ApplyProviderEventResult, DomainError> {
        let event = cmd.event;
        let now = Timestamp::now();

        // 1. Fast-path skip; the authoritative gate is the claim below
        if self
            .audit_log
            .contains_provider_event(&event.event_id)
            .await?
        {
            tracing::info!(event_id = %event.event_id, "provider event already processed, skipping");
            return Ok(ApplyProviderEventResult {
                applied: false,
                account: None,
            });
        }

        // 2. Resolve the account by the exact email the provider captured
        let email = EmailAddress::try_new(&event.email)
            .map_err(|e| DomainError::from(e).with_detail("event_id", &event.event_id))?;

        let Some(mut account) = self.accounts.find_by_email(&email).await? else {
            // Unknown account: claim the event id with the failure
            // record. A lost claim means another delivery already
            // handled this id.
            let failure = AuditEvent::unattributed(
                AuditEventKind::SubscriptionUpdateFailed {
                    email: event.email.clone(),
                    reason: "account not found".to_string(),
                },
                now,
            )
            .with_provider_event_id(&event.event_id);
            if !self.audit_log.append_if_new(&failure).await? {
                return Ok(ApplyProviderEventResult {
                    applied: false,
                    account: None,
                });
            }

            tracing::warn!(
                event_id = %event.event_id,
                "provider event for unknown account"
            );
            return Err(DomainError::account_not_found(event.email));
        };

        // 3. Compute the update on the in-memory copy
        let previous_status = account.apply_provider_update(
            event.status,
            event.subscription_ends_at,
            event.billing_interval,
            event.customer_ref.clone(),
            event.subscription_ref.clone(),
        );

        // 4. Claim the event id before touching the account row. Only
        //    the claim winner writes, so two in-flight deliveries of
        //    one id apply once.
        let audit = AuditEvent::for_account(
            account.id,
            account.subscription_status,
            AuditEventKind::SubscriptionUpdated {
                previous_status: Some(previous_status),
                new_status: account.subscription_status,
                subscription_ends_at: account.subscription_ends_at,
                billing_interval: account.billing_interval,
            },
            now,
        )
        .with_provider_event_id(&event.event_id);
        if !self.audit_log.append_if_new(&audit).await? {
            tracing::info!(
                event_id = %event.event_id,
                "provider event claimed by a concurrent delivery, skipping"
            );
            return Ok(ApplyProviderEventResult {
                applied: false,
                account: None,
            });
        }

        // 5. Persist the single-row account write
        self.accounts.update(&account).await?;

        tracing::info!(
            event_id = %event.event_id,
            account_id = %account.id,
            previous_status = previous_status.as_str(),
            new_status = account.subscription_status.as_str(),
            "provider event applied"
        );

        Ok(ApplyProviderEventResult {
            applied: true,
            account: Some(account),
        })
    }
}
