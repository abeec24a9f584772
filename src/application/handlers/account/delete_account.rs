//! DeleteAccountHandler - Command handler for permanent account removal.
//!
//! The terminal audit event is written before the row goes away, so the
//! trail keeps what the account was (status, entitlements, age) after
//! the ledger forgets it.

use std::sync::Arc;

use crate::domain::account::{AuditEvent, AuditEventKind};
use crate::domain::foundation::{AccountId, DomainError, Timestamp};
use crate::ports::{AccountRepository, AuditLog};

/// Command to delete an account.
#[derive(Debug, Clone)]
pub struct DeleteAccountCommand {
    pub account_id: AccountId,
    pub reason: Option<String>,
}

/// Handler for account deletion.
pub struct DeleteAccountHandler {
    accounts: Arc<dyn AccountRepository>,
    audit_log: Arc<dyn AuditLog>,
}

impl DeleteAccountHandler {
    pub fn new(accounts: Arc<dyn AccountRepository>, audit_log: Arc<dyn AuditLog>) -> Self {
        Self { accounts, audit_log }
    }

    pub async fn handle(&self, cmd: DeleteAccountCommand) -> Result<(), DomainError> {
        let now = Timestamp::now();

        let account = self
            .accounts
            .find_by_id(&cmd.account_id)
            .await?
            .ok_or_else(|| DomainError::account_not_found(cmd.account_id.to_string()))?;

        let event = AuditEvent::for_account(
            account.id,
            account.subscription_status,
            AuditEventKind::AccountDeleted {
                email: account.email.as_str().to_string(),
                status_at_deletion: account.effective_status(now),
                entitled_apps: account.entitled_apps.iter().cloned().collect(),
                account_age_days: account.age_days(now),
                reason: cmd.reason,
            },
            now,
        );
        self.audit_log.append(&event).await?;

        self.accounts.delete(&account.id).await?;

        tracing::info!(account_id = %account.id, "account deleted");
        Ok(())
    }
}
