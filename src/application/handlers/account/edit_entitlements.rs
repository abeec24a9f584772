//! EditEntitlementsHandler - Command handler for adding or removing a
//! single app entitlement.
//!
//! Edits are idempotent: adding an app the account already has, or
//! removing one it doesn't, succeeds with a no-op flag and writes no
//! audit event.

use std::sync::Arc;

use crate::domain::account::{Account, AuditEvent, AuditEventKind};
use crate::domain::foundation::{AccountId, AppId, DomainError, Timestamp};
use crate::ports::{AccountRepository, AuditLog};

/// Which direction the edit goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementEdit {
    Add,
    Remove,
}

/// Command to edit one app entitlement.
#[derive(Debug, Clone)]
pub struct EditEntitlementsCommand {
    pub account_id: AccountId,
    pub app: String,
    pub edit: EntitlementEdit,
}

/// Result of an entitlement edit.
#[derive(Debug, Clone)]
pub struct EditEntitlementsResult {
    pub account: Account,
    /// `true` when the edit changed nothing.
    pub no_op: bool,
}

/// Handler for entitlement edits.
pub struct EditEntitlementsHandler {
    accounts: Arc<dyn AccountRepository>,
    audit_log: Arc<dyn AuditLog>,
}

impl EditEntitlementsHandler {
    pub fn new(accounts: Arc<dyn AccountRepository>, audit_log: Arc<dyn AuditLog>) -> Self {
        Self { accounts, audit_log }
    }

    pub async fn handle(
        &self,
        cmd: EditEntitlementsCommand,
    ) -> Result<EditEntitlementsResult, DomainError> {
        let app = AppId::new(&cmd.app)?;
        let now = Timestamp::now();

        let mut account = self
            .accounts
            .find_by_id(&cmd.account_id)
            .await?
            .ok_or_else(|| DomainError::account_not_found(cmd.account_id.to_string()))?;

        let (no_op, kind) = match cmd.edit {
            EntitlementEdit::Add => (
                account.add_app(app.clone()),
                AuditEventKind::EntitlementGranted { app: app.clone() },
            ),
            EntitlementEdit::Remove => (
                account.remove_app(&app),
                AuditEventKind::EntitlementRevoked { app: app.clone() },
            ),
        };

        if no_op {
            return Ok(EditEntitlementsResult { account, no_op: true });
        }

        self.accounts.update(&account).await?;

        let event = AuditEvent::for_account(account.id, account.subscription_status, kind, now);
        self.audit_log.append(&event).await?;

        tracing::info!(account_id = %account.id, app = app.as_str(), edit = ?cmd.edit, "entitlement edited");

        Ok(EditEntitlementsResult { account, no_op: false })
    }
}
