//! GrantLifetimeHandler - Admin command for granting lifetime access.
//!
//! Credential verification happens at the transport edge (the admin
//! token extractor); by the time this handler runs the caller is
//! trusted. If no account exists for the email, one is created directly
//! in lifetime status and the result says so.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::account::{Account, AuditEvent, AuditEventKind};
use crate::domain::foundation::{AccountId, AppId, DomainError, EmailAddress, Timestamp};
use crate::ports::{AccountRepository, AuditLog};

/// Command to grant lifetime access to an email.
#[derive(Debug, Clone)]
pub struct GrantLifetimeCommand {
    pub email: String,
    /// Apps to entitle; `None` grants the full catalogue.
    pub apps: Option<Vec<String>>,
}

/// Result of a lifetime grant.
#[derive(Debug, Clone)]
pub struct GrantLifetimeResult {
    pub account: Account,
    /// `true` when the grant created the account.
    pub created: bool,
}

/// Handler for admin lifetime grants.
pub struct GrantLifetimeHandler {
    accounts: Arc<dyn AccountRepository>,
    audit_log: Arc<dyn AuditLog>,
}

impl GrantLifetimeHandler {
    pub fn new(accounts: Arc<dyn AccountRepository>, audit_log: Arc<dyn AuditLog>) -> Self {
        Self { accounts, audit_log }
    }

    pub async fn handle(
        &self,
        cmd: GrantLifetimeCommand,
    ) -> Result<GrantLifetimeResult, DomainError> {
        let now = Timestamp::now();
        let email = EmailAddress::try_new(&cmd.email)?;

        let apps: BTreeSet<AppId> = match &cmd.apps {
            Some(raw) => raw
                .iter()
                .map(|a| AppId::new(a))
                .collect::<Result<_, _>>()?,
            None => AppId::all_known().into_iter().collect(),
        };

        let (account, created, previous_status) =
            match self.accounts.find_by_email(&email).await? {
                Some(mut account) => {
                    let previous = account.grant_lifetime(apps, None, now)?;
                    self.accounts.update(&account).await?;
                    (account, false, Some(previous))
                }
                None => {
                    let account =
                        Account::create_lifetime(AccountId::new(), email, None, apps, now)?;
                    self.accounts.insert(&account).await?;
                    (account, true, None)
                }
            };

        let event = AuditEvent::for_account(
            account.id,
            account.subscription_status,
            AuditEventKind::SubscriptionUpdated {
                previous_status,
                new_status: account.subscription_status,
                subscription_ends_at: None,
                billing_interval: None,
            },
            now,
        );
        self.audit_log.append(&event).await?;

        tracing::info!(account_id = %account.id, created, "lifetime access granted");

        Ok(GrantLifetimeResult { account, created })
    }
}
