//! CheckAccessHandler - Query handler for per-app access decisions.
//!
//! Thin wrapper over the pure entitlement resolver: loads the account by
//! email and evaluates. An unknown account is a denial, not an error, so
//! client apps get one uniform decision shape.

use std::sync::Arc;

use crate::domain::account::{evaluate_access, AccessDecision};
use crate::domain::foundation::{AppId, DomainError, EmailAddress, Timestamp};
use crate::ports::AccountRepository;

/// Query for an access decision.
#[derive(Debug, Clone)]
pub struct CheckAccessQuery {
    pub email: String,
    pub app: String,
}

/// Handler for access checks.
pub struct CheckAccessHandler {
    accounts: Arc<dyn AccountRepository>,
}

impl CheckAccessHandler {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    pub async fn handle(&self, query: CheckAccessQuery) -> Result<AccessDecision, DomainError> {
        let email = EmailAddress::try_new(&query.email)?;
        let app = AppId::new(&query.app)?;
        let now = Timestamp::now();

        let account = self.accounts.find_by_email(&email).await?;
        Ok(evaluate_access(account.as_ref(), &app, now))
    }
}
