//! RecordLoginHandler - Command handler stamping `last_login_at`.
//!
//! Not audit-logged; login timestamps are bookkeeping, not lifecycle.

use std::sync::Arc;

use crate::domain::foundation::{AccountId, DomainError, Timestamp};
use crate::ports::AccountRepository;

/// Command recording a successful login.
#[derive(Debug, Clone)]
pub struct RecordLoginCommand {
    pub account_id: AccountId,
}

/// Handler for login stamps.
pub struct RecordLoginHandler {
    accounts: Arc<dyn AccountRepository>,
}

impl RecordLoginHandler {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    pub async fn handle(&self, cmd: RecordLoginCommand) -> Result<(), DomainError> {
        let mut account = self
            .accounts
            .find_by_id(&cmd.account_id)
            .await?
            .ok_or_else(|| DomainError::account_not_found(cmd.account_id.to_string()))?;

        account.record_login(Timestamp::now());
        self.accounts.update(&account).await
    }
}
