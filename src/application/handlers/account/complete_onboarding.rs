//! CompleteOnboardingHandler - Command handler marking an app's
//! onboarding flow as finished.
//!
//! Idempotent like entitlement edits; repeat completions are silent.

use std::sync::Arc;

use crate::domain::foundation::{AccountId, AppId, DomainError};
use crate::ports::AccountRepository;

/// Command marking onboarding complete for one app.
#[derive(Debug, Clone)]
pub struct CompleteOnboardingCommand {
    pub account_id: AccountId,
    pub app: String,
}

/// Handler for onboarding completion.
pub struct CompleteOnboardingHandler {
    accounts: Arc<dyn AccountRepository>,
}

impl CompleteOnboardingHandler {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    pub async fn handle(&self, cmd: CompleteOnboardingCommand) -> Result<(), DomainError> {
        let app = AppId::new(&cmd.app)?;

        let mut account = self
            .accounts
            .find_by_id(&cmd.account_id)
            .await?
            .ok_or_else(|| DomainError::account_not_found(cmd.account_id.to_string()))?;

        if account.onboarding_completed_for(&app) {
            return Ok(());
        }

        account.complete_onboarding(app);
        self.accounts.update(&account).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::Account;
    use crate::domain::foundation::{EmailAddress, Timestamp};
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    struct MockAccountRepository {
        account: Mutex<Option<Account>>,
        updates: Mutex<u32>,
    }

    #[async_trait]
    impl AccountRepository for MockAccountRepository {
        async fn insert(&self, account: &Account) -> Result<(), DomainError> {
            *self.account.lock().unwrap() = Some(account.clone());
            Ok(())
        }

        async fn update(&self, account: &Account) -> Result<(), DomainError> {
            *self.account.lock().unwrap() = Some(account.clone());
            *self.updates.lock().unwrap() += 1;
            Ok(())
        }

        async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
            let account = self.account.lock().unwrap();
            Ok(account.as_ref().filter(|a| &a.id == id).cloned())
        }

        async fn find_by_email(
            &self,
            email: &EmailAddress,
        ) -> Result<Option<Account>, DomainError> {
            let account = self.account.lock().unwrap();
            Ok(account.as_ref().filter(|a| &a.email == email).cloned())
        }

        async fn delete(&self, _id: &AccountId) -> Result<(), DomainError> {
            *self.account.lock().unwrap() = None;
            Ok(())
        }
    }

    #[tokio::test]
    async fn marks_onboarding_complete_once() {
        let apps: BTreeSet<AppId> = [AppId::new("books").unwrap()].into_iter().collect();
        let account = Account::create_trial(
            AccountId::new(),
            EmailAddress::try_new("user@example.com").unwrap(),
            None,
            apps,
            Timestamp::now(),
        )
        .unwrap();
        let id = account.id;
        let repo = Arc::new(MockAccountRepository {
            account: Mutex::new(Some(account)),
            updates: Mutex::new(0),
        });
        let handler = CompleteOnboardingHandler::new(repo.clone());

        handler
            .handle(CompleteOnboardingCommand {
                account_id: id,
                app: "books".to_string(),
            })
            .await
            .unwrap();
        // Second completion is a silent no-op with no write.
        handler
            .handle(CompleteOnboardingCommand {
                account_id: id,
                app: "books".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(*repo.updates.lock().unwrap(), 1);
        let stored = repo.account.lock().unwrap().clone().unwrap();
        assert!(stored.onboarding_completed_for(&AppId::new("books").unwrap()));
    }
}
