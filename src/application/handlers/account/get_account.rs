//! GetAccountHandler - Query handler for account details by email.

use std::sync::Arc;

use crate::domain::account::{Account, SubscriptionStatus};
use crate::domain::foundation::{DomainError, EmailAddress, Timestamp};
use crate::ports::AccountRepository;

/// Query for an account by its exact email.
#[derive(Debug, Clone)]
pub struct GetAccountQuery {
    pub email: String,
}

/// Account view with the effective status applied.
#[derive(Debug, Clone)]
pub struct AccountView {
    pub account: Account,
    /// Stored status with lazy trial expiry applied.
    pub effective_status: SubscriptionStatus,
}

/// Handler for the account detail query.
pub struct GetAccountHandler {
    accounts: Arc<dyn AccountRepository>,
}

impl GetAccountHandler {
    pub fn new(accounts: Arc<dyn AccountRepository>) -> Self {
        Self { accounts }
    }

    pub async fn handle(&self, query: GetAccountQuery) -> Result<AccountView, DomainError> {
        let email = EmailAddress::try_new(&query.email)?;
        let now = Timestamp::now();

        let account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or_else(|| DomainError::account_not_found(email.as_str()))?;

        let effective_status = account.effective_status(now);
        Ok(AccountView {
            account,
            effective_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{AccountId, AppId, ErrorCode};
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    struct MockAccountRepository {
        account: Mutex<Option<Account>>,
    }

    #[async_trait]
    impl AccountRepository for MockAccountRepository {
        async fn insert(&self, account: &Account) -> Result<(), DomainError> {
            *self.account.lock().unwrap() = Some(account.clone());
            Ok(())
        }

        async fn update(&self, account: &Account) -> Result<(), DomainError> {
            *self.account.lock().unwrap() = Some(account.clone());
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

    fn apps(names: &[&str]) -> BTreeSet<AppId> {
        names.iter().map(|n| AppId::new(*n).unwrap()).collect()
    }

    #[tokio::test]
    async fn returns_effective_status_for_lapsed_trial() {
        let mut account = Account::create_trial(
            AccountId::new(),
            EmailAddress::try_new("late@example.com").unwrap(),
            None,
            apps(&["books"]),
            Timestamp::now().minus_days(10),
        )
        .unwrap();
        account.trial_expires_at = Some(Timestamp::now().minus_days(3));
        let repo = Arc::new(MockAccountRepository {
            account: Mutex::new(Some(account)),
        });

        let view = GetAccountHandler::new(repo)
            .handle(GetAccountQuery {
                email: "late@example.com".to_string(),
            })
            .await
            .unwrap();

        // Stored status is untouched; the view derives expiry.
        assert_eq!(view.account.subscription_status, SubscriptionStatus::Trial);
        assert_eq!(view.effective_status, SubscriptionStatus::Expired);
    }

    #[tokio::test]
    async fn unknown_email_is_not_found() {
        let repo = Arc::new(MockAccountRepository {
            account: Mutex::new(None),
        });

        let err = GetAccountHandler::new(repo)
            .handle(GetAccountQuery {
                email: "ghost@example.com".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::AccountNotFound);
    }
}
