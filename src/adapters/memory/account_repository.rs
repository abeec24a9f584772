//! In-memory implementation of AccountRepository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::account::Account;
use crate::domain::foundation::{AccountId, DomainError, EmailAddress};
use crate::ports::AccountRepository;

/// In-memory account store keyed by id, with the email uniqueness the
/// persistent adapter gets from a constraint.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<AccountId, Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn insert(&self, account: &Account) -> Result<(), DomainError> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email == account.email) {
            return Err(DomainError::duplicate_account(account.email.as_str()));
        }
        accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn update(&self, account: &Account) -> Result<(), DomainError> {
        let mut accounts = self.accounts.write().await;
        match accounts.get_mut(&account.id) {
            Some(slot) => {
                *slot = account.clone();
                Ok(())
            }
            None => Err(DomainError::account_not_found(account.id.to_string())),
        }
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(id).cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Account>, DomainError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| &a.email == email).cloned())
    }

    async fn delete(&self, id: &AccountId) -> Result<(), DomainError> {
        let mut accounts = self.accounts.write().await;
        match accounts.remove(id) {
            Some(_) => Ok(()),
            None => Err(DomainError::account_not_found(id.to_string())),
        }
    }
}
