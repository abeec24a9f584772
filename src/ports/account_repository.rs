//! Account repository port (write side).
//!
//! Defines the contract for persisting and retrieving Account aggregates.
//! Implementations handle the actual database operations.
//!
//! # Design
//!
//! - **Unique constraint**: At most one account per email, enforced by
//!   the store, not the caller
//! - **Exact-match lookup**: Email lookups are case-sensitive; the
//!   provider relay sends the address exactly as it was captured at
//!   purchase time

use crate::domain::account::Account;
use crate::domain::foundation::{AccountId, DomainError, EmailAddress};
use async_trait::async_trait;

/// Repository port for Account aggregate persistence.
///
/// Implementations must ensure:
/// - Unique email constraint on insert
/// - Full-row replacement on update (the aggregate is the unit of write)
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account.
    ///
    /// # Errors
    ///
    /// - `DuplicateAccount` if an account with this email already exists
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, account: &Account) -> Result<(), DomainError>;

    /// Update an existing account, replacing all mutable fields.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` if the account doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, account: &Account) -> Result<(), DomainError>;

    /// Find an account by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError>;

    /// Find an account by email, matched exactly (case-sensitive).
    ///
    /// Returns `None` if no account has this email.
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Account>, DomainError>;

    /// Delete an account permanently.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` if the account doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn delete(&self, id: &AccountId) -> Result<(), DomainError>;
}
