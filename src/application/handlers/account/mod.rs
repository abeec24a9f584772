//! Account handlers.
//!
//! Command and query handlers for the account lifecycle:
//!
//! ## Commands
//! - Creating accounts (trial by default, lifetime via coupon)
//! - Granting lifetime access (admin)
//! - Editing per-app entitlements
//! - Deleting accounts
//! - Recording logins and onboarding completion
//!
//! ## Queries
//! - Get account details by email
//! - Check per-app access

mod check_access;
mod complete_onboarding;
mod create_account;
mod delete_account;
mod edit_entitlements;
mod get_account;
mod grant_lifetime;
mod record_login;

// Commands
pub use complete_onboarding::{CompleteOnboardingCommand, CompleteOnboardingHandler};
pub use create_account::{CreateAccountCommand, CreateAccountHandler, CreateAccountResult};
pub use delete_account::{DeleteAccountCommand, DeleteAccountHandler};
pub use edit_entitlements::{
    EditEntitlementsCommand, EditEntitlementsHandler, EditEntitlementsResult, EntitlementEdit,
};
pub use grant_lifetime::{GrantLifetimeCommand, GrantLifetimeHandler, GrantLifetimeResult};
pub use record_login::{RecordLoginCommand, RecordLoginHandler};

// Queries
pub use check_access::{CheckAccessHandler, CheckAccessQuery};
pub use get_account::{AccountView, GetAccountHandler, GetAccountQuery};
