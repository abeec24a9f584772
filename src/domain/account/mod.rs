//! Account aggregate, subscription status derivation, entitlement
//! resolution and the audit event taxonomy.

mod access;
mod aggregate;
mod events;
mod status;

pub use access::{evaluate_access, AccessDecision, AccessReason, PAST_DUE_GRACE_DAYS};
pub use aggregate::{Account, TRIAL_LENGTH_DAYS};
pub use events::{AuditEvent, AuditEventKind};
pub use status::{BillingInterval, SubscriptionStatus};
