//! Foundation types shared across the domain.

mod auth;
mod errors;
mod ids;
mod timestamp;

pub use auth::{AdminCredential, AuthError, ServiceToken};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{AccountId, AppId, AuditEventId, EmailAddress, KNOWN_APPS};
pub use timestamp::Timestamp;
