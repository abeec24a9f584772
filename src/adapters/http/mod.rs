//! HTTP adapters - REST API implementations.
//!
//! Each domain module has its own HTTP adapter for endpoint exposure.

pub mod account;
pub mod billing;
pub mod error;
pub mod extract;

// Re-export key types for convenience
pub use account::account_router;
pub use account::AccountAppState;
pub use billing::billing_router;
pub use billing::BillingAppState;
pub use error::{ApiError, ErrorResponse};
