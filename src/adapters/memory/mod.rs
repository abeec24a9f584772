//! In-memory adapter implementations.
//!
//! Backed by `tokio::sync::RwLock`. These carry the same concurrency
//! semantics as the persistent adapters (unique email on insert, guarded
//! usage increments), so the integration tests exercise the real
//! contracts.

mod account_repository;
mod audit_log;
mod coupon_repository;

pub use account_repository::InMemoryAccountRepository;
pub use audit_log::InMemoryAuditLog;
pub use coupon_repository::InMemoryCouponRepository;
