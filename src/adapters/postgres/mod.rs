//! PostgreSQL adapter implementations.
//!
//! Runtime-checked sqlx queries with `FromRow` row structs converted
//! into aggregates via `TryFrom`. Schema lives in `migrations/`.

mod account_repository;
mod audit_log;
mod coupon_repository;

pub use account_repository::PostgresAccountRepository;
pub use audit_log::PostgresAuditLog;
pub use coupon_repository::PostgresCouponRepository;
