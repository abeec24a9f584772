//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `AccountRepository` - Account aggregate persistence
//! - `CouponRepository` - Coupon registry reads and guarded usage counting
//! - `AuditLog` - Append-only audit trail and webhook idempotency lookups

mod account_repository;
mod audit_log;
mod coupon_repository;

pub use account_repository::AccountRepository;
pub use audit_log::AuditLog;
pub use coupon_repository::CouponRepository;
