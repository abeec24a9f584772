//! Coupon repository port.
//!
//! Defines the contract for reading coupon rows and recording
//! redemptions. Coupons are seeded out-of-band; the engine only ever
//! toggles `active` and increments `usage_count`.
//!
//! ## Guarded Increments
//!
//! Usage limits must hold under concurrent redemption. Rather than
//! locking, `increment_usage` is conditional: it succeeds only when the
//! stored count still equals the count the caller read during
//! validation. A `false` return means another redemption landed first
//! and the caller must re-read and re-validate.

use crate::domain::coupon::{Coupon, CouponCode};
use crate::domain::foundation::DomainError;
use async_trait::async_trait;

/// Repository port for the coupon registry.
#[async_trait]
pub trait CouponRepository: Send + Sync {
    /// Find a coupon by its normalized code.
    ///
    /// Returns `None` if no row exists for the code.
    async fn find_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>, DomainError>;

    /// Insert or replace a coupon row.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, coupon: &Coupon) -> Result<(), DomainError>;

    /// Set the active flag on a coupon.
    ///
    /// # Errors
    ///
    /// - `CouponNotFound` if no row exists for the code
    /// - `DatabaseError` on persistence failure
    async fn set_active(&self, code: &CouponCode, active: bool) -> Result<(), DomainError>;

    /// Conditionally increment the usage count.
    ///
    /// Increments only if the stored count still equals
    /// `expected_count`. Returns `true` if the increment was applied,
    /// `false` if another writer got there first.
    ///
    /// # Errors
    ///
    /// - `CouponNotFound` if no row exists for the code
    /// - `DatabaseError` on persistence failure
    async fn increment_usage(
        &self,
        code: &CouponCode,
        expected_count: u32,
    ) -> Result<bool, DomainError>;
}
