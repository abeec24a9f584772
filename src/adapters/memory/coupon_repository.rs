//! In-memory implementation of CouponRepository.
//!
//! The guarded increment runs under one write lock, giving the same
//! compare-and-set semantics the postgres adapter gets from a
//! conditional UPDATE.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::coupon::{Coupon, CouponCode};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::CouponRepository;

/// In-memory coupon registry keyed by normalized code.
#[derive(Default)]
pub struct InMemoryCouponRepository {
    coupons: RwLock<HashMap<CouponCode, Coupon>>,
}

impl InMemoryCouponRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn not_found(code: &CouponCode) -> DomainError {
        DomainError::new(
            ErrorCode::CouponNotFound,
            format!("No coupon with code {}", code.as_str()),
        )
    }
}

#[async_trait]
impl CouponRepository for InMemoryCouponRepository {
    async fn find_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>, DomainError> {
        let coupons = self.coupons.read().await;
        Ok(coupons.get(code).cloned())
    }

    async fn save(&self, coupon: &Coupon) -> Result<(), DomainError> {
        let mut coupons = self.coupons.write().await;
        coupons.insert(coupon.code.clone(), coupon.clone());
        Ok(())
    }

    async fn set_active(&self, code: &CouponCode, active: bool) -> Result<(), DomainError> {
        let mut coupons = self.coupons.write().await;
        match coupons.get_mut(code) {
            Some(coupon) => {
                coupon.active = active;
                Ok(())
            }
            None => Err(Self::not_found(code)),
        }
    }

    async fn increment_usage(
        &self,
        code: &CouponCode,
        expected_count: u32,
    ) -> Result<bool, DomainError> {
        let mut coupons = self.coupons.write().await;
        let coupon = coupons.get_mut(code).ok_or_else(|| Self::not_found(code))?;
        if coupon.usage_count != expected_count {
            return Ok(false);
        }
        coupon.usage_count += 1;
        Ok(true)
    }
}
