//! Shared coupon resolution and usage accounting.
//!
//! Both account creation and standalone redemption run the same pipeline:
//! normalize the code, resolve it against the registry (falling back to
//! the legacy hardcoded set), validate, and consume one use. The usage
//! increment is optimistic: it is guarded by the count read during
//! validation and retried on conflict, so a coupon with one remaining use
//! admits exactly one of two concurrent redeemers.

use std::collections::BTreeSet;

use crate::domain::coupon::{
    is_legacy_lifetime_code, Coupon, CouponCode, CouponKind, CouponRejection,
};
use crate::domain::foundation::{AppId, DomainError, ErrorCode, Timestamp};
use crate::ports::CouponRepository;

/// Bounded retries for the guarded usage increment.
const MAX_INCREMENT_RETRIES: u32 = 3;

/// A code resolved to something redeemable.
#[derive(Debug)]
pub(crate) enum ResolvedCoupon {
    /// A live registry row, validated at resolution time.
    Registry(Coupon),
    /// A legacy hardcoded lifetime code with no registry row. Grants all
    /// applications and is never counted.
    Legacy(CouponCode),
}

impl ResolvedCoupon {
    pub(crate) fn code(&self) -> &CouponCode {
        match self {
            ResolvedCoupon::Registry(coupon) => &coupon.code,
            ResolvedCoupon::Legacy(code) => code,
        }
    }

    pub(crate) fn kind(&self) -> CouponKind {
        match self {
            ResolvedCoupon::Registry(coupon) => coupon.kind,
            ResolvedCoupon::Legacy(_) => CouponKind::Lifetime,
        }
    }

    /// Apps a lifetime redemption grants.
    pub(crate) fn granted_apps(&self) -> BTreeSet<AppId> {
        match self {
            ResolvedCoupon::Registry(coupon) => coupon.effective_granted_apps(),
            ResolvedCoupon::Legacy(_) => AppId::all_known().into_iter().collect(),
        }
    }
}

/// Resolves and validates a raw code string.
///
/// Registry rows win over the legacy set; a registry row that fails
/// validation is rejected even if the code also appears in the legacy
/// set.
///
/// # Errors
///
/// `InvalidCoupon` carrying a user-facing reason for malformed, unknown,
/// inactive, expired, or exhausted codes.
pub(crate) async fn resolve_coupon(
    coupons: &dyn CouponRepository,
    raw_code: &str,
    now: Timestamp,
) -> Result<ResolvedCoupon, DomainError> {
    let code = CouponCode::try_new(raw_code)
        .map_err(|_| DomainError::invalid_coupon(CouponRejection::NotFound.user_message()))?;

    match coupons.find_by_code(&code).await? {
        Some(coupon) => {
            coupon
                .check_redeemable(now)
                .map_err(|rejection| DomainError::invalid_coupon(rejection.user_message()))?;
            Ok(ResolvedCoupon::Registry(coupon))
        }
        None if is_legacy_lifetime_code(&code) => Ok(ResolvedCoupon::Legacy(code)),
        None => Err(DomainError::invalid_coupon(
            CouponRejection::NotFound.user_message(),
        )),
    }
}

/// Consumes one use of a resolved coupon.
///
/// Legacy codes are uncounted no-ops. Registry rows go through the
/// guarded increment: on conflict the row is re-read and re-validated
/// before retrying, so a use freed up or consumed by a concurrent writer
/// is observed.
///
/// # Errors
///
/// - `InvalidCoupon` if re-validation after a conflict fails
/// - `ConcurrencyConflict` if the retry budget is exhausted
pub(crate) async fn consume_usage(
    coupons: &dyn CouponRepository,
    resolved: &ResolvedCoupon,
    now: Timestamp,
) -> Result<(), DomainError> {
    let mut current = match resolved {
        ResolvedCoupon::Legacy(_) => return Ok(()),
        ResolvedCoupon::Registry(coupon) => coupon.clone(),
    };

    for _ in 0..MAX_INCREMENT_RETRIES {
        if coupons
            .increment_usage(&current.code, current.usage_count)
            .await?
        {
            return Ok(());
        }

        // Lost the race; re-read and re-validate before trying again.
        current = coupons
            .find_by_code(&current.code)
            .await?
            .ok_or_else(|| DomainError::invalid_coupon(CouponRejection::NotFound.user_message()))?;
        current
            .check_redeemable(now)
            .map_err(|rejection| DomainError::invalid_coupon(rejection.user_message()))?;
    }

    Err(DomainError::new(
        ErrorCode::ConcurrencyConflict,
        "Coupon usage update kept conflicting; please retry",
    ))
}
