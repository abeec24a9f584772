//! Coupon entity and validation rules.
//!
//! Rows are seeded out-of-band and mutated only by usage-count increments
//! and active/inactive toggling. Validation order is fixed: existence is
//! checked by the caller (registry lookup), then active, then expiry,
//! then usage - the first failing check wins.

use std::collections::{BTreeSet, HashSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AppId, Timestamp};

use super::CouponCode;

/// Lifetime codes that predate the registry. Honored only when the code
/// has no registry row; treated as lifetime across all applications and
/// never counted.
static LEGACY_LIFETIME_CODES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from(["FOUNDINGMEMBER", "LAUNCHTEAM", "FRIENDSANDFAMILY"])
});

/// Returns whether `code` is one of the legacy hardcoded lifetime codes.
pub fn is_legacy_lifetime_code(code: &CouponCode) -> bool {
    LEGACY_LIFETIME_CODES.contains(code.as_str())
}

/// What a coupon grants on redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouponKind {
    /// Terminal, non-expiring entitlement.
    Lifetime,

    /// Adds days to an account's trial window.
    TrialExtension { days: u32 },
}

/// Why a coupon cannot be redeemed.
///
/// Callers surface these as a single `InvalidCoupon` error; the variants
/// exist for the human-readable reason string and for tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum CouponRejection {
    /// No registry row and not a legacy code.
    NotFound,

    /// Disabled by an administrator.
    Inactive,

    /// The campaign window has closed.
    Expired { expired_at: Timestamp },

    /// Every permitted use has been consumed.
    UsageLimitReached { used: u32, limit: u32 },
}

impl CouponRejection {
    /// Human-readable reason suitable for rendering to the user.
    pub fn user_message(&self) -> String {
        match self {
            CouponRejection::NotFound => {
                "This code was not found. Please check it and try again.".to_string()
            }
            CouponRejection::Inactive => "This code is no longer active.".to_string(),
            CouponRejection::Expired { expired_at } => {
                format!("This code expired on {}.", expired_at.as_datetime().date_naive())
            }
            CouponRejection::UsageLimitReached { used, limit } => {
                format!("This code has been fully redeemed ({}/{} uses).", used, limit)
            }
        }
    }
}

impl std::fmt::Display for CouponRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

/// A promotional code row in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    /// Normalized unique code.
    pub code: CouponCode,

    /// What redemption grants.
    pub kind: CouponKind,

    /// Admin kill switch.
    pub active: bool,

    /// End of the campaign window, if bounded.
    pub expires_at: Option<Timestamp>,

    /// Maximum redemptions; `None` means unlimited.
    pub usage_limit: Option<u32>,

    /// Redemptions so far. Monotonically non-decreasing.
    pub usage_count: u32,

    /// Apps granted by a lifetime redemption; `None` means all
    /// applications.
    pub granted_apps: Option<BTreeSet<AppId>>,
}

impl Coupon {
    /// Creates an unlimited, unexpiring lifetime coupon.
    pub fn lifetime(code: CouponCode) -> Self {
        Self {
            code,
            kind: CouponKind::Lifetime,
            active: true,
            expires_at: None,
            usage_limit: None,
            usage_count: 0,
            granted_apps: None,
        }
    }

    /// Sets the usage limit.
    pub fn with_usage_limit(mut self, limit: u32) -> Self {
        self.usage_limit = Some(limit);
        self
    }

    /// Sets the expiry.
    pub fn with_expiry(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Restricts the granted apps.
    pub fn with_granted_apps(mut self, apps: BTreeSet<AppId>) -> Self {
        self.granted_apps = Some(apps);
        self
    }

    /// Checks redeemability at `now`. First failing check wins:
    /// active, then expiry, then usage.
    pub fn check_redeemable(&self, now: Timestamp) -> Result<(), CouponRejection> {
        if !self.active {
            return Err(CouponRejection::Inactive);
        }
        if let Some(expires_at) = self.expires_at {
            if now.is_after(&expires_at) {
                return Err(CouponRejection::Expired { expired_at: expires_at });
            }
        }
        if let Some(limit) = self.usage_limit {
            if self.usage_count >= limit {
                return Err(CouponRejection::UsageLimitReached {
                    used: self.usage_count,
                    limit,
                });
            }
        }
        Ok(())
    }

    /// The apps a lifetime redemption of this coupon grants.
    ///
    /// Expands "no restriction" to the full known-app catalogue.
    pub fn effective_granted_apps(&self) -> BTreeSet<AppId> {
        match &self.granted_apps {
            Some(apps) => apps.clone(),
            None => AppId::all_known().into_iter().collect(),
        }
    }

    /// Uses remaining before the limit, if one is set.
    pub fn remaining_uses(&self) -> Option<u32> {
        self.usage_limit.map(|limit| limit.saturating_sub(self.usage_count))
    }
}
