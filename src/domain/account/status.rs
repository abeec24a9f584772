//! Subscription status and its time-based derivation.
//!
//! The ledger stores one status per account; the *effective* status layers
//! trial expiry on top as a pure function of the clock. The derivation is
//! never persisted - every read recomputes it, so no background job is
//! needed to close out expired trials and no clock-skew window exists
//! between a sweep and a concurrent read.
//!
//! Stored-status transitions are not enforced here. Webhooks, admin
//! actions and coupon redemptions write whatever status they were asked
//! to; the audit trail records the previous value for every transition.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// Stored subscription status of an account.
///
/// May be stale relative to time: a `Trial` row whose window has passed
/// still reads `Trial` from storage and derives to `Expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Time-boxed evaluation window granted at signup.
    Trial,

    /// Paying subscription in good standing.
    Active,

    /// Terminal, non-expiring entitlement (coupon or admin grant).
    Lifetime,

    /// User cancelled; access continues until `subscription_ends_at`.
    Canceled,

    /// Payment failed; access continues through a short grace window.
    PastDue,

    /// Provider-side checkout started but never completed.
    Incomplete,

    /// Subscription or trial ended. No access.
    Expired,
}

impl SubscriptionStatus {
    /// Derives the effective status at `now`.
    ///
    /// A stored `Trial` whose `trial_expires_at` has passed derives to
    /// `Expired`; every other combination derives to the stored status.
    pub fn effective_at(self, trial_expires_at: Option<Timestamp>, now: Timestamp) -> Self {
        match (self, trial_expires_at) {
            (SubscriptionStatus::Trial, Some(expiry)) if now.is_after(&expiry) => {
                SubscriptionStatus::Expired
            }
            _ => self,
        }
    }

    /// Stable string form used in audit rows and API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Lifetime => "lifetime",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::Expired => "expired",
        }
    }

    /// Parses the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "trial" => Some(SubscriptionStatus::Trial),
            "active" => Some(SubscriptionStatus::Active),
            "lifetime" => Some(SubscriptionStatus::Lifetime),
            "canceled" => Some(SubscriptionStatus::Canceled),
            "past_due" => Some(SubscriptionStatus::PastDue),
            "incomplete" => Some(SubscriptionStatus::Incomplete),
            "expired" => Some(SubscriptionStatus::Expired),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Billing interval of a paid subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingInterval {
    Monthly,
    Yearly,
}

impl BillingInterval {
    /// Stable string form used in storage and API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingInterval::Monthly => "monthly",
            BillingInterval::Yearly => "yearly",
        }
    }

    /// Parses the stable string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "monthly" => Some(BillingInterval::Monthly),
            "yearly" => Some(BillingInterval::Yearly),
            _ => None,
        }
    }
}
