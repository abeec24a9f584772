//! Entitlement Resolver - the per-app access check.
//!
//! Pure function over `(account, app, now)`; no side effects, safe at
//! unbounded read concurrency. The app-entitlement check runs before any
//! status branching, so a wrong app is always `app_not_entitled`
//! regardless of subscription state.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AppId, Timestamp};

use super::{Account, SubscriptionStatus};

/// Days of access granted after a payment failure.
pub const PAST_DUE_GRACE_DAYS: i64 = 3;

/// Why an access check came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessReason {
    // Denials
    AccountNotFound,
    AppNotEntitled,
    TrialExpired,
    SubscriptionCanceled,
    PaymentFailed,
    SubscriptionInactive,

    // Grants
    TrialActive,
    Active,
    Lifetime,
    CanceledButActive,
    PastDueGracePeriod,
}

impl AccessReason {
    /// Stable string form used in API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessReason::AccountNotFound => "account_not_found",
            AccessReason::AppNotEntitled => "app_not_entitled",
            AccessReason::TrialExpired => "trial_expired",
            AccessReason::SubscriptionCanceled => "subscription_canceled",
            AccessReason::PaymentFailed => "payment_failed",
            AccessReason::SubscriptionInactive => "subscription_inactive",
            AccessReason::TrialActive => "trial_active",
            AccessReason::Active => "active",
            AccessReason::Lifetime => "lifetime",
            AccessReason::CanceledButActive => "canceled_but_active",
            AccessReason::PastDueGracePeriod => "past_due_grace_period",
        }
    }
}

/// Result of an access check, consumed by every downstream application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub has_access: bool,
    pub reason: AccessReason,
    /// Effective status at check time; `None` when the account is missing.
    pub status: Option<SubscriptionStatus>,
    pub trial_expires_at: Option<Timestamp>,
    pub subscription_ends_at: Option<Timestamp>,
    pub entitled_apps: Vec<AppId>,
    pub onboarding_completed_for_app: bool,
}

impl AccessDecision {
    fn not_found() -> Self {
        Self {
            has_access: false,
            reason: AccessReason::AccountNotFound,
            status: None,
            trial_expires_at: None,
            subscription_ends_at: None,
            entitled_apps: Vec::new(),
            onboarding_completed_for_app: false,
        }
    }

    fn for_account(
        account: &Account,
        app: &AppId,
        effective: SubscriptionStatus,
        has_access: bool,
        reason: AccessReason,
    ) -> Self {
        Self {
            has_access,
            reason,
            status: Some(effective),
            trial_expires_at: account.trial_expires_at,
            subscription_ends_at: account.subscription_ends_at,
            entitled_apps: account.entitled_apps.iter().cloned().collect(),
            onboarding_completed_for_app: account.onboarding_completed_for(app),
        }
    }
}

/// Decides whether `account` may use `app` at `now`.
pub fn evaluate_access(account: Option<&Account>, app: &AppId, now: Timestamp) -> AccessDecision {
    let account = match account {
        Some(account) => account,
        None => return AccessDecision::not_found(),
    };

    let effective = account.effective_status(now);

    // Entitlement check takes precedence over status.
    if !account.is_entitled(app) {
        return AccessDecision::for_account(
            account,
            app,
            effective,
            false,
            AccessReason::AppNotEntitled,
        );
    }

    let (has_access, reason) = match effective {
        SubscriptionStatus::Trial => (true, AccessReason::TrialActive),
        SubscriptionStatus::Active => (true, AccessReason::Active),
        SubscriptionStatus::Lifetime => (true, AccessReason::Lifetime),
        SubscriptionStatus::Expired => (false, AccessReason::TrialExpired),
        SubscriptionStatus::Canceled => match account.subscription_ends_at {
            Some(ends_at) if ends_at.is_after(&now) => (true, AccessReason::CanceledButActive),
            _ => (false, AccessReason::SubscriptionCanceled),
        },
        SubscriptionStatus::PastDue => match account.subscription_ends_at {
            Some(due_at)
                if now.duration_since(&due_at).num_days() < PAST_DUE_GRACE_DAYS
                    && !due_at.is_after(&now) =>
            {
                (true, AccessReason::PastDueGracePeriod)
            }
            // Payment due in the future also falls inside the window.
            Some(due_at) if due_at.is_after(&now) => (true, AccessReason::PastDueGracePeriod),
            _ => (false, AccessReason::PaymentFailed),
        },
        SubscriptionStatus::Incomplete => (false, AccessReason::SubscriptionInactive),
    };

    AccessDecision::for_account(account, app, effective, has_access, reason)
}
