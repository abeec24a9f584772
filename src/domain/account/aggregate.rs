//! Account aggregate entity.
//!
//! One row per user across every consumer app. The account carries the
//! stored subscription status, the trial window, the entitled-app set and
//! the payment-provider linkage.
//!
//! # Design Decisions
//!
//! - **One stored status**: the time-derived effective status is computed
//!   on read via [`SubscriptionStatus::effective_at`], never written back
//! - **Whole-row writes**: every mutation updates the aggregate in memory
//!   and persists it as a single row write, so status and entitlement
//!   changes land together or not at all
//! - **At least one app at creation**: constructors reject an empty
//!   selection; later edits are free to shrink the set

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AccountId, AppId, DomainError, EmailAddress, Timestamp};

use super::{BillingInterval, SubscriptionStatus};

/// Length of the signup trial window, in days.
pub const TRIAL_LENGTH_DAYS: i64 = 7;

/// Account aggregate - the durable per-user ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier for this account.
    pub id: AccountId,

    /// Email address, stored case-preserving and looked up case-sensitively.
    pub email: EmailAddress,

    /// Display name, if the user supplied one.
    pub name: Option<String>,

    /// Stored subscription status; may be stale relative to time.
    pub subscription_status: SubscriptionStatus,

    /// When the trial started (set only for trial signups).
    pub trial_started_at: Option<Timestamp>,

    /// When the trial window closes.
    pub trial_expires_at: Option<Timestamp>,

    /// Meaning depends on status: "access ends at" for canceled,
    /// "payment was due at" for past_due.
    pub subscription_ends_at: Option<Timestamp>,

    /// Billing interval of the paid subscription, if any.
    pub billing_interval: Option<BillingInterval>,

    /// Applications this account may use.
    pub entitled_apps: BTreeSet<AppId>,

    /// Per-application onboarding completion.
    pub onboarding_completed: BTreeMap<AppId, bool>,

    /// Payment provider customer reference.
    pub payment_customer_ref: Option<String>,

    /// Payment provider subscription reference.
    pub payment_subscription_ref: Option<String>,

    /// Last redeemed coupon code (not a history).
    pub coupon_code: Option<String>,

    /// When the last coupon was redeemed.
    pub coupon_redeemed_at: Option<Timestamp>,

    /// When the account was created.
    pub created_at: Timestamp,

    /// Most recent login, if any.
    pub last_login_at: Option<Timestamp>,
}

impl Account {
    /// Creates a trial account with a 7-day window.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` if `apps` is empty.
    pub fn create_trial(
        id: AccountId,
        email: EmailAddress,
        name: Option<String>,
        apps: BTreeSet<AppId>,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        Self::require_apps(&apps)?;
        Ok(Self {
            id,
            email,
            name,
            subscription_status: SubscriptionStatus::Trial,
            trial_started_at: Some(now),
            trial_expires_at: Some(now.add_days(TRIAL_LENGTH_DAYS)),
            subscription_ends_at: None,
            billing_interval: None,
            entitled_apps: apps,
            onboarding_completed: BTreeMap::new(),
            payment_customer_ref: None,
            payment_subscription_ref: None,
            coupon_code: None,
            coupon_redeemed_at: None,
            created_at: now,
            last_login_at: None,
        })
    }

    /// Creates an account directly in lifetime status.
    ///
    /// Used when a lifetime coupon is supplied at signup, and by the admin
    /// grant path for users that do not exist yet. No trial fields are set.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` if `apps` is empty.
    pub fn create_lifetime(
        id: AccountId,
        email: EmailAddress,
        name: Option<String>,
        apps: BTreeSet<AppId>,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        Self::require_apps(&apps)?;
        Ok(Self {
            id,
            email,
            name,
            subscription_status: SubscriptionStatus::Lifetime,
            trial_started_at: None,
            trial_expires_at: None,
            subscription_ends_at: None,
            billing_interval: None,
            entitled_apps: apps,
            onboarding_completed: BTreeMap::new(),
            payment_customer_ref: None,
            payment_subscription_ref: None,
            coupon_code: None,
            coupon_redeemed_at: None,
            created_at: now,
            last_login_at: None,
        })
    }

    /// Effective status at `now` (trial expiry applied, nothing persisted).
    pub fn effective_status(&self, now: Timestamp) -> SubscriptionStatus {
        self.subscription_status
            .effective_at(self.trial_expires_at, now)
    }

    /// Age of the account in whole days at `now`.
    pub fn age_days(&self, now: Timestamp) -> i64 {
        now.duration_since(&self.created_at).num_days()
    }

    /// Grants lifetime access, replacing the entitled-app set.
    ///
    /// Clears the trial fields and records the coupon, if one drove the
    /// grant. The caller persists the whole row afterwards, so the status
    /// flip and the entitlement change commit together.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` if `apps` is empty.
    pub fn grant_lifetime(
        &mut self,
        apps: BTreeSet<AppId>,
        coupon_code: Option<&str>,
        now: Timestamp,
    ) -> Result<SubscriptionStatus, DomainError> {
        Self::require_apps(&apps)?;
        let previous = self.subscription_status;
        self.subscription_status = SubscriptionStatus::Lifetime;
        self.entitled_apps = apps;
        self.trial_started_at = None;
        self.trial_expires_at = None;
        self.subscription_ends_at = None;
        if let Some(code) = coupon_code {
            self.coupon_code = Some(code.to_string());
            self.coupon_redeemed_at = Some(now);
        }
        Ok(previous)
    }

    /// Extends the trial window by `days`.
    ///
    /// Only meaningful while the stored status is `Trial`; the extension
    /// is anchored at the current expiry (or `now` if the window already
    /// lapsed, which un-expires the derived status).
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` if the account is not on a trial.
    pub fn extend_trial(&mut self, days: u32, now: Timestamp) -> Result<Timestamp, DomainError> {
        if self.subscription_status != SubscriptionStatus::Trial {
            return Err(DomainError::validation(
                "subscription_status",
                format!(
                    "Cannot extend trial for a {} account",
                    self.subscription_status
                ),
            ));
        }
        let anchor = match self.trial_expires_at {
            Some(expiry) if expiry.is_after(&now) => expiry,
            _ => now,
        };
        let new_expiry = anchor.add_days(days as i64);
        self.trial_expires_at = Some(new_expiry);
        Ok(new_expiry)
    }

    /// Applies a payment-provider status update.
    ///
    /// The ledger trusts the requested status; the returned previous
    /// status goes into the audit entry. `None` fields leave the stored
    /// value untouched except for the trial window, which is cleared
    /// whenever the account moves off `Trial`.
    pub fn apply_provider_update(
        &mut self,
        status: SubscriptionStatus,
        subscription_ends_at: Option<Timestamp>,
        billing_interval: Option<BillingInterval>,
        customer_ref: Option<String>,
        subscription_ref: Option<String>,
    ) -> SubscriptionStatus {
        let previous = self.subscription_status;
        self.subscription_status = status;
        if status != SubscriptionStatus::Trial {
            self.trial_started_at = None;
            self.trial_expires_at = None;
        }
        if subscription_ends_at.is_some() {
            self.subscription_ends_at = subscription_ends_at;
        }
        if billing_interval.is_some() {
            self.billing_interval = billing_interval;
        }
        if customer_ref.is_some() {
            self.payment_customer_ref = customer_ref;
        }
        if subscription_ref.is_some() {
            self.payment_subscription_ref = subscription_ref;
        }
        previous
    }

    /// Adds an app to the entitled set.
    ///
    /// Returns `true` if the app was already entitled (idempotent no-op).
    pub fn add_app(&mut self, app: AppId) -> bool {
        !self.entitled_apps.insert(app)
    }

    /// Removes an app from the entitled set.
    ///
    /// Returns `true` if the app was not entitled (idempotent no-op).
    pub fn remove_app(&mut self, app: &AppId) -> bool {
        !self.entitled_apps.remove(app)
    }

    /// Returns whether the account is entitled to `app`.
    pub fn is_entitled(&self, app: &AppId) -> bool {
        self.entitled_apps.contains(app)
    }

    /// Returns whether onboarding is completed for `app`.
    pub fn onboarding_completed_for(&self, app: &AppId) -> bool {
        self.onboarding_completed.get(app).copied().unwrap_or(false)
    }

    /// Marks onboarding completed for `app`. Idempotent.
    pub fn complete_onboarding(&mut self, app: AppId) {
        self.onboarding_completed.insert(app, true);
    }

    /// Records a login at `now`.
    pub fn record_login(&mut self, now: Timestamp) {
        self.last_login_at = Some(now);
    }

    fn require_apps(apps: &BTreeSet<AppId>) -> Result<(), DomainError> {
        if apps.is_empty() {
            return Err(DomainError::validation(
                "selected_apps",
                "At least one application must be selected",
            ));
        }
        Ok(())
    }
}
