//! Audit events - the append-only mirror of every state change.
//!
//! `AuditEventKind` is a tagged union keyed by the event type, so each
//! event carries exactly the payload that event produces while the store
//! keeps "whatever happened" flexibility. Events are immutable once
//! written; the core never parses stored payloads back.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AccountId, AppId, AuditEventId, Timestamp};

use super::{BillingInterval, SubscriptionStatus};

/// Event-specific payload, tagged by event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum AuditEventKind {
    /// A trial account was created.
    #[serde(rename = "trial.started")]
    TrialStarted {
        trial_expires_at: Timestamp,
        apps: Vec<AppId>,
    },

    /// A coupon was validated and consumed.
    #[serde(rename = "coupon.applied")]
    CouponApplied {
        code: String,
        granted_apps: Vec<AppId>,
    },

    /// A payment-provider or admin status change landed. `previous_status`
    /// is `None` when the change created the account.
    #[serde(rename = "subscription.updated")]
    SubscriptionUpdated {
        previous_status: Option<SubscriptionStatus>,
        new_status: SubscriptionStatus,
        subscription_ends_at: Option<Timestamp>,
        billing_interval: Option<BillingInterval>,
    },

    /// An app was added to the entitled set.
    #[serde(rename = "entitlement.granted")]
    EntitlementGranted { app: AppId },

    /// An app was removed from the entitled set.
    #[serde(rename = "entitlement.revoked")]
    EntitlementRevoked { app: AppId },

    /// Terminal event written before the row is removed. Preserves the
    /// status, entitlements and account age for compliance.
    #[serde(rename = "account.deleted")]
    AccountDeleted {
        email: String,
        status_at_deletion: SubscriptionStatus,
        entitled_apps: Vec<AppId>,
        account_age_days: i64,
        reason: Option<String>,
    },

    /// The entitled-app set was replaced wholesale.
    #[serde(rename = "subscription.apps_changed")]
    SubscriptionAppsChanged {
        previous_apps: Vec<AppId>,
        new_apps: Vec<AppId>,
    },

    /// A provider event could not be applied (e.g. unknown account).
    #[serde(rename = "subscription.update_failed")]
    SubscriptionUpdateFailed { email: String, reason: String },
}

impl AuditEventKind {
    /// The stable event-type string this kind serializes under.
    pub fn event_type(&self) -> &'static str {
        match self {
            AuditEventKind::TrialStarted { .. } => "trial.started",
            AuditEventKind::CouponApplied { .. } => "coupon.applied",
            AuditEventKind::SubscriptionUpdated { .. } => "subscription.updated",
            AuditEventKind::EntitlementGranted { .. } => "entitlement.granted",
            AuditEventKind::EntitlementRevoked { .. } => "entitlement.revoked",
            AuditEventKind::AccountDeleted { .. } => "account.deleted",
            AuditEventKind::SubscriptionAppsChanged { .. } => "subscription.apps_changed",
            AuditEventKind::SubscriptionUpdateFailed { .. } => "subscription.update_failed",
        }
    }
}

/// One appended audit row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: AuditEventId,

    /// `None` for events that precede account resolution, e.g. a failed
    /// webhook lookup.
    pub account_id: Option<AccountId>,

    #[serde(flatten)]
    pub kind: AuditEventKind,

    /// Stored status at the time of the event.
    pub subscription_status: Option<SubscriptionStatus>,

    /// Webhook dedup key, carried into the audit trail.
    pub provider_event_id: Option<String>,

    pub occurred_at: Timestamp,
}

impl AuditEvent {
    /// Creates an event attributed to an account.
    pub fn for_account(
        account_id: AccountId,
        status: SubscriptionStatus,
        kind: AuditEventKind,
        occurred_at: Timestamp,
    ) -> Self {
        Self {
            id: AuditEventId::new(),
            account_id: Some(account_id),
            kind,
            subscription_status: Some(status),
            provider_event_id: None,
            occurred_at,
        }
    }

    /// Creates an event with no resolved account.
    pub fn unattributed(kind: AuditEventKind, occurred_at: Timestamp) -> Self {
        Self {
            id: AuditEventId::new(),
            account_id: None,
            kind,
            subscription_status: None,
            provider_event_id: None,
            occurred_at,
        }
    }

    /// Attaches the provider's dedup key.
    pub fn with_provider_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.provider_event_id = Some(event_id.into());
        self
    }

    /// The stable event-type string.
    pub fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }
}
