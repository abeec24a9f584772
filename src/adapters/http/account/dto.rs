//! HTTP DTOs (Data Transfer Objects) for account endpoints.
//!
//! These types define the JSON request/response structure for the account API.
//! They serve as the boundary between HTTP and the application layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::application::handlers::account::EntitlementEdit;
use crate::domain::account::{AccessDecision, Account, BillingInterval, SubscriptionStatus};
use crate::domain::foundation::Timestamp;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to create an account.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Apps the account signs up for.
    pub apps: Vec<String>,
    /// Optional promotional code applied at signup.
    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// Query parameters for the email lookup endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct LookupParams {
    pub email: String,
}

/// Query parameters for the access check.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessParams {
    pub email: String,
    pub app: String,
}

/// Request to mark onboarding complete for one app.
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteOnboardingRequest {
    pub app: String,
}

/// Request to grant lifetime access (admin).
#[derive(Debug, Clone, Deserialize)]
pub struct GrantLifetimeRequest {
    pub email: String,
    /// Apps to entitle; omitted grants the full catalogue.
    #[serde(default)]
    pub apps: Option<Vec<String>>,
}

/// Direction of an entitlement edit.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementAction {
    Add,
    Remove,
}

impl From<EntitlementAction> for EntitlementEdit {
    fn from(action: EntitlementAction) -> Self {
        match action {
            EntitlementAction::Add => EntitlementEdit::Add,
            EntitlementAction::Remove => EntitlementEdit::Remove,
        }
    }
}

/// Request to edit one app entitlement (admin).
#[derive(Debug, Clone, Deserialize)]
pub struct EditEntitlementsRequest {
    pub app: String,
    pub action: EntitlementAction,
}

/// Request body for account deletion (admin). Optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteAccountRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Detailed account view for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    /// Stored status.
    pub subscription_status: SubscriptionStatus,
    /// Stored status with lazy trial expiry applied.
    pub effective_status: SubscriptionStatus,
    pub trial_started_at: Option<String>,
    pub trial_expires_at: Option<String>,
    pub subscription_ends_at: Option<String>,
    pub billing_interval: Option<BillingInterval>,
    pub entitled_apps: Vec<String>,
    pub onboarding_completed: BTreeMap<String, bool>,
    pub coupon_code: Option<String>,
    pub created_at: String,
    pub last_login_at: Option<String>,
}

impl AccountResponse {
    /// Builds the response from an aggregate and its effective status.
    pub fn new(account: &Account, effective_status: SubscriptionStatus) -> Self {
        Self {
            id: account.id.to_string(),
            email: account.email.as_str().to_string(),
            name: account.name.clone(),
            subscription_status: account.subscription_status,
            effective_status,
            trial_started_at: account.trial_started_at.map(rfc3339),
            trial_expires_at: account.trial_expires_at.map(rfc3339),
            subscription_ends_at: account.subscription_ends_at.map(rfc3339),
            billing_interval: account.billing_interval,
            entitled_apps: account
                .entitled_apps
                .iter()
                .map(|a| a.as_str().to_string())
                .collect(),
            onboarding_completed: account
                .onboarding_completed
                .iter()
                .map(|(app, done)| (app.as_str().to_string(), *done))
                .collect(),
            coupon_code: account.coupon_code.clone(),
            created_at: rfc3339(account.created_at),
            last_login_at: account.last_login_at.map(rfc3339),
        }
    }
}

fn rfc3339(t: Timestamp) -> String {
    t.as_datetime().to_rfc3339()
}

/// Response for access checks.
#[derive(Debug, Clone, Serialize)]
pub struct AccessCheckResponse {
    pub has_access: bool,
    pub reason: String,
    pub status: Option<SubscriptionStatus>,
    pub trial_expires_at: Option<String>,
    pub subscription_ends_at: Option<String>,
    pub entitled_apps: Vec<String>,
    pub onboarding_completed_for_app: bool,
}

impl From<AccessDecision> for AccessCheckResponse {
    fn from(decision: AccessDecision) -> Self {
        Self {
            has_access: decision.has_access,
            reason: decision.reason.as_str().to_string(),
            status: decision.status,
            trial_expires_at: decision.trial_expires_at.map(rfc3339),
            subscription_ends_at: decision.subscription_ends_at.map(rfc3339),
            entitled_apps: decision
                .entitled_apps
                .iter()
                .map(|a| a.as_str().to_string())
                .collect(),
            onboarding_completed_for_app: decision.onboarding_completed_for_app,
        }
    }
}

/// Response for a lifetime grant.
#[derive(Debug, Clone, Serialize)]
pub struct GrantLifetimeResponse {
    #[serde(flatten)]
    pub account: AccountResponse,
    /// `true` when the grant created the account.
    pub created: bool,
}

/// Response for an entitlement edit.
#[derive(Debug, Clone, Serialize)]
pub struct EditEntitlementsResponse {
    #[serde(flatten)]
    pub account: AccountResponse,
    /// `true` when the edit changed nothing.
    pub no_op: bool,
}
