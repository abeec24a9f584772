//! HTTP handlers for billing endpoints.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{FromRef, Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::application::handlers::billing::{
    ApplyProviderEventCommand, ApplyProviderEventHandler, RedeemCouponCommand, RedeemCouponHandler,
    SetCouponActiveCommand, SetCouponActiveHandler,
};
use crate::domain::billing::RelayWebhookVerifier;
use crate::domain::foundation::{AdminCredential, Timestamp};
use crate::ports::{AccountRepository, AuditLog, CouponRepository};

use super::super::account::dto::AccountResponse;
use super::super::error::ApiError;
use super::super::extract::{AdminCaller, AuthenticatedAccount};
use super::dto::{
    RedeemCouponRequest, RedeemCouponResponse, SetCouponActiveRequest, WebhookAckResponse,
};

/// Header carrying the relay's delivery signature.
const RELAY_SIGNATURE_HEADER: &str = "X-Relay-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state for the billing endpoints.
#[derive(Clone)]
pub struct BillingAppState {
    pub accounts: Arc<dyn AccountRepository>,
    pub coupons: Arc<dyn CouponRepository>,
    pub audit_log: Arc<dyn AuditLog>,
    pub webhook_verifier: Arc<RelayWebhookVerifier>,
    pub admin_credential: Arc<AdminCredential>,
}

impl FromRef<BillingAppState> for Arc<AdminCredential> {
    fn from_ref(state: &BillingAppState) -> Self {
        state.admin_credential.clone()
    }
}

impl BillingAppState {
    pub fn redeem_coupon_handler(&self) -> RedeemCouponHandler {
        RedeemCouponHandler::new(
            self.accounts.clone(),
            self.coupons.clone(),
            self.audit_log.clone(),
        )
    }

    pub fn set_coupon_active_handler(&self) -> SetCouponActiveHandler {
        SetCouponActiveHandler::new(self.coupons.clone())
    }

    pub fn apply_provider_event_handler(&self) -> ApplyProviderEventHandler {
        ApplyProviderEventHandler::new(self.accounts.clone(), self.audit_log.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/coupons/redeem - Redeem a coupon for the calling account
pub async fn redeem_coupon(
    State(state): State<BillingAppState>,
    account: AuthenticatedAccount,
    Json(request): Json<RedeemCouponRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.redeem_coupon_handler();
    let result = handler
        .handle(RedeemCouponCommand {
            account_id: account.account_id,
            code: request.code,
        })
        .await?;

    let effective = result.account.effective_status(Timestamp::now());
    let response = RedeemCouponResponse {
        account: AccountResponse::new(&result.account, effective),
    };
    Ok(Json(response))
}

/// POST /api/admin/coupons/:code/active - Toggle coupon availability
pub async fn set_coupon_active(
    State(state): State<BillingAppState>,
    _caller: AdminCaller,
    Path(code): Path<String>,
    Json(request): Json<SetCouponActiveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.set_coupon_active_handler();
    handler
        .handle(SetCouponActiveCommand {
            code,
            active: request.active,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/webhooks/relay - Receive signed provider events
///
/// The relay retries deliveries, so a replayed event id acknowledges
/// with `applied: false` instead of erroring.
pub async fn handle_relay_webhook(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get(RELAY_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthenticated("Missing X-Relay-Signature header"))?;

    let event = state.webhook_verifier.verify_and_parse(&body, signature)?;

    let handler = state.apply_provider_event_handler();
    let result = handler.handle(ApplyProviderEventCommand { event }).await?;

    Ok(Json(WebhookAckResponse {
        applied: result.applied,
    }))
}
