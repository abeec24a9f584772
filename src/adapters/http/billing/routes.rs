//! Axum router configuration for billing endpoints.

use axum::{routing::post, Router};

use super::handlers::{
    handle_relay_webhook, redeem_coupon, set_coupon_active, BillingAppState,
};

/// Create the coupon router.
///
/// # Routes
/// - `POST /redeem` - Redeem a coupon for the calling account
pub fn coupon_routes() -> Router<BillingAppState> {
    Router::new().route("/redeem", post(redeem_coupon))
}

/// Create the admin coupon router.
///
/// # Routes
/// - `POST /:code/active` - Toggle coupon availability
pub fn admin_coupon_routes() -> Router<BillingAppState> {
    Router::new().route("/:code/active", post(set_coupon_active))
}

/// Create the payment relay webhook router.
///
/// Separate from the coupon routes because deliveries carry no user
/// authentication; they are verified via signature.
///
/// # Routes
/// - `POST /relay` - Receive signed provider events
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/relay", post(handle_relay_webhook))
}

/// Create the complete billing module router.
///
/// Suitable for mounting under `/api`.
pub fn billing_router() -> Router<BillingAppState> {
    Router::new()
        .nest("/coupons", coupon_routes())
        .nest("/admin/coupons", admin_coupon_routes())
        .nest("/webhooks", webhook_routes())
}
