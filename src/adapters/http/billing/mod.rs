//! HTTP adapter for billing endpoints.
//!
//! Exposes coupon redemption and the payment relay webhook:
//! - `POST /api/coupons/redeem` - Redeem a coupon for the calling account
//! - `POST /api/admin/coupons/:code/active` - Toggle coupon availability (admin)
//! - `POST /api/webhooks/relay` - Receive signed provider events

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::BillingAppState;
pub use routes::billing_router;
