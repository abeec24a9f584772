//! Billing handlers.
//!
//! Command handlers for the payment side of the ledger:
//!
//! ## Commands
//! - Applying relay-delivered provider events (idempotent)
//! - Redeeming coupons against existing accounts
//! - Toggling coupon availability (admin)

mod apply_provider_event;
mod redeem_coupon;
mod redemption;
mod set_coupon_active;

pub use apply_provider_event::{
    ApplyProviderEventCommand, ApplyProviderEventHandler, ApplyProviderEventResult,
};
pub use redeem_coupon::{RedeemCouponCommand, RedeemCouponHandler, RedeemCouponResult};
pub use set_coupon_active::{SetCouponActiveCommand, SetCouponActiveHandler};

pub(crate) use redemption::{consume_usage, resolve_coupon};
