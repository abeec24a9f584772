//! Coupon registry types: the code value object, the coupon entity and
//! its validation rules.

mod code;
mod coupon;

pub use code::CouponCode;
pub use coupon::{is_legacy_lifetime_code, Coupon, CouponKind, CouponRejection};
