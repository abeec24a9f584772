//! Domain layer - pure business logic with no infrastructure dependencies.

pub mod account;
pub mod billing;
pub mod coupon;
pub mod foundation;
