//! Housekey - Shared Account Ledger and Entitlement Service
//!
//! This crate decides, per request, whether a given user may use a given
//! application, and maintains the subscription lifecycle that backs that
//! decision: trials, payment-provider updates, coupon redemptions and
//! administrative grants, all mirrored into an append-only audit log.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
