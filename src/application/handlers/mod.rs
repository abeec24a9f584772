//! Command and query handlers, grouped by subdomain.

pub mod account;
pub mod billing;
