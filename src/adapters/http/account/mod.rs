//! HTTP adapter for account endpoints.
//!
//! Exposes the account lifecycle via REST API:
//! - `POST /api/accounts` - Sign up (trial, or lifetime with a coupon)
//! - `GET /api/accounts/lookup` - Get account details by email
//! - `GET /api/accounts/access` - Per-app access decision
//! - `POST /api/accounts/login` - Stamp a successful login
//! - `POST /api/accounts/onboarding` - Mark an app's onboarding complete
//! - `POST /api/admin/accounts/lifetime` - Grant lifetime access (admin)
//! - `POST /api/admin/accounts/:id/entitlements` - Add/remove one app (admin)
//! - `DELETE /api/admin/accounts/:id` - Delete an account (admin)

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::AccountAppState;
pub use routes::account_router;
