//! Axum router configuration for account endpoints.
//!
//! This module defines the route structure for account-related API endpoints
//! and wires them to their corresponding handlers.

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handlers::{
    check_access, complete_onboarding, create_account, delete_account, edit_entitlements,
    get_account, grant_lifetime, record_login, AccountAppState,
};

/// Create the public account API router.
///
/// # Routes
/// - `POST /` - Sign up (trial, or lifetime with a coupon)
/// - `GET /lookup` - Get account details by exact email
/// - `GET /access` - Per-app access decision
/// - `POST /login` - Stamp a successful login (requires account header)
/// - `POST /onboarding` - Mark an app's onboarding complete (requires account header)
pub fn account_routes() -> Router<AccountAppState> {
    Router::new()
        .route("/", post(create_account))
        .route("/lookup", get(get_account))
        .route("/access", get(check_access))
        .route("/login", post(record_login))
        .route("/onboarding", post(complete_onboarding))
}

/// Create the admin account router.
///
/// Every route requires a minted admin bearer token.
///
/// # Routes
/// - `POST /lifetime` - Grant lifetime access by email
/// - `POST /:id/entitlements` - Add or remove one app entitlement
/// - `DELETE /:id` - Delete an account permanently
pub fn admin_account_routes() -> Router<AccountAppState> {
    Router::new()
        .route("/lifetime", post(grant_lifetime))
        .route("/:id/entitlements", post(edit_entitlements))
        .route("/:id", delete(delete_account))
}

/// Create the complete account module router.
///
/// Suitable for mounting under `/api`.
pub fn account_router() -> Router<AccountAppState> {
    Router::new()
        .nest("/accounts", account_routes())
        .nest("/admin/accounts", admin_account_routes())
}
