//! Request extractors shared by the HTTP modules.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::domain::foundation::{AccountId, AdminCredential};

use super::error::ApiError;

/// Authenticated account context extracted from the request.
///
/// The consumer apps authenticate their users themselves and forward the
/// ledger account id in a header; this service trusts the gateway in
/// front of it to have validated the session.
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub account_id: AccountId,
}

impl<S> axum::extract::FromRequestParts<S> for AuthenticatedAccount
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let account_id = parts
                .headers
                .get("X-Account-Id")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<AccountId>().ok())
                .ok_or_else(|| {
                    ApiError::unauthenticated("Missing or invalid X-Account-Id header")
                })?;

            Ok(AuthenticatedAccount { account_id })
        })
    }
}

/// Verified admin caller, extracted from a bearer service token.
#[derive(Debug, Clone)]
pub struct AdminCaller {
    /// Subject the token was minted for, e.g. "admin-cli".
    pub subject: String,
}

impl<S> axum::extract::FromRequestParts<S> for AdminCaller
where
    S: Send + Sync,
    Arc<AdminCredential>: FromRef<S>,
{
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let credential = Arc::<AdminCredential>::from_ref(state);
        Box::pin(async move {
            let token = parts
                .headers
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .ok_or_else(|| ApiError::unauthenticated("Missing bearer token"))?;

            let subject = credential
                .verify(token)
                .map_err(|e| ApiError::unauthorized(e.to_string()))?;

            Ok(AdminCaller { subject })
        })
    }
}
