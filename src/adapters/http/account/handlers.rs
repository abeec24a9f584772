//! HTTP handlers for account endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::extract::{FromRef, Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::handlers::account::{
    CheckAccessHandler, CheckAccessQuery, CompleteOnboardingCommand, CompleteOnboardingHandler,
    CreateAccountCommand, CreateAccountHandler, DeleteAccountCommand, DeleteAccountHandler,
    EditEntitlementsCommand, EditEntitlementsHandler, GetAccountHandler, GetAccountQuery,
    GrantLifetimeCommand, GrantLifetimeHandler, RecordLoginCommand, RecordLoginHandler,
};
use crate::domain::foundation::{AccountId, AdminCredential, Timestamp};
use crate::ports::{AccountRepository, AuditLog, CouponRepository};

use super::super::error::ApiError;
use super::super::extract::{AdminCaller, AuthenticatedAccount};
use super::dto::{
    AccessCheckResponse, AccessParams, AccountResponse, CompleteOnboardingRequest,
    CreateAccountRequest, DeleteAccountRequest, EditEntitlementsRequest, EditEntitlementsResponse,
    GrantLifetimeRequest, GrantLifetimeResponse, LookupParams,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// This struct is cloned for each request and contains Arc-wrapped dependencies
/// for efficient sharing across handlers.
#[derive(Clone)]
pub struct AccountAppState {
    pub accounts: Arc<dyn AccountRepository>,
    pub coupons: Arc<dyn CouponRepository>,
    pub audit_log: Arc<dyn AuditLog>,
    pub admin_credential: Arc<AdminCredential>,
}

impl FromRef<AccountAppState> for Arc<AdminCredential> {
    fn from_ref(state: &AccountAppState) -> Self {
        state.admin_credential.clone()
    }
}

impl AccountAppState {
    /// Create handlers on demand from the shared state.
    pub fn create_account_handler(&self) -> CreateAccountHandler {
        CreateAccountHandler::new(
            self.accounts.clone(),
            self.coupons.clone(),
            self.audit_log.clone(),
        )
    }

    pub fn get_account_handler(&self) -> GetAccountHandler {
        GetAccountHandler::new(self.accounts.clone())
    }

    pub fn check_access_handler(&self) -> CheckAccessHandler {
        CheckAccessHandler::new(self.accounts.clone())
    }

    pub fn record_login_handler(&self) -> RecordLoginHandler {
        RecordLoginHandler::new(self.accounts.clone())
    }

    pub fn complete_onboarding_handler(&self) -> CompleteOnboardingHandler {
        CompleteOnboardingHandler::new(self.accounts.clone())
    }

    pub fn grant_lifetime_handler(&self) -> GrantLifetimeHandler {
        GrantLifetimeHandler::new(self.accounts.clone(), self.audit_log.clone())
    }

    pub fn edit_entitlements_handler(&self) -> EditEntitlementsHandler {
        EditEntitlementsHandler::new(self.accounts.clone(), self.audit_log.clone())
    }

    pub fn delete_account_handler(&self) -> DeleteAccountHandler {
        DeleteAccountHandler::new(self.accounts.clone(), self.audit_log.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Public Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/accounts - Sign up for an account
pub async fn create_account(
    State(state): State<AccountAppState>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.create_account_handler();
    let cmd = CreateAccountCommand {
        email: request.email,
        name: request.name,
        selected_apps: request.apps,
        coupon_code: request.coupon_code,
    };

    let result = handler.handle(cmd).await?;

    let effective = result.account.effective_status(Timestamp::now());
    let response = AccountResponse::new(&result.account, effective);
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/accounts/lookup?email= - Get account details by exact email
pub async fn get_account(
    State(state): State<AccountAppState>,
    Query(params): Query<LookupParams>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.get_account_handler();
    let view = handler
        .handle(GetAccountQuery {
            email: params.email,
        })
        .await?;

    let response = AccountResponse::new(&view.account, view.effective_status);
    Ok(Json(response))
}

/// GET /api/accounts/access?email=&app= - Per-app access decision
///
/// An unknown account returns a denial, not a 404, so every client app
/// consumes one uniform decision shape.
pub async fn check_access(
    State(state): State<AccountAppState>,
    Query(params): Query<AccessParams>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.check_access_handler();
    let decision = handler
        .handle(CheckAccessQuery {
            email: params.email,
            app: params.app,
        })
        .await?;

    Ok(Json(AccessCheckResponse::from(decision)))
}

/// POST /api/accounts/login - Stamp a successful login
pub async fn record_login(
    State(state): State<AccountAppState>,
    account: AuthenticatedAccount,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.record_login_handler();
    handler
        .handle(RecordLoginCommand {
            account_id: account.account_id,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/accounts/onboarding - Mark an app's onboarding flow complete
pub async fn complete_onboarding(
    State(state): State<AccountAppState>,
    account: AuthenticatedAccount,
    Json(request): Json<CompleteOnboardingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.complete_onboarding_handler();
    handler
        .handle(CompleteOnboardingCommand {
            account_id: account.account_id,
            app: request.app,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ════════════════════════════════════════════════════════════════════════════════
// Admin Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/admin/accounts/lifetime - Grant lifetime access by email
pub async fn grant_lifetime(
    State(state): State<AccountAppState>,
    _caller: AdminCaller,
    Json(request): Json<GrantLifetimeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.grant_lifetime_handler();
    let result = handler
        .handle(GrantLifetimeCommand {
            email: request.email,
            apps: request.apps,
        })
        .await?;

    let status = if result.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let effective = result.account.effective_status(Timestamp::now());
    let response = GrantLifetimeResponse {
        account: AccountResponse::new(&result.account, effective),
        created: result.created,
    };
    Ok((status, Json(response)))
}

/// POST /api/admin/accounts/:id/entitlements - Add or remove one app
pub async fn edit_entitlements(
    State(state): State<AccountAppState>,
    _caller: AdminCaller,
    Path(id): Path<Uuid>,
    Json(request): Json<EditEntitlementsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.edit_entitlements_handler();
    let result = handler
        .handle(EditEntitlementsCommand {
            account_id: AccountId::from_uuid(id),
            app: request.app,
            edit: request.action.into(),
        })
        .await?;

    let effective = result.account.effective_status(Timestamp::now());
    let response = EditEntitlementsResponse {
        account: AccountResponse::new(&result.account, effective),
        no_op: result.no_op,
    };
    Ok(Json(response))
}

/// DELETE /api/admin/accounts/:id - Delete an account permanently
pub async fn delete_account(
    State(state): State<AccountAppState>,
    _caller: AdminCaller,
    Path(id): Path<Uuid>,
    request: Option<Json<DeleteAccountRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.delete_account_handler();
    let reason = request.and_then(|Json(r)| r.reason);
    handler
        .handle(DeleteAccountCommand {
            account_id: AccountId::from_uuid(id),
            reason,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    use crate::adapters::memory::{
        InMemoryAccountRepository, InMemoryAuditLog, InMemoryCouponRepository,
    };
    use crate::domain::account::SubscriptionStatus;

    fn test_state() -> AccountAppState {
        AccountAppState {
            accounts: Arc::new(InMemoryAccountRepository::new()),
            coupons: Arc::new(InMemoryCouponRepository::new()),
            audit_log: Arc::new(InMemoryAuditLog::new()),
            admin_credential: Arc::new(AdminCredential::new(Secret::new(
                "test-secret-123".to_string(),
            ))),
        }
    }

    fn signup_request() -> CreateAccountRequest {
        CreateAccountRequest {
            email: "user@example.com".to_string(),
            name: None,
            apps: vec!["books".to_string()],
            coupon_code: None,
        }
    }

    fn admin() -> AdminCaller {
        AdminCaller {
            subject: "admin-cli".to_string(),
        }
    }

    #[tokio::test]
    async fn create_account_returns_created() {
        let state = test_state();

        let response = create_account(State(state), Json(signup_request()))
            .await
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn duplicate_signup_maps_to_conflict() {
        let state = test_state();
        create_account(State(state.clone()), Json(signup_request()))
            .await
            .unwrap();

        let err = create_account(State(state), Json(signup_request()))
            .await
            .err()
            .unwrap();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn lookup_returns_account_after_signup() {
        let state = test_state();
        create_account(State(state.clone()), Json(signup_request()))
            .await
            .unwrap();

        let response = get_account(
            State(state),
            Query(LookupParams {
                email: "user@example.com".to_string(),
            }),
        )
        .await;
        assert!(response.is_ok());
    }

    #[tokio::test]
    async fn lookup_of_unknown_email_maps_to_not_found() {
        let state = test_state();

        let err = get_account(
            State(state),
            Query(LookupParams {
                email: "ghost@example.com".to_string(),
            }),
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn access_check_for_unknown_account_is_ok_denial() {
        let state = test_state();

        let result = check_access(
            State(state),
            Query(AccessParams {
                email: "ghost@example.com".to_string(),
                app: "books".to_string(),
            }),
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn grant_lifetime_creates_missing_account_with_created_status() {
        let state = test_state();

        let response = grant_lifetime(
            State(state.clone()),
            admin(),
            Json(GrantLifetimeRequest {
                email: "vip@example.com".to_string(),
                apps: None,
            }),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let view = state
            .get_account_handler()
            .handle(GetAccountQuery {
                email: "vip@example.com".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(view.effective_status, SubscriptionStatus::Lifetime);
    }

    #[tokio::test]
    async fn entitlement_edit_on_unknown_account_maps_to_not_found() {
        let state = test_state();

        let err = edit_entitlements(
            State(state),
            admin(),
            Path(Uuid::new_v4()),
            Json(EditEntitlementsRequest {
                app: "books".to_string(),
                action: super::super::dto::EntitlementAction::Add,
            }),
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_account_without_body_succeeds() {
        let state = test_state();
        create_account(State(state.clone()), Json(signup_request()))
            .await
            .unwrap();

        let account = state
            .get_account_handler()
            .handle(GetAccountQuery {
                email: "user@example.com".to_string(),
            })
            .await
            .unwrap()
            .account;

        let response = delete_account(
            State(state.clone()),
            admin(),
            Path(*account.id.as_uuid()),
            None,
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let err = get_account(
            State(state),
            Query(LookupParams {
                email: "user@example.com".to_string(),
            }),
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
