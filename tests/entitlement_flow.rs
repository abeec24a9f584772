//! End-to-end flows through the application handlers backed by the
//! in-memory adapters: signup, redemption, webhook lifecycle and the
//! access decisions that fall out of them.

use std::collections::BTreeSet;
use std::sync::Arc;

use housekey::adapters::memory::{
    InMemoryAccountRepository, InMemoryAuditLog, InMemoryCouponRepository,
};
use housekey::application::handlers::account::{
    CheckAccessHandler, CheckAccessQuery, CreateAccountCommand, CreateAccountHandler,
    EditEntitlementsCommand, EditEntitlementsHandler, EntitlementEdit, GetAccountHandler,
    GetAccountQuery, GrantLifetimeCommand, GrantLifetimeHandler,
};
use housekey::application::handlers::billing::{
    ApplyProviderEventCommand, ApplyProviderEventHandler, RedeemCouponCommand, RedeemCouponHandler,
};
use housekey::domain::account::{
    AccessReason, Account, AuditEvent, BillingInterval, SubscriptionStatus, TRIAL_LENGTH_DAYS,
};
use housekey::domain::billing::ProviderEvent;
use housekey::domain::coupon::{Coupon, CouponCode};
use housekey::domain::foundation::{
    AccountId, AppId, DomainError, EmailAddress, ErrorCode, Timestamp,
};
use housekey::ports::{AccountRepository, AuditLog, CouponRepository};

struct Fixture {
    accounts: Arc<InMemoryAccountRepository>,
    coupons: Arc<InMemoryCouponRepository>,
    audit_log: Arc<InMemoryAuditLog>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            accounts: Arc::new(InMemoryAccountRepository::new()),
            coupons: Arc::new(InMemoryCouponRepository::new()),
            audit_log: Arc::new(InMemoryAuditLog::new()),
        }
    }

    fn create_account_handler(&self) -> CreateAccountHandler {
        CreateAccountHandler::new(
            self.accounts.clone(),
            self.coupons.clone(),
            self.audit_log.clone(),
        )
    }

    fn check_access_handler(&self) -> CheckAccessHandler {
        CheckAccessHandler::new(self.accounts.clone())
    }

    fn get_account_handler(&self) -> GetAccountHandler {
        GetAccountHandler::new(self.accounts.clone())
    }

    fn redeem_coupon_handler(&self) -> RedeemCouponHandler {
        RedeemCouponHandler::new(
            self.accounts.clone(),
            self.coupons.clone(),
            self.audit_log.clone(),
        )
    }

    fn apply_provider_event_handler(&self) -> ApplyProviderEventHandler {
        ApplyProviderEventHandler::new(self.accounts.clone(), self.audit_log.clone())
    }

    fn grant_lifetime_handler(&self) -> GrantLifetimeHandler {
        GrantLifetimeHandler::new(self.accounts.clone(), self.audit_log.clone())
    }

    fn edit_entitlements_handler(&self) -> EditEntitlementsHandler {
        EditEntitlementsHandler::new(self.accounts.clone(), self.audit_log.clone())
    }

    async fn signup(&self, email: &str, apps: &[&str]) -> Account {
        self.create_account_handler()
            .handle(CreateAccountCommand {
                email: email.to_string(),
                name: None,
                selected_apps: apps.iter().map(|a| a.to_string()).collect(),
                coupon_code: None,
            })
            .await
            .unwrap()
            .account
    }

    /// Inserts a trial account whose clock started `days_ago` days back.
    async fn seed_aged_trial(&self, email: &str, apps: &[&str], days_ago: i64) -> Account {
        let apps: BTreeSet<AppId> = apps.iter().map(|a| AppId::new(*a).unwrap()).collect();
        let account = Account::create_trial(
            AccountId::new(),
            EmailAddress::try_new(email).unwrap(),
            None,
            apps,
            Timestamp::now().minus_days(days_ago),
        )
        .unwrap();
        self.accounts.insert(&account).await.unwrap();
        account
    }

    async fn access(&self, email: &str, app: &str) -> housekey::domain::account::AccessDecision {
        self.check_access_handler()
            .handle(CheckAccessQuery {
                email: email.to_string(),
                app: app.to_string(),
            })
            .await
            .unwrap()
    }
}

fn provider_event(event_id: &str, email: &str, status: SubscriptionStatus) -> ProviderEvent {
    ProviderEvent {
        event_id: event_id.to_string(),
        email: email.to_string(),
        status,
        subscription_ends_at: None,
        billing_interval: Some(BillingInterval::Monthly),
        customer_ref: Some("cus_123".to_string()),
        subscription_ref: Some("sub_456".to_string()),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Signup and Redemption
// ════════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn signup_then_redeem_lifetime_coupon() {
    let fx = Fixture::new();
    let account = fx.signup("user@example.com", &["books"]).await;
    assert_eq!(account.subscription_status, SubscriptionStatus::Trial);

    fx.coupons
        .save(&Coupon::lifetime(CouponCode::try_new("FOUNDER").unwrap()))
        .await
        .unwrap();

    let result = fx
        .redeem_coupon_handler()
        .handle(RedeemCouponCommand {
            account_id: account.id,
            code: "FOUNDER".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(result.account.subscription_status, SubscriptionStatus::Lifetime);
    assert_eq!(result.account.coupon_code.as_deref(), Some("FOUNDER"));

    let decision = fx.access("user@example.com", "books").await;
    assert!(decision.has_access);
    assert_eq!(decision.reason, AccessReason::Lifetime);

    let events = fx.audit_log.events_for_account(&account.id).await.unwrap();
    assert!(!events.is_empty());
}

#[tokio::test]
async fn limit_one_coupon_admits_exactly_one_of_two_racing_redeemers() {
    let fx = Fixture::new();
    let first = fx.signup("first@example.com", &["books"]).await;
    let second = fx.signup("second@example.com", &["books"]).await;

    let coupon =
        Coupon::lifetime(CouponCode::try_new("LASTONE").unwrap()).with_usage_limit(1);
    fx.coupons.save(&coupon).await.unwrap();

    let a = {
        let handler = fx.redeem_coupon_handler();
        tokio::spawn(async move {
            handler
                .handle(RedeemCouponCommand {
                    account_id: first.id,
                    code: "LASTONE".to_string(),
                })
                .await
        })
    };
    let b = {
        let handler = fx.redeem_coupon_handler();
        tokio::spawn(async move {
            handler
                .handle(RedeemCouponCommand {
                    account_id: second.id,
                    code: "LASTONE".to_string(),
                })
                .await
        })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    let stored = fx
        .coupons
        .find_by_code(&CouponCode::try_new("LASTONE").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.usage_count, 1);
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Lifecycle
// ════════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn provider_event_applies_once_and_replay_is_skipped() {
    let fx = Fixture::new();
    fx.signup("user@example.com", &["books"]).await;

    let handler = fx.apply_provider_event_handler();
    let event = provider_event("evt_1", "user@example.com", SubscriptionStatus::Active);

    let first = handler
        .handle(ApplyProviderEventCommand { event: event.clone() })
        .await
        .unwrap();
    assert!(first.applied);
    assert_eq!(
        first.account.unwrap().subscription_status,
        SubscriptionStatus::Active
    );

    let replay = handler
        .handle(ApplyProviderEventCommand { event })
        .await
        .unwrap();
    assert!(!replay.applied);
    assert!(replay.account.is_none());
}

/// Audit log whose dedup lookup costs a round-trip, like the Postgres
/// adapter. Both racing deliveries clear the fast-path check before
/// either one claims the id.
struct SlowLookupAuditLog {
    inner: InMemoryAuditLog,
}

#[async_trait::async_trait]
impl AuditLog for SlowLookupAuditLog {
    async fn append(&self, event: &AuditEvent) -> Result<(), DomainError> {
        self.inner.append(event).await
    }

    async fn append_if_new(&self, event: &AuditEvent) -> Result<bool, DomainError> {
        self.inner.append_if_new(event).await
    }

    async fn contains_provider_event(&self, provider_event_id: &str) -> Result<bool, DomainError> {
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        self.inner.contains_provider_event(provider_event_id).await
    }

    async fn events_for_account(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<AuditEvent>, DomainError> {
        self.inner.events_for_account(account_id).await
    }
}

#[tokio::test]
async fn racing_deliveries_of_one_event_id_apply_once() {
    let fx = Fixture::new();
    let account = fx.signup("user@example.com", &["books"]).await;

    let audit_log = Arc::new(SlowLookupAuditLog {
        inner: InMemoryAuditLog::new(),
    });
    let handler = Arc::new(ApplyProviderEventHandler::new(
        fx.accounts.clone(),
        audit_log.clone(),
    ));

    let event = provider_event("evt_race", "user@example.com", SubscriptionStatus::Active);
    let a = {
        let handler = handler.clone();
        let event = event.clone();
        tokio::spawn(async move { handler.handle(ApplyProviderEventCommand { event }).await })
    };
    let b = {
        let handler = handler.clone();
        tokio::spawn(async move { handler.handle(ApplyProviderEventCommand { event }).await })
    };

    let results = [a.await.unwrap().unwrap(), b.await.unwrap().unwrap()];
    let applied = results.iter().filter(|r| r.applied).count();
    assert_eq!(applied, 1);

    let recorded: Vec<_> = audit_log
        .events_for_account(&account.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.provider_event_id.as_deref() == Some("evt_race"))
        .collect();
    assert_eq!(recorded.len(), 1);
}

#[tokio::test]
async fn failed_delivery_for_unknown_account_dedups_on_retry() {
    let fx = Fixture::new();
    let handler = fx.apply_provider_event_handler();
    let event = provider_event("evt_9", "ghost@example.com", SubscriptionStatus::Active);

    let err = handler
        .handle(ApplyProviderEventCommand { event: event.clone() })
        .await
        .err()
        .unwrap();
    assert_eq!(err.code, ErrorCode::AccountNotFound);

    // The failure was recorded under the event id, so the relay's retry
    // acknowledges instead of erroring forever.
    let retry = handler
        .handle(ApplyProviderEventCommand { event })
        .await
        .unwrap();
    assert!(!retry.applied);
}

#[tokio::test]
async fn past_due_grants_inside_grace_window_and_denies_after() {
    let fx = Fixture::new();
    fx.signup("user@example.com", &["books"]).await;
    let handler = fx.apply_provider_event_handler();

    let mut event = provider_event("evt_pd1", "user@example.com", SubscriptionStatus::PastDue);
    event.subscription_ends_at = Some(Timestamp::now().minus_days(2));
    handler
        .handle(ApplyProviderEventCommand { event })
        .await
        .unwrap();

    let decision = fx.access("user@example.com", "books").await;
    assert!(decision.has_access);
    assert_eq!(decision.reason, AccessReason::PastDueGracePeriod);

    let mut event = provider_event("evt_pd2", "user@example.com", SubscriptionStatus::PastDue);
    event.subscription_ends_at = Some(Timestamp::now().minus_days(4));
    handler
        .handle(ApplyProviderEventCommand { event })
        .await
        .unwrap();

    let decision = fx.access("user@example.com", "books").await;
    assert!(!decision.has_access);
    assert_eq!(decision.reason, AccessReason::PaymentFailed);
}

// ════════════════════════════════════════════════════════════════════════════════
// Access Decisions
// ════════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn trial_expiry_is_lazy_and_leaves_stored_status_untouched() {
    let fx = Fixture::new();
    fx.seed_aged_trial("user@example.com", &["books"], TRIAL_LENGTH_DAYS + 3)
        .await;

    let decision = fx.access("user@example.com", "books").await;
    assert!(!decision.has_access);
    assert_eq!(decision.reason, AccessReason::TrialExpired);

    let view = fx
        .get_account_handler()
        .handle(GetAccountQuery {
            email: "user@example.com".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(view.account.subscription_status, SubscriptionStatus::Trial);
    assert_eq!(view.effective_status, SubscriptionStatus::Expired);
}

#[tokio::test]
async fn entitlement_is_checked_before_subscription_state() {
    let fx = Fixture::new();
    fx.signup("user@example.com", &["books"]).await;

    let handler = fx.apply_provider_event_handler();
    handler
        .handle(ApplyProviderEventCommand {
            event: provider_event("evt_2", "user@example.com", SubscriptionStatus::Active),
        })
        .await
        .unwrap();

    let books = fx.access("user@example.com", "books").await;
    assert!(books.has_access);

    // An active subscription still denies an app that was never selected.
    let videos = fx.access("user@example.com", "videos").await;
    assert!(!videos.has_access);
    assert_eq!(videos.reason, AccessReason::AppNotEntitled);
}

#[tokio::test]
async fn unknown_account_denies_uniformly() {
    let fx = Fixture::new();
    let decision = fx.access("ghost@example.com", "music").await;
    assert!(!decision.has_access);
    assert_eq!(decision.reason, AccessReason::AccountNotFound);
}

// ════════════════════════════════════════════════════════════════════════════════
// Admin Flows
// ════════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn lifetime_grant_creates_account_and_survives_subsequent_grant() {
    let fx = Fixture::new();
    let handler = fx.grant_lifetime_handler();

    let first = handler
        .handle(GrantLifetimeCommand {
            email: "vip@example.com".to_string(),
            apps: None,
        })
        .await
        .unwrap();
    assert!(first.created);
    assert_eq!(first.account.subscription_status, SubscriptionStatus::Lifetime);

    let again = handler
        .handle(GrantLifetimeCommand {
            email: "vip@example.com".to_string(),
            apps: None,
        })
        .await
        .unwrap();
    assert!(!again.created);
}

#[tokio::test]
async fn entitlement_edits_are_idempotent() {
    let fx = Fixture::new();
    let account = fx.signup("user@example.com", &["books"]).await;
    let handler = fx.edit_entitlements_handler();

    let added = handler
        .handle(EditEntitlementsCommand {
            account_id: account.id,
            app: "music".to_string(),
            edit: EntitlementEdit::Add,
        })
        .await
        .unwrap();
    assert!(!added.no_op);

    let added_again = handler
        .handle(EditEntitlementsCommand {
            account_id: account.id,
            app: "music".to_string(),
            edit: EntitlementEdit::Add,
        })
        .await
        .unwrap();
    assert!(added_again.no_op);

    let removed = handler
        .handle(EditEntitlementsCommand {
            account_id: account.id,
            app: "music".to_string(),
            edit: EntitlementEdit::Remove,
        })
        .await
        .unwrap();
    assert!(!removed.no_op);
}

// ════════════════════════════════════════════════════════════════════════════════
// Properties
// ════════════════════════════════════════════════════════════════════════════════

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// A trial account's effective status flips from Trial to
        /// Expired exactly at the trial boundary, never earlier.
        #[test]
        fn trial_effective_status_flips_at_boundary(age_days in 0i64..60) {
            let apps: BTreeSet<AppId> =
                [AppId::new("books").unwrap()].into_iter().collect();
            let created = Timestamp::now().minus_days(age_days);
            let account = Account::create_trial(
                AccountId::new(),
                EmailAddress::try_new("user@example.com").unwrap(),
                None,
                apps,
                created,
            )
            .unwrap();

            let effective = account.effective_status(Timestamp::now());
            if age_days < TRIAL_LENGTH_DAYS {
                prop_assert_eq!(effective, SubscriptionStatus::Trial);
            } else {
                prop_assert_eq!(effective, SubscriptionStatus::Expired);
            }
        }
    }
}
