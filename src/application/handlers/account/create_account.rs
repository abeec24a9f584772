//! CreateAccountHandler - Command handler for account signup.
//!
//! Accounts start on a 7-day trial unless a lifetime coupon is supplied,
//! in which case the account is created directly in lifetime status with
//! the coupon's granted apps. Trial-extension coupons lengthen the trial
//! window at signup.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::account::{Account, AuditEvent, AuditEventKind};
use crate::domain::coupon::CouponKind;
use crate::domain::foundation::{AccountId, AppId, DomainError, EmailAddress, Timestamp};
use crate::ports::{AccountRepository, AuditLog, CouponRepository};

use crate::application::handlers::billing::{consume_usage, resolve_coupon};

/// Command to create an account.
#[derive(Debug, Clone)]
pub struct CreateAccountCommand {
    pub email: String,
    pub name: Option<String>,
    pub selected_apps: Vec<String>,
    pub coupon_code: Option<String>,
}

/// Result of successful account creation.
#[derive(Debug, Clone)]
pub struct CreateAccountResult {
    pub account: Account,
}

/// Handler for account signup.
pub struct CreateAccountHandler {
    accounts: Arc<dyn AccountRepository>,
    coupons: Arc<dyn CouponRepository>,
    audit_log: Arc<dyn AuditLog>,
}

impl CreateAccountHandler {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        coupons: Arc<dyn CouponRepository>,
        audit_log: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            accounts,
            coupons,
            audit_log,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateAccountCommand,
    ) -> Result<CreateAccountResult, DomainError> {
        let now = Timestamp::now();

        // 1. Validate inputs
        let email = EmailAddress::try_new(&cmd.email)?;
        if cmd.selected_apps.is_empty() {
            return Err(DomainError::validation(
                "selected_apps",
                "At least one application must be selected",
            ));
        }
        let selected_apps = cmd
            .selected_apps
            .iter()
            .map(|raw| AppId::new(raw))
            .collect::<Result<BTreeSet<_>, _>>()?;

        // 2. Reject duplicate email
        if self.accounts.find_by_email(&email).await?.is_some() {
            return Err(DomainError::duplicate_account(email.as_str()));
        }

        // 3. Resolve a supplied coupon before creating anything
        let resolved = match &cmd.coupon_code {
            Some(raw) => Some(resolve_coupon(self.coupons.as_ref(), raw, now).await?),
            None => None,
        };

        // 4. Build the aggregate
        let id = AccountId::new();
        let (mut account, kind) = match &resolved {
            Some(coupon) => match coupon.kind() {
                CouponKind::Lifetime => {
                    let apps = coupon.granted_apps();
                    let mut account =
                        Account::create_lifetime(id, email, cmd.name.clone(), apps, now)?;
                    account.coupon_code = Some(coupon.code().as_str().to_string());
                    account.coupon_redeemed_at = Some(now);
                    (account, Some(coupon.kind()))
                }
                CouponKind::TrialExtension { days } => {
                    let mut account =
                        Account::create_trial(id, email, cmd.name.clone(), selected_apps, now)?;
                    account.extend_trial(days, now)?;
                    account.coupon_code = Some(coupon.code().as_str().to_string());
                    account.coupon_redeemed_at = Some(now);
                    (account, Some(coupon.kind()))
                }
            },
            None => (
                Account::create_trial(id, email, cmd.name.clone(), selected_apps, now)?,
                None,
            ),
        };

        // 5. Consume the coupon use before the insert; a loser of a
        //    last-use race must not end up with an account it paid nothing
        //    for. The inverse race exists: a signup that loses a
        //    concurrent duplicate-email insert after this point has
        //    burned a use with no account. The duplicate check at step 2
        //    narrows that window; a user-facing retry resolves it.
        if let Some(coupon) = &resolved {
            consume_usage(self.coupons.as_ref(), coupon, now).await?;
        }

        // 6. Persist; signup counts as the first login
        account.record_login(now);
        self.accounts.insert(&account).await?;

        // 7. Audit: one creation event, plus the coupon application
        let creation_kind = match kind {
            Some(CouponKind::Lifetime) => None,
            _ => Some(AuditEventKind::TrialStarted {
                trial_expires_at: account
                    .trial_expires_at
                    .unwrap_or(now),
                apps: account.entitled_apps.iter().cloned().collect(),
            }),
        };
        if let Some(kind) = creation_kind {
            let event =
                AuditEvent::for_account(account.id, account.subscription_status, kind, now);
            self.audit_log.append(&event).await?;
        }
        if let Some(coupon) = &resolved {
            let event = AuditEvent::for_account(
                account.id,
                account.subscription_status,
                AuditEventKind::CouponApplied {
                    code: coupon.code().as_str().to_string(),
                    granted_apps: account.entitled_apps.iter().cloned().collect(),
                },
                now,
            );
            self.audit_log.append(&event).await?;
        }

        tracing::info!(
            account_id = %account.id,
            status = account.subscription_status.as_str(),
            "account created"
        );

        Ok(CreateAccountResult { account })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::SubscriptionStatus;
    use crate::domain::coupon::{Coupon, CouponCode};
    use crate::domain::foundation::ErrorCode;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    struct MockAccountRepository {
        accounts: Mutex<Vec<Account>>,
    }

    impl MockAccountRepository {
        fn new() -> Self {
            Self {
                accounts: Mutex::new(Vec::new()),
            }
        }

        fn with_account(account: Account) -> Self {
            Self {
                accounts: Mutex::new(vec![account]),
            }
        }

        fn stored(&self) -> Vec<Account> {
            self.accounts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AccountRepository for MockAccountRepository {
        async fn insert(&self, account: &Account) -> Result<(), DomainError> {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.iter().any(|a| a.email == account.email) {
                return Err(DomainError::duplicate_account(account.email.as_str()));
            }
            accounts.push(account.clone());
            Ok(())
        }

        async fn update(&self, account: &Account) -> Result<(), DomainError> {
            let mut accounts = self.accounts.lock().unwrap();
            match accounts.iter_mut().find(|a| a.id == account.id) {
                Some(slot) => {
                    *slot = account.clone();
                    Ok(())
                }
                None => Err(DomainError::account_not_found(account.id.to_string())),
            }
        }

        async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
            let accounts = self.accounts.lock().unwrap();
            Ok(accounts.iter().find(|a| &a.id == id).cloned())
        }

        async fn find_by_email(
            &self,
            email: &EmailAddress,
        ) -> Result<Option<Account>, DomainError> {
            let accounts = self.accounts.lock().unwrap();
            Ok(accounts.iter().find(|a| &a.email == email).cloned())
        }

        async fn delete(&self, id: &AccountId) -> Result<(), DomainError> {
            let mut accounts = self.accounts.lock().unwrap();
            accounts.retain(|a| &a.id != id);
            Ok(())
        }
    }

    struct MockCouponRepository {
        coupon: Mutex<Option<Coupon>>,
    }

    impl MockCouponRepository {
        fn with_coupon(coupon: Coupon) -> Self {
            Self {
                coupon: Mutex::new(Some(coupon)),
            }
        }

        fn empty() -> Self {
            Self {
                coupon: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl CouponRepository for MockCouponRepository {
        async fn find_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>, DomainError> {
            let coupon = self.coupon.lock().unwrap();
            Ok(coupon.as_ref().filter(|c| &c.code == code).cloned())
        }

        async fn save(&self, coupon: &Coupon) -> Result<(), DomainError> {
            *self.coupon.lock().unwrap() = Some(coupon.clone());
            Ok(())
        }

        async fn set_active(&self, _code: &CouponCode, _active: bool) -> Result<(), DomainError> {
            Ok(())
        }

        async fn increment_usage(
            &self,
            _code: &CouponCode,
            expected_count: u32,
        ) -> Result<bool, DomainError> {
            let mut coupon = self.coupon.lock().unwrap();
            let coupon = coupon.as_mut().unwrap();
            if coupon.usage_count == expected_count {
                coupon.usage_count += 1;
                Ok(true)
            } else {
                Ok(false)
            }
        }
    }

    struct MockAuditLog {
        events: Mutex<Vec<AuditEvent>>,
    }

    impl MockAuditLog {
        fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }

        fn events(&self) -> Vec<AuditEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AuditLog for MockAuditLog {
        async fn append(&self, event: &AuditEvent) -> Result<(), DomainError> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }

        async fn append_if_new(&self, event: &AuditEvent) -> Result<bool, DomainError> {
            self.events.lock().unwrap().push(event.clone());
            Ok(true)
        }

        async fn contains_provider_event(
            &self,
            provider_event_id: &str,
        ) -> Result<bool, DomainError> {
            let events = self.events.lock().unwrap();
            Ok(events
                .iter()
                .any(|e| e.provider_event_id.as_deref() == Some(provider_event_id)))
        }

        async fn events_for_account(
            &self,
            account_id: &AccountId,
        ) -> Result<Vec<AuditEvent>, DomainError> {
            let events = self.events.lock().unwrap();
            Ok(events
                .iter()
                .filter(|e| e.account_id.as_ref() == Some(account_id))
                .cloned()
                .collect())
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn handler(
        accounts: Arc<MockAccountRepository>,
        coupons: Arc<MockCouponRepository>,
        audit: Arc<MockAuditLog>,
    ) -> CreateAccountHandler {
        CreateAccountHandler::new(accounts, coupons, audit)
    }

    fn signup(email: &str) -> CreateAccountCommand {
        CreateAccountCommand {
            email: email.to_string(),
            name: Some("Pat".to_string()),
            selected_apps: vec!["books".to_string()],
            coupon_code: None,
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Success Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn creates_trial_account_with_seven_day_window() {
        let accounts = Arc::new(MockAccountRepository::new());
        let coupons = Arc::new(MockCouponRepository::empty());
        let audit = Arc::new(MockAuditLog::new());

        let result = handler(accounts.clone(), coupons, audit.clone())
            .handle(signup("new@example.com"))
            .await
            .unwrap();

        let account = result.account;
        assert_eq!(account.subscription_status, SubscriptionStatus::Trial);
        let expiry = account.trial_expires_at.unwrap();
        let expected = account.trial_started_at.unwrap().add_days(7);
        assert_eq!(expiry, expected);
        assert!(account.last_login_at.is_some());

        assert_eq!(accounts.stored().len(), 1);
        let events = audit.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "trial.started");
    }

    #[tokio::test]
    async fn lifetime_coupon_creates_lifetime_account() {
        let accounts = Arc::new(MockAccountRepository::new());
        let coupons = Arc::new(MockCouponRepository::with_coupon(Coupon::lifetime(
            CouponCode::try_new("LAUNCHCREW").unwrap(),
        )));
        let audit = Arc::new(MockAuditLog::new());

        let mut cmd = signup("vip@example.com");
        cmd.coupon_code = Some("launchcrew".to_string());

        let result = handler(accounts, coupons.clone(), audit.clone())
            .handle(cmd)
            .await
            .unwrap();

        let account = result.account;
        assert_eq!(account.subscription_status, SubscriptionStatus::Lifetime);
        assert!(account.trial_expires_at.is_none());
        assert_eq!(account.entitled_apps.len(), 3);
        assert_eq!(account.coupon_code.as_deref(), Some("LAUNCHCREW"));

        let stored = coupons
            .find_by_code(&CouponCode::try_new("LAUNCHCREW").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.usage_count, 1);

        // No trial.started for a lifetime signup, just the coupon.
        let events = audit.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "coupon.applied");
    }

    #[tokio::test]
    async fn trial_extension_coupon_lengthens_window_at_signup() {
        let accounts = Arc::new(MockAccountRepository::new());
        let mut coupon = Coupon::lifetime(CouponCode::try_new("EXTRAWEEK").unwrap());
        coupon.kind = CouponKind::TrialExtension { days: 7 };
        let coupons = Arc::new(MockCouponRepository::with_coupon(coupon));
        let audit = Arc::new(MockAuditLog::new());

        let mut cmd = signup("keen@example.com");
        cmd.coupon_code = Some("EXTRAWEEK".to_string());

        let result = handler(accounts, coupons, audit.clone())
            .handle(cmd)
            .await
            .unwrap();

        let account = result.account;
        assert_eq!(account.subscription_status, SubscriptionStatus::Trial);
        let expiry = account.trial_expires_at.unwrap();
        let expected = account.trial_started_at.unwrap().add_days(14);
        assert_eq!(expiry, expected);

        let events = audit.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type(), "trial.started");
        assert_eq!(events[1].event_type(), "coupon.applied");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Failure Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn rejects_empty_app_selection() {
        let accounts = Arc::new(MockAccountRepository::new());
        let coupons = Arc::new(MockCouponRepository::empty());
        let audit = Arc::new(MockAuditLog::new());

        let mut cmd = signup("new@example.com");
        cmd.selected_apps = vec![];

        let err = handler(accounts.clone(), coupons, audit)
            .handle(cmd)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(accounts.stored().is_empty());
    }

    #[tokio::test]
    async fn rejects_duplicate_email() {
        let existing = Account::create_trial(
            AccountId::new(),
            EmailAddress::try_new("taken@example.com").unwrap(),
            None,
            ["books"].iter().map(|a| AppId::new(*a).unwrap()).collect(),
            Timestamp::now(),
        )
        .unwrap();
        let accounts = Arc::new(MockAccountRepository::with_account(existing));
        let coupons = Arc::new(MockCouponRepository::empty());
        let audit = Arc::new(MockAuditLog::new());

        let err = handler(accounts, coupons, audit.clone())
            .handle(signup("taken@example.com"))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::DuplicateAccount);
        assert!(audit.events().is_empty());
    }

    #[tokio::test]
    async fn email_matching_is_case_sensitive() {
        let existing = Account::create_trial(
            AccountId::new(),
            EmailAddress::try_new("Taken@example.com").unwrap(),
            None,
            ["books"].iter().map(|a| AppId::new(*a).unwrap()).collect(),
            Timestamp::now(),
        )
        .unwrap();
        let accounts = Arc::new(MockAccountRepository::with_account(existing));
        let coupons = Arc::new(MockCouponRepository::empty());
        let audit = Arc::new(MockAuditLog::new());

        // Different casing is a different account.
        let result = handler(accounts.clone(), coupons, audit)
            .handle(signup("taken@example.com"))
            .await;

        assert!(result.is_ok());
        assert_eq!(accounts.stored().len(), 2);
    }

    #[tokio::test]
    async fn invalid_coupon_blocks_signup() {
        let accounts = Arc::new(MockAccountRepository::new());
        let coupons = Arc::new(MockCouponRepository::empty());
        let audit = Arc::new(MockAuditLog::new());

        let mut cmd = signup("new@example.com");
        cmd.coupon_code = Some("NOSUCHCODE".to_string());

        let err = handler(accounts.clone(), coupons, audit)
            .handle(cmd)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidCoupon);
        assert!(accounts.stored().is_empty());
    }

    #[tokio::test]
    async fn rejects_malformed_email() {
        let accounts = Arc::new(MockAccountRepository::new());
        let coupons = Arc::new(MockCouponRepository::empty());
        let audit = Arc::new(MockAuditLog::new());

        let err = handler(accounts, coupons, audit)
            .handle(signup("not-an-email"))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidFormat);
    }
}
