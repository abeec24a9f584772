//! PostgreSQL implementation of AccountRepository.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::account::{Account, BillingInterval, SubscriptionStatus};
use crate::domain::foundation::{
    AccountId, AppId, DomainError, EmailAddress, ErrorCode, Timestamp,
};
use crate::ports::AccountRepository;

/// PostgreSQL implementation of the AccountRepository port.
///
/// Email uniqueness rides on the `accounts_email_key` constraint;
/// lookups are exact-match against the stored casing.
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an account.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    name: Option<String>,
    subscription_status: String,
    trial_started_at: Option<DateTime<Utc>>,
    trial_expires_at: Option<DateTime<Utc>>,
    subscription_ends_at: Option<DateTime<Utc>>,
    billing_interval: Option<String>,
    entitled_apps: Vec<String>,
    onboarding_completed: serde_json::Value,
    payment_customer_ref: Option<String>,
    payment_subscription_ref: Option<String>,
    coupon_code: Option<String>,
    coupon_redeemed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
}

impl TryFrom<AccountRow> for Account {
    type Error = DomainError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let subscription_status = SubscriptionStatus::parse(&row.subscription_status)
            .ok_or_else(|| invalid_column("subscription_status", &row.subscription_status))?;
        let billing_interval = row
            .billing_interval
            .as_deref()
            .map(|s| BillingInterval::parse(s).ok_or_else(|| invalid_column("billing_interval", s)))
            .transpose()?;

        let entitled_apps = row
            .entitled_apps
            .iter()
            .map(|s| AppId::new(s).map_err(|e| invalid_column("entitled_apps", &e.to_string())))
            .collect::<Result<BTreeSet<_>, _>>()?;

        let onboarding_completed: BTreeMap<AppId, bool> =
            serde_json::from_value(row.onboarding_completed)
                .map_err(|e| invalid_column("onboarding_completed", &e.to_string()))?;

        Ok(Account {
            id: AccountId::from_uuid(row.id),
            email: EmailAddress::try_new(&row.email)
                .map_err(|e| invalid_column("email", &e.to_string()))?,
            name: row.name,
            subscription_status,
            trial_started_at: row.trial_started_at.map(Timestamp::from_datetime),
            trial_expires_at: row.trial_expires_at.map(Timestamp::from_datetime),
            subscription_ends_at: row.subscription_ends_at.map(Timestamp::from_datetime),
            billing_interval,
            entitled_apps,
            onboarding_completed,
            payment_customer_ref: row.payment_customer_ref,
            payment_subscription_ref: row.payment_subscription_ref,
            coupon_code: row.coupon_code,
            coupon_redeemed_at: row.coupon_redeemed_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            last_login_at: row.last_login_at.map(Timestamp::from_datetime),
        })
    }
}

fn invalid_column(column: &str, detail: &str) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid {} value: {}", column, detail),
    )
}

fn apps_to_vec(account: &Account) -> Vec<String> {
    account
        .entitled_apps
        .iter()
        .map(|a| a.as_str().to_string())
        .collect()
}

fn onboarding_to_json(account: &Account) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(&account.onboarding_completed)
        .map_err(|e| DomainError::database(format!("Failed to encode onboarding map: {}", e)))
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, email, name, subscription_status, trial_started_at, trial_expires_at,
           subscription_ends_at, billing_interval, entitled_apps, onboarding_completed,
           payment_customer_ref, payment_subscription_ref, coupon_code, coupon_redeemed_at,
           created_at, last_login_at
    FROM accounts
"#;

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn insert(&self, account: &Account) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, email, name, subscription_status, trial_started_at, trial_expires_at,
                subscription_ends_at, billing_interval, entitled_apps, onboarding_completed,
                payment_customer_ref, payment_subscription_ref, coupon_code, coupon_redeemed_at,
                created_at, last_login_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(account.email.as_str())
        .bind(&account.name)
        .bind(account.subscription_status.as_str())
        .bind(account.trial_started_at.map(|t| *t.as_datetime()))
        .bind(account.trial_expires_at.map(|t| *t.as_datetime()))
        .bind(account.subscription_ends_at.map(|t| *t.as_datetime()))
        .bind(account.billing_interval.map(|i| i.as_str()))
        .bind(apps_to_vec(account))
        .bind(onboarding_to_json(account)?)
        .bind(&account.payment_customer_ref)
        .bind(&account.payment_subscription_ref)
        .bind(&account.coupon_code)
        .bind(account.coupon_redeemed_at.map(|t| *t.as_datetime()))
        .bind(*account.created_at.as_datetime())
        .bind(account.last_login_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("accounts_email_key") {
                    return DomainError::duplicate_account(account.email.as_str());
                }
            }
            DomainError::database(format!("Failed to insert account: {}", e))
        })?;

        Ok(())
    }

    async fn update(&self, account: &Account) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts SET
                name = $2,
                subscription_status = $3,
                trial_started_at = $4,
                trial_expires_at = $5,
                subscription_ends_at = $6,
                billing_interval = $7,
                entitled_apps = $8,
                onboarding_completed = $9,
                payment_customer_ref = $10,
                payment_subscription_ref = $11,
                coupon_code = $12,
                coupon_redeemed_at = $13,
                last_login_at = $14
            WHERE id = $1
            "#,
        )
        .bind(account.id.as_uuid())
        .bind(&account.name)
        .bind(account.subscription_status.as_str())
        .bind(account.trial_started_at.map(|t| *t.as_datetime()))
        .bind(account.trial_expires_at.map(|t| *t.as_datetime()))
        .bind(account.subscription_ends_at.map(|t| *t.as_datetime()))
        .bind(account.billing_interval.map(|i| i.as_str()))
        .bind(apps_to_vec(account))
        .bind(onboarding_to_json(account)?)
        .bind(&account.payment_customer_ref)
        .bind(&account.payment_subscription_ref)
        .bind(&account.coupon_code)
        .bind(account.coupon_redeemed_at.map(|t| *t.as_datetime()))
        .bind(account.last_login_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update account: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::account_not_found(account.id.to_string()));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", SELECT_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to find account: {}", e)))?;

        row.map(Account::try_from).transpose()
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Account>, DomainError> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("{} WHERE email = $1", SELECT_COLUMNS))
                .bind(email.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to find account: {}", e)))?;

        row.map(Account::try_from).transpose()
    }

    async fn delete(&self, id: &AccountId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to delete account: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::account_not_found(id.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            SubscriptionStatus::Trial,
            SubscriptionStatus::Active,
            SubscriptionStatus::Lifetime,
            SubscriptionStatus::Canceled,
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Incomplete,
            SubscriptionStatus::Expired,
        ] {
            assert_eq!(SubscriptionStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn row_conversion_rejects_unknown_status() {
        let row = AccountRow {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            name: None,
            subscription_status: "platinum".to_string(),
            trial_started_at: None,
            trial_expires_at: None,
            subscription_ends_at: None,
            billing_interval: None,
            entitled_apps: vec!["books".to_string()],
            onboarding_completed: serde_json::json!({}),
            payment_customer_ref: None,
            payment_subscription_ref: None,
            coupon_code: None,
            coupon_redeemed_at: None,
            created_at: Utc::now(),
            last_login_at: None,
        };

        let err = Account::try_from(row).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn row_conversion_builds_aggregate() {
        let row = AccountRow {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            name: Some("Pat".to_string()),
            subscription_status: "lifetime".to_string(),
            trial_started_at: None,
            trial_expires_at: None,
            subscription_ends_at: None,
            billing_interval: Some("yearly".to_string()),
            entitled_apps: vec!["books".to_string(), "music".to_string()],
            onboarding_completed: serde_json::json!({"books": true}),
            payment_customer_ref: Some("cus_1".to_string()),
            payment_subscription_ref: None,
            coupon_code: Some("LAUNCHCREW".to_string()),
            coupon_redeemed_at: None,
            created_at: Utc::now(),
            last_login_at: None,
        };

        let account = Account::try_from(row).unwrap();
        assert_eq!(account.subscription_status, SubscriptionStatus::Lifetime);
        assert_eq!(account.entitled_apps.len(), 2);
        assert!(account.onboarding_completed_for(&AppId::new("books").unwrap()));
        assert_eq!(account.billing_interval, Some(BillingInterval::Yearly));
    }
}
