//! PostgreSQL implementation of CouponRepository.
//!
//! The usage increment is a conditional UPDATE keyed on the count the
//! caller read, so two racing redemptions of the last use cannot both
//! succeed.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::coupon::{Coupon, CouponCode, CouponKind};
use crate::domain::foundation::{AppId, DomainError, ErrorCode, Timestamp};
use crate::ports::CouponRepository;

pub struct PostgresCouponRepository {
    pool: PgPool,
}

impl PostgresCouponRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn not_found(code: &CouponCode) -> DomainError {
        DomainError::new(
            ErrorCode::CouponNotFound,
            format!("No coupon with code {}", code.as_str()),
        )
    }
}

/// Database row representation of a coupon.
#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    code: String,
    kind: String,
    trial_extension_days: Option<i32>,
    active: bool,
    expires_at: Option<DateTime<Utc>>,
    usage_limit: Option<i32>,
    usage_count: i32,
    granted_apps: Option<Vec<String>>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = DomainError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let code = CouponCode::try_new(&row.code)
            .map_err(|e| invalid_column("code", &e.to_string()))?;

        let kind = match row.kind.as_str() {
            "lifetime" => CouponKind::Lifetime,
            "trial_extension" => {
                let days = row
                    .trial_extension_days
                    .and_then(|d| u32::try_from(d).ok())
                    .ok_or_else(|| invalid_column("trial_extension_days", "missing or negative"))?;
                CouponKind::TrialExtension { days }
            }
            other => return Err(invalid_column("kind", other)),
        };

        let granted_apps = row
            .granted_apps
            .map(|apps| {
                apps.iter()
                    .map(|s| {
                        AppId::new(s).map_err(|e| invalid_column("granted_apps", &e.to_string()))
                    })
                    .collect::<Result<BTreeSet<_>, _>>()
            })
            .transpose()?;

        Ok(Coupon {
            code,
            kind,
            active: row.active,
            expires_at: row.expires_at.map(Timestamp::from_datetime),
            usage_limit: row
                .usage_limit
                .map(|l| {
                    u32::try_from(l).map_err(|_| invalid_column("usage_limit", "negative"))
                })
                .transpose()?,
            usage_count: u32::try_from(row.usage_count)
                .map_err(|_| invalid_column("usage_count", "negative"))?,
            granted_apps,
        })
    }
}

fn invalid_column(column: &str, detail: &str) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid {} value: {}", column, detail),
    )
}

fn kind_to_columns(kind: &CouponKind) -> (&'static str, Option<i32>) {
    match kind {
        CouponKind::Lifetime => ("lifetime", None),
        CouponKind::TrialExtension { days } => ("trial_extension", Some(*days as i32)),
    }
}

#[async_trait]
impl CouponRepository for PostgresCouponRepository {
    async fn find_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>, DomainError> {
        let row: Option<CouponRow> = sqlx::query_as(
            r#"
            SELECT code, kind, trial_extension_days, active, expires_at,
                   usage_limit, usage_count, granted_apps
            FROM coupons
            WHERE code = $1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find coupon: {}", e)))?;

        row.map(Coupon::try_from).transpose()
    }

    async fn save(&self, coupon: &Coupon) -> Result<(), DomainError> {
        let (kind, trial_extension_days) = kind_to_columns(&coupon.kind);
        let granted_apps: Option<Vec<String>> = coupon
            .granted_apps
            .as_ref()
            .map(|apps| apps.iter().map(|a| a.as_str().to_string()).collect());

        sqlx::query(
            r#"
            INSERT INTO coupons (
                code, kind, trial_extension_days, active, expires_at,
                usage_limit, usage_count, granted_apps
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (code) DO UPDATE SET
                kind = EXCLUDED.kind,
                trial_extension_days = EXCLUDED.trial_extension_days,
                active = EXCLUDED.active,
                expires_at = EXCLUDED.expires_at,
                usage_limit = EXCLUDED.usage_limit,
                usage_count = EXCLUDED.usage_count,
                granted_apps = EXCLUDED.granted_apps
            "#,
        )
        .bind(coupon.code.as_str())
        .bind(kind)
        .bind(trial_extension_days)
        .bind(coupon.active)
        .bind(coupon.expires_at.map(|t| *t.as_datetime()))
        .bind(coupon.usage_limit.map(|l| l as i32))
        .bind(coupon.usage_count as i32)
        .bind(granted_apps)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to save coupon: {}", e)))?;

        Ok(())
    }

    async fn set_active(&self, code: &CouponCode, active: bool) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE coupons SET active = $2 WHERE code = $1")
            .bind(code.as_str())
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to update coupon: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(code));
        }

        Ok(())
    }

    async fn increment_usage(
        &self,
        code: &CouponCode,
        expected_count: u32,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE coupons SET usage_count = usage_count + 1 \
             WHERE code = $1 AND usage_count = $2",
        )
        .bind(code.as_str())
        .bind(expected_count as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to increment coupon usage: {}", e)))?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        // No row matched: either the count moved under us or the code
        // does not exist. Distinguish so callers can retry the former.
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM coupons WHERE code = $1)")
                .bind(code.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to check coupon: {}", e)))?;

        if exists {
            Ok(false)
        } else {
            Err(Self::not_found(code))
        }
    }
}
