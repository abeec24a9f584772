//! RedeemCouponHandler - Command handler for redeeming a coupon against
//! an existing account.

use std::sync::Arc;

use crate::domain::account::{Account, AuditEvent, AuditEventKind};
use crate::domain::coupon::CouponKind;
use crate::domain::foundation::{AccountId, DomainError, Timestamp};
use crate::ports::{AccountRepository, AuditLog, CouponRepository};

use super::{consume_usage, resolve_coupon};

/// Command to redeem a coupon for the authenticated account.
#[derive(Debug, Clone)]
pub struct RedeemCouponCommand {
    pub account_id: AccountId,
    pub code: String,
}

/// Result of a successful redemption.
#[derive(Debug, Clone)]
pub struct RedeemCouponResult {
    pub account: Account,
}

/// Handler for coupon redemption.
pub struct RedeemCouponHandler {
    accounts: Arc<dyn AccountRepository>,
    coupons: Arc<dyn CouponRepository>,
    audit_log: Arc<dyn AuditLog>,
}

impl RedeemCouponHandler {
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
        cmd: RedeemCouponCommand,
    ) -> Result<RedeemCouponResult, DomainError> {
        let now = Timestamp::now();

        // 1. Load the account
        let mut account = self
            .accounts
            .find_by_id(&cmd.account_id)
            .await?
            .ok_or_else(|| DomainError::account_not_found(cmd.account_id.to_string()))?;

        // 2. Resolve and validate the code
        let resolved = resolve_coupon(self.coupons.as_ref(), &cmd.code, now).await?;

        // 3. Apply the reward to the in-memory copy first, so a reward
        //    that cannot apply never burns a use
        let granted_apps = match resolved.kind() {
            CouponKind::Lifetime => {
                let apps = resolved.granted_apps();
                account.grant_lifetime(apps.clone(), Some(resolved.code().as_str()), now)?;
                apps
            }
            CouponKind::TrialExtension { days } => {
                account.extend_trial(days, now)?;
                account.coupon_code = Some(resolved.code().as_str().to_string());
                account.coupon_redeemed_at = Some(now);
                account.entitled_apps.clone()
            }
        };

        // 4. Consume a use; the loser of a last-use race fails here and
        //    its account row is never written
        consume_usage(self.coupons.as_ref(), &resolved, now).await?;

        // 5. Persist the single-row account write
        self.accounts.update(&account).await?;

        // 6. Record the redemption
        let event = AuditEvent::for_account(
            account.id,
            account.subscription_status,
            AuditEventKind::CouponApplied {
                code: resolved.code().as_str().to_string(),
                granted_apps: granted_apps.into_iter().collect(),
            },
            now,
        );
        self.audit_log.append(&event).await?;

        tracing::info!(
            account_id = %account.id,
            code = resolved.code().as_str(),
            "coupon redeemed"
        );

        Ok(RedeemCouponResult { account })
    }
}
