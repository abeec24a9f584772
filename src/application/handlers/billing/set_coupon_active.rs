//! SetCouponActiveHandler - Admin command for toggling a coupon's
//! availability.

use std::sync::Arc;

use crate::domain::coupon::{CouponCode, CouponRejection};
use crate::domain::foundation::DomainError;
use crate::ports::CouponRepository;

/// Command to enable or disable a coupon.
#[derive(Debug, Clone)]
pub struct SetCouponActiveCommand {
    pub code: String,
    pub active: bool,
}

/// Handler for the coupon kill switch.
pub struct SetCouponActiveHandler {
    coupons: Arc<dyn CouponRepository>,
}

impl SetCouponActiveHandler {
    pub fn new(coupons: Arc<dyn CouponRepository>) -> Self {
        Self { coupons }
    }

    pub async fn handle(&self, cmd: SetCouponActiveCommand) -> Result<(), DomainError> {
        let code = CouponCode::try_new(&cmd.code)
            .map_err(|_| DomainError::invalid_coupon(CouponRejection::NotFound.user_message()))?;

        self.coupons.set_active(&code, cmd.active).await?;

        tracing::info!(code = code.as_str(), active = cmd.active, "coupon toggled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::coupon::Coupon;
    use crate::domain::foundation::ErrorCode;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockCouponRepository {
        coupon: Mutex<Option<Coupon>>,
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

        async fn set_active(&self, code: &CouponCode, active: bool) -> Result<(), DomainError> {
            let mut coupon = self.coupon.lock().unwrap();
            match coupon.as_mut().filter(|c| &c.code == code) {
                Some(c) => {
                    c.active = active;
                    Ok(())
                }
                None => Err(DomainError::new(
                    ErrorCode::CouponNotFound,
                    format!("No coupon with code {}", code.as_str()),
                )),
            }
        }

        async fn increment_usage(
            &self,
            _code: &CouponCode,
            _expected_count: u32,
        ) -> Result<bool, DomainError> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn disables_and_reenables_coupon() {
        let repo = Arc::new(MockCouponRepository {
            coupon: Mutex::new(Some(Coupon::lifetime(
                CouponCode::try_new("LAUNCHCREW").unwrap(),
            ))),
        });
        let handler = SetCouponActiveHandler::new(repo.clone());

        handler
            .handle(SetCouponActiveCommand {
                code: "launchcrew".to_string(),
                active: false,
            })
            .await
            .unwrap();
        assert!(!repo.coupon.lock().unwrap().as_ref().unwrap().active);

        handler
            .handle(SetCouponActiveCommand {
                code: "LAUNCHCREW".to_string(),
                active: true,
            })
            .await
            .unwrap();
        assert!(repo.coupon.lock().unwrap().as_ref().unwrap().active);
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let repo = Arc::new(MockCouponRepository {
            coupon: Mutex::new(None),
        });
        let handler = SetCouponActiveHandler::new(repo);

        let err = handler
            .handle(SetCouponActiveCommand {
                code: "NOSUCHCODE".to_string(),
                active: false,
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::CouponNotFound);
    }
}
