//! HTTP DTOs for billing endpoints.

use serde::{Deserialize, Serialize};

use super::super::account::dto::AccountResponse;

/// Request to redeem a coupon for the calling account.
#[derive(Debug, Clone, Deserialize)]
pub struct RedeemCouponRequest {
    pub code: String,
}

/// Request to toggle a coupon's availability (admin).
#[derive(Debug, Clone, Deserialize)]
pub struct SetCouponActiveRequest {
    pub active: bool,
}

/// Response for a successful redemption.
#[derive(Debug, Clone, Serialize)]
pub struct RedeemCouponResponse {
    #[serde(flatten)]
    pub account: AccountResponse,
}

/// Acknowledgement returned to the payment relay.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    /// `false` when the delivery was a replay and was skipped.
    pub applied: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redeem_request_deserializes() {
        let request: RedeemCouponRequest =
            serde_json::from_str(r#"{"code": "LAUNCH50"}"#).unwrap();
        assert_eq!(request.code, "LAUNCH50");
    }

    #[test]
    fn ack_serializes_applied_flag() {
        let json = serde_json::to_value(WebhookAckResponse { applied: false }).unwrap();
        assert_eq!(json["applied"], false);
    }
}
