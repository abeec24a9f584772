//! Payment-provider event envelope.
//!
//! The relay strips provider-specific protocol details down to "an event
//! with a unique id and a status payload, delivered at least once". The
//! `event_id` is the idempotency key; everything else is the requested
//! ledger update.

use serde::{Deserialize, Serialize};

use crate::domain::account::{BillingInterval, SubscriptionStatus};
use crate::domain::foundation::Timestamp;

/// One inbound provider event, already verified and parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEvent {
    /// Provider-unique event id; the webhook dedup key.
    pub event_id: String,

    /// Email of the account the event refers to.
    pub email: String,

    /// Requested stored status.
    pub status: SubscriptionStatus,

    /// "Access ends at" / "payment was due at", depending on status.
    #[serde(default)]
    pub subscription_ends_at: Option<Timestamp>,

    #[serde(default)]
    pub billing_interval: Option<BillingInterval>,

    /// Provider customer reference, when (re)linking.
    #[serde(default)]
    pub customer_ref: Option<String>,

    /// Provider subscription reference, when (re)linking.
    #[serde(default)]
    pub subscription_ref: Option<String>,
}

impl ProviderEvent {
    /// Parses an event from the relay's JSON body.
    pub fn from_json(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_event() {
        let json = br#"{"event_id":"evt_1","email":"user@example.com","status":"active"}"#;
        let event = ProviderEvent::from_json(json).unwrap();

        assert_eq!(event.event_id, "evt_1");
        assert_eq!(event.status, SubscriptionStatus::Active);
        assert!(event.subscription_ends_at.is_none());
        assert!(event.billing_interval.is_none());
    }

    #[test]
    fn parses_full_event() {
        let json = br#"{
            "event_id": "evt_2",
            "email": "user@example.com",
            "status": "past_due",
            "subscription_ends_at": "2024-01-15T00:00:00Z",
            "billing_interval": "monthly",
            "customer_ref": "cus_123",
            "subscription_ref": "sub_456"
        }"#;
        let event = ProviderEvent::from_json(json).unwrap();

        assert_eq!(event.status, SubscriptionStatus::PastDue);
        assert!(event.subscription_ends_at.is_some());
        assert_eq!(event.billing_interval, Some(BillingInterval::Monthly));
        assert_eq!(event.customer_ref.as_deref(), Some("cus_123"));
    }

    #[test]
    fn unknown_status_fails_to_parse() {
        let json = br#"{"event_id":"evt_3","email":"user@example.com","status":"platinum"}"#;
        assert!(ProviderEvent::from_json(json).is_err());
    }

    #[test]
    fn missing_event_id_fails_to_parse() {
        let json = br#"{"email":"user@example.com","status":"active"}"#;
        assert!(ProviderEvent::from_json(json).is_err());
    }
}
