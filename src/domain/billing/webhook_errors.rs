//! Error taxonomy for relay webhook verification.

use thiserror::Error;

/// Errors that occur while verifying and parsing a relay webhook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// The signature did not match the payload.
    #[error("Webhook signature verification failed")]
    InvalidSignature,

    /// The event is older than the acceptance window.
    #[error("Webhook timestamp is too old")]
    TimestampOutOfRange,

    /// The event timestamp is in the future beyond clock-skew tolerance.
    #[error("Webhook timestamp is in the future")]
    InvalidTimestamp,

    /// The signature header or JSON body could not be parsed.
    #[error("Webhook parse error: {0}")]
    ParseError(String),
}
