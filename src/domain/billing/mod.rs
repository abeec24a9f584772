//! Payment-provider event envelope and relay webhook verification.

mod provider_event;
mod webhook_errors;
mod webhook_verifier;

pub use provider_event::ProviderEvent;
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{sign_payload, RelaySignatureHeader, RelayWebhookVerifier};
