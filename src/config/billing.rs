//! Billing configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Billing configuration (payment relay webhooks)
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Shared secret the relay signs webhook payloads with
    pub relay_webhook_secret: Secret<String>,
}

impl BillingConfig {
    /// Validate billing configuration
    ///
    /// Production requires a secret of at least 32 characters.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        let secret = self.relay_webhook_secret.expose_secret();
        if secret.is_empty() {
            return Err(ValidationError::MissingRequired("RELAY_WEBHOOK_SECRET"));
        }
        if *environment == Environment::Production && secret.len() < 32 {
            return Err(ValidationError::SecretTooShort("RELAY_WEBHOOK_SECRET"));
        }
        Ok(())
    }
}
