//! Authentication configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Authentication configuration (admin service tokens)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared secret backing admin service tokens
    pub admin_secret: Secret<String>,

    /// Default TTL for minted service tokens in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

impl AuthConfig {
    /// Validate authentication configuration
    ///
    /// Production requires a secret of at least 32 characters; development
    /// only requires one to be present.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        let secret = self.admin_secret.expose_secret();
        if secret.is_empty() {
            return Err(ValidationError::MissingRequired("ADMIN_SECRET"));
        }
        if *environment == Environment::Production && secret.len() < 32 {
            return Err(ValidationError::SecretTooShort("ADMIN_SECRET"));
        }
        Ok(())
    }
}

fn default_token_ttl() -> u64 {
    900
}
