//! Administrative credential verification.
//!
//! One deployment secret validates administrative intent. Callers present
//! a minted, expiring service token signed with HMAC-SHA256 rather than
//! the raw secret itself, and all comparisons are constant-time.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use super::Timestamp;

/// Errors that can occur during service token verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The token is malformed or its signature does not verify.
    #[error("Invalid service token")]
    InvalidToken,

    /// The token verified but its expiry has passed.
    #[error("Service token expired")]
    TokenExpired,
}

/// A minted service token: `subject.expiry_unix.signature_hex`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceToken {
    pub subject: String,
    pub expires_at: Timestamp,
    token: String,
}

impl ServiceToken {
    /// Returns the wire form of the token.
    pub fn as_str(&self) -> &str {
        &self.token
    }
}

/// Verifier and minter for admin service tokens, bound to one shared secret.
pub struct AdminCredential {
    secret: Secret<String>,
}

impl AdminCredential {
    /// Creates a credential from the deployment secret.
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }

    /// Mints a token for `subject` valid for `ttl_secs` seconds.
    ///
    /// Used by operational tooling and tests; the relay holding the secret
    /// mints its own tokens the same way.
    pub fn mint(&self, subject: &str, ttl_secs: u64) -> ServiceToken {
        let expires_at = Timestamp::now().plus_secs(ttl_secs);
        let signature = self.sign(subject, expires_at.as_unix_secs());
        let token = format!("{}.{}.{}", subject, expires_at.as_unix_secs(), signature);
        ServiceToken {
            subject: subject.to_string(),
            expires_at,
            token,
        }
    }

    /// Verifies a presented token and returns its subject.
    ///
    /// # Errors
    ///
    /// - `InvalidToken` - malformed token or signature mismatch
    /// - `TokenExpired` - signature valid but expiry has passed
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        let mut parts = token.rsplitn(2, '.');
        let signature_hex = parts.next().ok_or(AuthError::InvalidToken)?;
        let signed_part = parts.next().ok_or(AuthError::InvalidToken)?;

        let (subject, expiry_str) = signed_part.rsplit_once('.').ok_or(AuthError::InvalidToken)?;
        if subject.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        let expiry: u64 = expiry_str.parse().map_err(|_| AuthError::InvalidToken)?;

        let expected = self.sign(subject, expiry);
        let presented = hex::decode(signature_hex).map_err(|_| AuthError::InvalidToken)?;
        let expected_bytes = hex::decode(&expected).expect("sign produces valid hex");
        if !constant_time_compare(&expected_bytes, &presented) {
            return Err(AuthError::InvalidToken);
        }

        // Expiry is checked after the signature so a forged expiry cannot
        // distinguish "bad signature" from "expired".
        if Timestamp::from_unix_secs(expiry).is_before(&Timestamp::now()) {
            return Err(AuthError::TokenExpired);
        }

        Ok(subject.to_string())
    }

    fn sign(&self, subject: &str, expiry: u64) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key");
        mac.update(format!("{}.{}", subject, expiry).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
