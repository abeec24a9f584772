//! Coupon code value object.
//!
//! Codes are normalized to trimmed uppercase so that `" launchcrew "`
//! and `"LAUNCHCREW"` address the same registry row.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// A validated, normalized coupon code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouponCode(String);

impl CouponCode {
    /// Creates a CouponCode, trimming whitespace and uppercasing.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the trimmed code is empty, longer
    /// than 40 characters, or contains anything other than ASCII
    /// alphanumerics and hyphens.
    pub fn try_new(code: &str) -> Result<Self, ValidationError> {
        let normalized = code.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(ValidationError::empty_field("coupon_code"));
        }
        if normalized.len() > 40 {
            return Err(ValidationError::out_of_range(
                "coupon_code_length",
                1,
                40,
                normalized.len() as i32,
            ));
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ValidationError::invalid_format(
                "coupon_code",
                "alphanumeric characters and hyphens only",
            ));
        }
        Ok(Self(normalized))
    }

    /// Returns the normalized code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CouponCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for CouponCode {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl TryFrom<String> for CouponCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_new(&value)
    }
}
