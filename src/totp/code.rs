//! Six-digit TOTP codes.

use serde::Serialize;
use std::fmt;

use crate::{Error, Result};

/// Message for a missing code.
pub const TOTP_REQUIRED: &str = "2FA TOTP code is required";
/// Message for a code that is not exactly six digits.
pub const TOTP_INVALID: &str = "Incomplete/Invalid TOTP code";

/// A syntactically valid TOTP code: exactly six ASCII digits.
///
/// Whether the code is *correct* is only known to the server.
///
/// # Example
///
/// ```
/// use adminpanel_rs::TotpCode;
///
/// assert_eq!(TotpCode::parse("123456").unwrap().as_str(), "123456");
/// assert!(TotpCode::parse("12345").is_err());
///
/// // Typed input is cleaned as the user types; six digits complete it.
/// assert!(TotpCode::from_input("123 45").is_none());
/// assert_eq!(TotpCode::from_input("123-456").unwrap().as_str(), "123456");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TotpCode(String);

impl TotpCode {
    /// Validate a submitted code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] with [`TOTP_REQUIRED`] for empty
    /// input and [`TOTP_INVALID`] for anything but six digits.
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(Error::InvalidInput(TOTP_REQUIRED.to_string()));
        }
        if input.len() != 6 || !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidInput(TOTP_INVALID.to_string()));
        }
        Ok(Self(input.to_string()))
    }

    /// Clean raw field input, returning a code once six digits are present.
    pub fn from_input(raw: &str) -> Option<Self> {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        (digits.len() == 6).then_some(Self(digits))
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TotpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TotpCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_message(input: &str) -> String {
        match TotpCode::parse(input) {
            Err(Error::InvalidInput(m)) => m,
            other => panic!("expected invalid input, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_messages() {
        assert_eq!(invalid_message(""), TOTP_REQUIRED);
        assert_eq!(invalid_message("12345"), TOTP_INVALID);
        assert_eq!(invalid_message("1234567"), TOTP_INVALID);
        assert_eq!(invalid_message("12a456"), TOTP_INVALID);
        assert_eq!(invalid_message("１２３４５６"), TOTP_INVALID);
    }

    #[test]
    fn test_from_input() {
        assert_eq!(TotpCode::from_input("654321").unwrap().as_str(), "654321");
        assert_eq!(TotpCode::from_input(" 654 321 ").unwrap().as_str(), "654321");
        assert!(TotpCode::from_input("65432").is_none());
        assert!(TotpCode::from_input("6543210").is_none());
    }

    #[test]
    fn test_serializes_as_string() {
        let code = TotpCode::parse("000123").unwrap();
        assert_eq!(serde_json::to_value(&code).unwrap(), serde_json::json!("000123"));
    }
}
