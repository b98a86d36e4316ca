//! Local input validation.
//!
//! These checks mirror the server's own rules so obviously bad input is
//! rejected before a signed request is built. They return
//! [`Error::InvalidInput`] with an operator-facing message.

use regex::Regex;
use std::sync::OnceLock;

use crate::{Error, Result};

/// Default maximum length of an e-mail address.
pub const EMAIL_MAX_LEN: usize = 32;

/// Maximum length of an end-user e-mail address.
pub const USER_EMAIL_MAX_LEN: usize = 64;

/// Maximum size of a baggage value in bytes.
pub const BAGGAGE_VALUE_MAX_LEN: usize = 1024;

static USERNAME: OnceLock<Regex> = OnceLock::new();
static EMAIL: OnceLock<Regex> = OnceLock::new();
static PHONE: OnceLock<Regex> = OnceLock::new();
static CACHE_OBJECT_ID: OnceLock<Regex> = OnceLock::new();
static LOG_FLAG: OnceLock<Regex> = OnceLock::new();
static GROUP_NAME: OnceLock<Regex> = OnceLock::new();
static LOG_FILTER: OnceLock<Regex> = OnceLock::new();
static BAGGAGE_KEY: OnceLock<Regex> = OnceLock::new();

const USERNAME_PATTERN: &str = r"^[a-zA-Z0-9]+[a-zA-Z0-9\-_]?[a-zA-Z0-9]+$";
const EMAIL_PATTERN: &str = r"^[A-Za-z0-9_]+@[a-z0-9]+(\.[a-z0-9]{2,8}){1,3}$";
const PHONE_PATTERN: &str = r"^\+[0-9]{1,6}\.[0-9]{4,16}$";
const CACHE_OBJECT_ID_PATTERN: &str = r"^[A-Za-z0-9\-._+]{2,40}$";
const GROUP_NAME_PATTERN: &str = r"(?i)^[a-z\-_.]+(\s[a-z\-_.]+)*$";
const LOG_FLAG_PATTERN: &str = r"^[\w.\-]{1,16}(:[0-9]{1,10})?$";
const LOG_FILTER_PATTERN: &str = r#"^\w+[\w\s@\-:=.#",()\[\];]+$"#;
const BAGGAGE_KEY_PATTERN: &str = r"^[\w\-.]+$";

fn is_match(cell: &'static OnceLock<Regex>, pattern: &'static str, input: &str) -> bool {
    cell.get_or_init(|| Regex::new(pattern).expect("validation patterns are valid"))
        .is_match(input)
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidInput(message.into())
}

/// Returns `true` if every character is printable ASCII (`0x20..=0x7E`).
pub fn is_ascii_printable(input: &str) -> bool {
    input.bytes().all(|b| (0x20..=0x7e).contains(&b))
}

/// Validate free-form text input.
///
/// Empty input is accepted when `required` is `false`.
pub fn validate_text(input: &str, required: bool) -> Result<&str> {
    if input.is_empty() {
        return if required {
            Err(invalid("This field is required"))
        } else {
            Ok(input)
        };
    }
    if !is_ascii_printable(input) {
        return Err(invalid("Input contains an illegal character"));
    }
    Ok(input)
}

/// Validate an end-user username: 6-16 letters and digits, with at most one
/// `-` or `_` that is neither first nor last.
///
/// ```
/// use adminpanel_rs::validate::validate_username;
///
/// assert!(validate_username("alice_01").is_ok());
/// assert!(validate_username("_alice").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<&str> {
    if username.is_empty() {
        return Err(invalid("Username is required"));
    }
    if !is_match(&USERNAME, USERNAME_PATTERN, username) {
        return Err(invalid("Username contains an illegal character"));
    }
    match username.len() {
        n if n < 6 => Err(invalid("Username must be 6 characters long")),
        n if n > 16 => Err(invalid("Username cannot exceed 16 characters")),
        _ => Ok(username),
    }
}

/// Validate a password. `label` names the field in messages.
pub fn validate_password<'a>(password: &'a str, label: &str) -> Result<&'a str> {
    if password.is_empty() {
        return Err(invalid(format!("{label} is required")));
    }
    if !is_ascii_printable(password) {
        return Err(invalid(format!("{label} contains illegal character")));
    }
    match password.len() {
        n if n < 8 => Err(invalid(format!("{label} must be at least 8 characters"))),
        n if n > 32 => Err(invalid(format!("{label} cannot exceed 32 characters"))),
        _ => Ok(password),
    }
}

/// Returns `true` if `email` looks like a valid address.
pub fn is_valid_email(email: &str) -> bool {
    is_match(&EMAIL, EMAIL_PATTERN, email)
}

/// Validate an e-mail address of at most `max_len` characters.
pub fn validate_email(email: &str, max_len: usize) -> Result<&str> {
    if email.is_empty() {
        return Err(invalid("E-mail address is required"));
    }
    if !is_valid_email(email) {
        return Err(invalid("Invalid e-mail address"));
    }
    if email.len() > max_len {
        return Err(invalid(format!(
            "E-mail address must not exceed {max_len} characters"
        )));
    }
    Ok(email)
}

/// Returns `true` if `phone` has the `+<country>.<number>` form.
///
/// ```
/// use adminpanel_rs::validate::is_valid_phone;
///
/// assert!(is_valid_phone("+92.3001234567"));
/// assert!(!is_valid_phone("03001234567"));
/// ```
pub fn is_valid_phone(phone: &str) -> bool {
    is_match(&PHONE, PHONE_PATTERN, phone)
}

/// Validate the key of a cached object: 2-40 ASCII letters, digits or `-._+`.
pub fn validate_cache_object_id(id: &str) -> Result<&str> {
    if is_match(&CACHE_OBJECT_ID, CACHE_OBJECT_ID_PATTERN, id) {
        Ok(id)
    } else {
        Err(invalid("Invalid cached object identifier"))
    }
}

/// Validate a user group name: 3-32 characters, words of letters and
/// `-_.` separated by single spaces.
pub fn validate_group_name(name: &str) -> Result<&str> {
    if name.is_empty() {
        return Err(invalid("Group label is required"));
    }
    if !is_match(&GROUP_NAME, GROUP_NAME_PATTERN, name) {
        return Err(invalid("Invalid group name"));
    }
    if name.len() < 3 || name.len() > 32 {
        return Err(invalid("Group name must be 3 to 32 bytes in length"));
    }
    Ok(name)
}

/// Validate an activity log flags search: up to 32 bytes of flags separated
/// by spaces or commas, each `name` or `name:id`.
///
/// ```
/// use adminpanel_rs::validate::validate_log_flags;
///
/// assert!(validate_log_flags("auth, users:42").is_ok());
/// assert!(validate_log_flags("bad*flag").is_err());
/// ```
pub fn validate_log_flags(flags: &str) -> Result<&str> {
    if flags.is_empty() {
        return Ok(flags);
    }
    if flags.len() > 32 {
        return Err(invalid("Flags search field cannot exceed 32 bytes"));
    }
    let parts = flags
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty());
    for (index, flag) in parts.enumerate() {
        if !is_match(&LOG_FLAG, LOG_FLAG_PATTERN, flag) {
            return Err(invalid(format!("Invalid flag value at index {index}")));
        }
    }
    Ok(flags)
}

/// Validate an activity log message filter. Empty means no filter.
pub fn validate_log_filter(filter: &str) -> Result<&str> {
    if filter.is_empty() {
        return Ok(filter);
    }
    validate_text(filter, false)?;
    if !is_match(&LOG_FILTER, LOG_FILTER_PATTERN, filter) {
        return Err(invalid("Invalid log message filter"));
    }
    Ok(filter)
}

/// Validate a baggage item key: up to 32 bytes of word characters, `-` or `.`.
pub fn validate_baggage_key(key: &str) -> Result<&str> {
    validate_text(key, true)?;
    if key.len() > 32 {
        return Err(invalid("Baggage item keys cannot exceed 32 bytes"));
    }
    if !is_match(&BAGGAGE_KEY, BAGGAGE_KEY_PATTERN, key) {
        return Err(invalid("Baggage item key contains an illegal character"));
    }
    Ok(key)
}

/// Validate a baggage item value.
pub fn validate_baggage_value(value: &str) -> Result<&str> {
    validate_text(value, true)?;
    if value.len() > BAGGAGE_VALUE_MAX_LEN {
        return Err(invalid(format!(
            "Baggage item value cannot exceed {BAGGAGE_VALUE_MAX_LEN} bytes"
        )));
    }
    Ok(value)
}

/// Normalize an ISO 3166-1 code of `len` letters to upper case.
///
/// ```
/// use adminpanel_rs::validate::validate_country_code;
///
/// assert_eq!(validate_country_code("pak", 3).unwrap(), "PAK");
/// assert!(validate_country_code("P4K", 3).is_err());
/// ```
pub fn validate_country_code(code: &str, len: usize) -> Result<String> {
    if code.len() != len || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
        let kind = if len == 2 { "Alpha 2" } else { "Alpha 3" };
        return Err(invalid(format!("Invalid ISO 3166-1 {kind} code")));
    }
    Ok(code.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: Error) -> String {
        match err {
            Error::InvalidInput(m) => m,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_patterns_compile() {
        for pattern in [
            USERNAME_PATTERN,
            EMAIL_PATTERN,
            PHONE_PATTERN,
            CACHE_OBJECT_ID_PATTERN,
            GROUP_NAME_PATTERN,
            LOG_FLAG_PATTERN,
            LOG_FILTER_PATTERN,
            BAGGAGE_KEY_PATTERN,
        ] {
            assert!(Regex::new(pattern).is_ok(), "{pattern}");
        }
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("admin1").is_ok());
        assert!(validate_username("first-last").is_ok());
        assert_eq!(
            message(validate_username("").unwrap_err()),
            "Username is required"
        );
        assert_eq!(
            message(validate_username("ab--cd").unwrap_err()),
            "Username contains an illegal character"
        );
        assert_eq!(
            message(validate_username("abc").unwrap_err()),
            "Username must be 6 characters long"
        );
        assert_eq!(
            message(validate_username("abcdefghijklmnopq").unwrap_err()),
            "Username cannot exceed 16 characters"
        );
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("correct horse", "Password").is_ok());
        assert_eq!(
            message(validate_password("", "Temporary password").unwrap_err()),
            "Temporary password is required"
        );
        assert_eq!(
            message(validate_password("short", "Password").unwrap_err()),
            "Password must be at least 8 characters"
        );
        assert_eq!(
            message(validate_password(&"x".repeat(33), "Password").unwrap_err()),
            "Password cannot exceed 32 characters"
        );
        assert_eq!(
            message(validate_password("pässwörd123", "Password").unwrap_err()),
            "Password contains illegal character"
        );
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("ops@example.com", EMAIL_MAX_LEN).is_ok());
        assert!(is_valid_email("a_b@mail.co.uk"));
        assert!(!is_valid_email("a.b@example.com"));
        assert!(!is_valid_email("ops@Example.com"));
        assert_eq!(
            message(validate_email("ops@example.com", 10).unwrap_err()),
            "E-mail address must not exceed 10 characters"
        );
    }

    #[test]
    fn test_text_and_ascii() {
        assert!(is_ascii_printable("Hello, world ~"));
        assert!(!is_ascii_printable("tab\there"));
        assert!(validate_text("", false).is_ok());
        assert!(validate_text("", true).is_err());
        assert!(validate_text("naïve", true).is_err());
    }

    #[test]
    fn test_cache_object_id() {
        assert!(validate_cache_object_id("app.systemConfig").is_ok());
        assert!(validate_cache_object_id("A1").is_ok());
        assert!(validate_cache_object_id("a").is_err());
        assert!(validate_cache_object_id("has space").is_err());
    }

    #[test]
    fn test_log_search_fields() {
        assert_eq!(validate_log_flags("").unwrap(), "");
        assert!(validate_log_flags("users:12 auth").is_ok());
        assert_eq!(
            message(validate_log_flags("ok bad!").unwrap_err()),
            "Invalid flag value at index 1"
        );
        assert!(validate_log_flags(&"a".repeat(33)).is_err());

        assert!(validate_log_filter("signed in from 10.0.0.1").is_ok());
        assert!(validate_log_filter("").is_ok());
        assert_eq!(
            message(validate_log_filter("-leading dash").unwrap_err()),
            "Invalid log message filter"
        );
    }

    #[test]
    fn test_group_name() {
        assert!(validate_group_name("Premium Users").is_ok());
        assert!(validate_group_name("beta-testers").is_ok());
        assert_eq!(message(validate_group_name("").unwrap_err()), "Group label is required");
        assert_eq!(message(validate_group_name("two  spaces").unwrap_err()), "Invalid group name");
        assert!(validate_group_name("ab").is_err());
    }

    #[test]
    fn test_baggage_fields() {
        assert!(validate_baggage_key("pref.theme-v2").is_ok());
        assert_eq!(
            message(validate_baggage_key("bad key").unwrap_err()),
            "Baggage item key contains an illegal character"
        );
        assert!(validate_baggage_key(&"k".repeat(33)).is_err());
        assert!(validate_baggage_key("").is_err());

        assert!(validate_baggage_value("{\"dark\": true}").is_ok());
        assert!(validate_baggage_value(&"v".repeat(1025)).is_err());
    }

    #[test]
    fn test_country_codes() {
        assert_eq!(validate_country_code("pk", 2).unwrap(), "PK");
        assert_eq!(
            message(validate_country_code("PAKI", 3).unwrap_err()),
            "Invalid ISO 3166-1 Alpha 3 code"
        );
        assert_eq!(
            message(validate_country_code("P", 2).unwrap_err()),
            "Invalid ISO 3166-1 Alpha 2 code"
        );
    }
}
