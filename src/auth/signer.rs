//! Payload encoding and HMAC request signatures.
//!
//! The server recomputes the signature over the same RFC3986 encoding of
//! the payload, so the encoding here must be byte-for-byte stable: keys are
//! walked in insertion order and every byte outside the unreserved set is
//! percent-escaped with upper-case hex.

use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Number, Value};
use sha2::Sha512;

use crate::{Error, Result};

type HmacSha512 = Hmac<Sha512>;

/// Everything except `A-Z a-z 0-9 - . _ ~` is escaped.
const RFC3986: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a single key or value per RFC3986.
pub fn rfc3986(input: &str) -> String {
    utf8_percent_encode(input, RFC3986).to_string()
}

/// Encode a JSON payload as an RFC3986 query string.
///
/// Objects and arrays are walked recursively: array elements are keyed
/// `prefix[]`, object members `prefix[key]` (or bare `key` at the top).
/// Keys of the top-level object whose lower-cased name appears in
/// `exclude` are left out entirely; nested keys are never excluded.
///
/// # Example
///
/// ```
/// use adminpanel_rs::auth::encode;
/// use serde_json::json;
///
/// let payload = json!({"a": "x y", "tags": ["p", "q"], "totp": "123456"});
/// assert_eq!(
///     encode(&payload, None, &["totp".to_string()]),
///     "a=x%20y&tags%5B%5D=p&tags%5B%5D=q"
/// );
/// ```
pub fn encode(params: &Value, prefix: Option<&str>, exclude: &[String]) -> String {
    let mut pairs = Vec::new();
    match params {
        Value::Object(map) => encode_object(map, prefix, exclude, &mut pairs),
        Value::Array(items) => encode_array(items, prefix.unwrap_or_default(), &mut pairs),
        scalar => {
            if let Some(key) = prefix {
                push_pair(key, scalar, &mut pairs);
            }
        }
    }
    pairs.join("&")
}

fn encode_object(
    map: &Map<String, Value>,
    prefix: Option<&str>,
    exclude: &[String],
    pairs: &mut Vec<String>,
) {
    for (key, value) in map {
        if !exclude.is_empty() && exclude.contains(&key.to_lowercase()) {
            continue;
        }
        let key = match prefix {
            Some(p) => format!("{p}[{key}]"),
            None => key.clone(),
        };
        encode_value(&key, value, pairs);
    }
}

fn encode_array(items: &[Value], prefix: &str, pairs: &mut Vec<String>) {
    let key = format!("{prefix}[]");
    for value in items {
        encode_value(&key, value, pairs);
    }
}

fn encode_value(key: &str, value: &Value, pairs: &mut Vec<String>) {
    match value {
        Value::Object(map) => encode_object(map, Some(key), &[], pairs),
        Value::Array(items) => encode_array(items, key, pairs),
        scalar => push_pair(key, scalar, pairs),
    }
}

fn push_pair(key: &str, value: &Value, pairs: &mut Vec<String>) {
    pairs.push(format!("{}={}", rfc3986(key), rfc3986(&scalar_text(value))));
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => number_text(n),
        Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Integral floats render without a fractional part (`5.0` -> `5`).
fn number_text(n: &Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 {
                return format!("{}", f as i128);
            }
        }
    }
    n.to_string()
}

/// Compute the lower-case hex HMAC-SHA512 of an encoded payload.
///
/// # Errors
///
/// Returns [`Error::Config`] if the MAC cannot be keyed with `secret`.
pub fn sign(encoded: &str, secret: &str) -> Result<String> {
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Config(format!("Invalid HMAC secret: {e}")))?;
    mac.update(encoded.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Signs request payloads with a fixed set of excluded keys.
#[derive(Debug, Clone, Default)]
pub struct RequestSigner {
    exclude: Vec<String>,
}

impl RequestSigner {
    /// Create a signer; exclusions are compared case-insensitively.
    pub fn new<I, S>(exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            exclude: exclude
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Lower-cased keys left out of the signed payload.
    pub fn excluded(&self) -> &[String] {
        &self.exclude
    }

    /// Encoded form of `payload` as it will be signed.
    pub fn canonical(&self, payload: &Value) -> String {
        encode(payload, None, &self.exclude)
    }

    /// Signature of `payload` under `secret`.
    pub fn signature(&self, payload: &Value, secret: &str) -> Result<String> {
        sign(&self.canonical(payload), secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_flat_object() {
        let payload = json!({"action": "status", "timeStamp": 1700000000});
        assert_eq!(
            encode(&payload, None, &[]),
            "action=status&timeStamp=1700000000"
        );
    }

    #[test]
    fn test_encode_nested() {
        let payload = json!({
            "id": 3,
            "permissions": {"viewLogs": true, "editStaff": false},
            "tags": ["a", "b"]
        });
        assert_eq!(
            encode(&payload, None, &[]),
            "id=3&permissions%5BviewLogs%5D=true&permissions%5BeditStaff%5D=false\
             &tags%5B%5D=a&tags%5B%5D=b"
        );
    }

    #[test]
    fn test_encode_strict_reserved_chars() {
        let payload = json!({"q": "it's (a)*b!~"});
        assert_eq!(encode(&payload, None, &[]), "q=it%27s%20%28a%29%2Ab%21~");
    }

    #[test]
    fn test_encode_utf8() {
        let payload = json!({"name": "é"});
        assert_eq!(encode(&payload, None, &[]), "name=%C3%A9");
    }

    #[test]
    fn test_encode_scalars() {
        let payload = json!({"n": null, "f": 2.0, "g": 2.5, "neg": -4, "empty": [], "obj": {}});
        assert_eq!(encode(&payload, None, &[]), "n=&f=2&g=2.5&neg=-4");
    }

    #[test]
    fn test_exclusion_is_shallow() {
        let payload = json!({"totp": "123456", "nested": {"totp": "x"}, "a": 1});
        let encoded = encode(&payload, None, &["totp".to_string()]);
        assert_eq!(encoded, "nested%5Btotp%5D=x&a=1");
    }

    #[test]
    fn test_exclusion_matches_lowercased_key() {
        let payload = json!({"TOTP": "123456", "a": 1});
        assert_eq!(encode(&payload, None, &["totp".to_string()]), "a=1");
    }

    #[test]
    fn test_sign_known_vector() {
        // RFC 4231 test case 2
        let sig = sign("what do ya want for nothing?", "Jefe").unwrap();
        assert_eq!(
            sig,
            "164b7a7bfcf819e2e395fbe73b56e0a387bd64222e831fd610270cd7ea2505549758bf75c05a994a6d034f65f8f0e6fdcaeab1a34d4a6b4b636e070a38bce737"
        );
    }

    #[test]
    fn test_sign_is_deterministic() {
        let a = sign("a=1&b=2", "secret").unwrap();
        let b = sign("a=1&b=2", "secret").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 128);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, sign("a=1&b=3", "secret").unwrap());
        assert_ne!(a, sign("a=1&b=2", "secret2").unwrap());
    }

    #[test]
    fn test_request_signer_lowercases_exclusions() {
        let signer = RequestSigner::new(["TOTP", "Password"]);
        assert_eq!(signer.excluded(), &["totp".to_string(), "password".to_string()]);

        let payload = json!({"password": "hunter22", "email": "a@b.io"});
        assert_eq!(signer.canonical(&payload), "email=a%40b.io");
        assert_eq!(
            signer.signature(&payload, "k").unwrap(),
            sign("email=a%40b.io", "k").unwrap()
        );
    }
}
