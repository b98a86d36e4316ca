//! Pieces of the JSON response envelope shared by every endpoint.
//!
//! Every response body is an object with a boolean `status`, optional
//! `warnings` and, on failure, an `exception` object.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::enums::HttpMethod;
use crate::auth::is_session_error_code;

/// Identifies the call a response, warning or failure belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMeta {
    /// HTTP method of the call
    pub method: HttpMethod,
    /// Endpoint path, relative to the server base URL
    pub endpoint: String,
    /// Monotonic id assigned by the client to this call
    pub request_id: u64,
    /// HTTP status code, when a response was received
    pub http_status: Option<u16>,
}

impl ResponseMeta {
    pub(crate) fn new(method: HttpMethod, endpoint: impl Into<String>, request_id: u64) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            request_id,
            http_status: None,
        }
    }
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self::new(HttpMethod::Get, "", 0)
    }
}

/// Application-level exception reported with `status: false`.
///
/// `param`, when present, names the input field the server rejected and is
/// used to attach the message to that field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiException {
    /// Human-readable message
    #[serde(default)]
    pub message: String,
    /// Offending input field
    #[serde(default)]
    pub param: Option<String>,
    /// Class name of the caught exception (debug builds of the server)
    #[serde(default)]
    pub caught: Option<String>,
    /// Source file (debug builds of the server)
    #[serde(default)]
    pub file: Option<String>,
    /// Source line (debug builds of the server)
    #[serde(default)]
    pub line: Option<i64>,
    /// Stack trace (debug builds of the server)
    #[serde(default)]
    pub trace: Vec<Value>,
}

impl ApiException {
    /// Create an exception with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Attach the offending parameter name.
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }

    /// Returns `true` if the message is one of the server's session codes.
    pub fn is_session_error(&self) -> bool {
        is_session_error_code(&self.message)
    }
}

/// Timestamp of a server warning; the server sends either epoch seconds or
/// a formatted string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WarningTime {
    /// Unix epoch seconds (possibly fractional)
    Epoch(f64),
    /// Server-formatted date string
    Text(String),
}

/// A non-fatal diagnostic returned alongside a normal response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiWarning {
    /// Call this warning was returned by
    #[serde(skip)]
    pub meta: ResponseMeta,
    /// Numeric error level (PHP `E_*` style)
    #[serde(default, rename = "type")]
    pub kind: i64,
    /// Textual error level
    #[serde(default)]
    pub type_str: Option<String>,
    /// Warning message
    #[serde(default)]
    pub message: String,
    /// Source file
    #[serde(default)]
    pub file: String,
    /// Source line
    #[serde(default)]
    pub line: i64,
    /// Whether the warning was raised explicitly by application code
    #[serde(default)]
    pub triggered: bool,
    /// When the warning was raised
    #[serde(default)]
    pub time_stamp: Option<WarningTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_deserialize() {
        let exc: ApiException = serde_json::from_value(serde_json::json!({
            "message": "Invalid code",
            "param": "totp",
            "line": 42
        }))
        .unwrap();
        assert_eq!(exc.message, "Invalid code");
        assert_eq!(exc.param.as_deref(), Some("totp"));
        assert_eq!(exc.line, Some(42));
        assert!(exc.trace.is_empty());
    }

    #[test]
    fn test_warning_deserialize() {
        let warning: ApiWarning = serde_json::from_value(serde_json::json!({
            "type": 512,
            "typeStr": "E_USER_WARNING",
            "message": "Deprecated config key",
            "file": "Config.php",
            "line": 17,
            "triggered": true,
            "timeStamp": 1700000000
        }))
        .unwrap();
        assert_eq!(warning.kind, 512);
        assert_eq!(warning.type_str.as_deref(), Some("E_USER_WARNING"));
        assert!(warning.triggered);
        assert_eq!(warning.time_stamp, Some(WarningTime::Epoch(1700000000.0)));
    }

    #[test]
    fn test_warning_text_timestamp() {
        let warning: ApiWarning = serde_json::from_value(serde_json::json!({
            "message": "x",
            "timeStamp": "2024-01-01 10:00:00"
        }))
        .unwrap();
        assert_eq!(
            warning.time_stamp,
            Some(WarningTime::Text("2024-01-01 10:00:00".into()))
        );
    }
}
