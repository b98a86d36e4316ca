//! Public API session and query models.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::enums::SessionType;
use super::primitives::{PublicSessionId, QueryId, UserId};

/// A session issued by the public API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSession {
    /// Session id
    pub id: PublicSessionId,
    /// Session type
    #[serde(rename = "type")]
    pub kind: SessionType,
    /// Whether the session was archived
    #[serde(default)]
    pub archived: bool,
    /// Whether the row checksum verified
    #[serde(default)]
    pub checksum_verified: bool,
    /// Token fragments
    #[serde(default)]
    pub token: Vec<String>,
    /// IP address the session was issued to
    pub ip_address: String,
    /// Client user agent
    #[serde(default)]
    pub user_agent: String,
    /// Client fingerprint
    #[serde(default)]
    pub fingerprint: String,
    /// Username of the signed-in user
    #[serde(default)]
    pub auth_user_username: Option<String>,
    /// Id of the signed-in user (0 when anonymous)
    #[serde(default)]
    pub auth_user_id: u64,
    /// Whether the session passed a one-time-password check
    #[serde(default)]
    pub auth_session_otp: bool,
    /// Unix time of the last 2FA confirmation
    #[serde(default, rename = "last2faOn")]
    pub last_2fa_on: Option<i64>,
    /// Unix time of the last reCAPTCHA check
    #[serde(default)]
    pub last_recaptcha_on: Option<i64>,
    /// Unix time the session was issued
    pub issued_on: i64,
    /// Unix time the session was last used
    pub last_used_on: i64,
}

impl PublicSession {
    /// Signed-in user, if any.
    pub fn user_id(&self) -> Option<UserId> {
        (self.auth_user_id > 0).then(|| UserId::new(self.auth_user_id))
    }
}

/// A logged public API query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuery {
    /// Query id
    pub id: QueryId,
    /// Client IP address
    pub ip_address: String,
    /// HTTP method
    pub method: String,
    /// Requested endpoint
    pub endpoint: String,
    /// Unix time (fractional) the query started
    pub start_on: f64,
    /// Unix time (fractional) the query finished
    pub end_on: f64,
    /// HTTP response code
    #[serde(default)]
    pub res_code: Option<u16>,
    /// Response length in bytes
    #[serde(default)]
    pub res_len: Option<u64>,
    /// Session the query was made with
    #[serde(default)]
    pub flag_api_sess: Option<PublicSessionId>,
    /// User the query was made by
    #[serde(default)]
    pub flag_user_id: Option<UserId>,
    /// Username the query was made by
    #[serde(default)]
    pub flag_username: Option<String>,
    /// Whether the row checksum verified
    #[serde(default)]
    pub checksum_verified: Option<bool>,
}

impl PublicQuery {
    /// Time spent serving the query, in seconds.
    pub fn duration_secs(&self) -> f64 {
        (self.end_on - self.start_on).max(0.0)
    }
}

/// A logged public API query with its recorded request and response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQueryDetail {
    /// Summary row
    #[serde(flatten)]
    pub query: PublicQuery,
    /// Recorded headers, bodies, errors and database queries
    #[serde(default)]
    pub payload: Option<Value>,
    /// Why the payload could not be loaded
    #[serde(default)]
    pub payload_error: Option<String>,
    /// Server-formatted duration
    #[serde(default)]
    pub timespan: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_detail_flattens_summary() {
        let detail: PublicQueryDetail = serde_json::from_value(serde_json::json!({
            "id": 77,
            "ipAddress": "10.0.0.8",
            "method": "POST",
            "endpoint": "/auth/signin",
            "startOn": 1700000000.25,
            "endOn": 1700000000.75,
            "resCode": 200,
            "payloadError": "Payload archived",
            "timespan": "0.5s"
        }))
        .unwrap();
        assert_eq!(detail.query.id, QueryId::new(77));
        assert_eq!(detail.query.duration_secs(), 0.5);
        assert!(detail.payload.is_none());
        assert_eq!(detail.payload_error.as_deref(), Some("Payload archived"));
    }
}
