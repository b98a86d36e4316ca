//! Public API access, sessions and query log.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::client::paginated::DEFAULT_PAGE_SIZE;
use crate::client::{ClientInner, SearchPage};
use crate::models::{
    ArchivedFilter, PublicQuery, PublicQueryDetail, PublicSession, PublicSessionId, QueryId,
    SortOrder,
};
use crate::totp::TotpCode;
use crate::validate::{validate_text, validate_username};
use crate::{Error, Result};

/// Service for the public (end-user facing) API.
///
/// # Example
///
/// ```no_run
/// use adminpanel_rs::api::PublicSessionQuery;
///
/// # async fn example(client: adminpanel_rs::AdminClient) -> adminpanel_rs::Result<()> {
/// let access = client.public_api().access().await?;
/// println!("signup enabled: {:?}", access.get("signUp"));
///
/// let sessions = client.public_api().sessions(&PublicSessionQuery::default()).await?;
/// println!("{} sessions", sessions.total_rows);
/// # Ok(())
/// # }
/// ```
pub struct PublicApiService {
    inner: Arc<ClientInner>,
}

/// Public session search.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSessionQuery {
    /// Session token (or prefix)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Client IP address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Client fingerprint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// Username signed in on the session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Archived sessions handling
    pub archived: ArchivedFilter,
    /// Sort direction
    pub sort: SortOrder,
    /// Page number, from 1
    pub page: u32,
    /// Rows per page
    pub per_page: u32,
}

impl Default for PublicSessionQuery {
    fn default() -> Self {
        Self {
            token: None,
            ip_address: None,
            fingerprint: None,
            user: None,
            archived: ArchivedFilter::default(),
            sort: SortOrder::default(),
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Public query log search.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQueryLogQuery {
    /// Endpoint path, e.g. `/auth/signin`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// HTTP method, lower-case
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Client IP address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Session id or username the query is flagged with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sess_user_flag: Option<String>,
    /// Sort direction
    pub sort: SortOrder,
    /// Page number, from 1
    pub page: u32,
    /// Rows per page
    pub per_page: u32,
}

impl Default for PublicQueryLogQuery {
    fn default() -> Self {
        Self {
            endpoint: None,
            method: None,
            ip_address: None,
            sess_user_flag: None,
            sort: SortOrder::default(),
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PublicQueryLogQuery {
    fn validate(&self) -> Result<()> {
        if let Some(endpoint) = self.endpoint.as_deref().filter(|e| !e.is_empty()) {
            validate_text(endpoint, false)?;
            let well_formed = endpoint.starts_with('/')
                && endpoint[1..].split('/').all(|segment| {
                    !segment.is_empty()
                        && segment
                            .chars()
                            .all(|c| c.is_ascii_alphanumeric() || "_-.".contains(c))
                });
            if !well_formed {
                return Err(Error::InvalidInput("Invalid endpoint or path".to_string()));
            }
        }
        if let Some(method) = self.method.as_deref().filter(|m| !m.is_empty()) {
            let method = method.to_ascii_lowercase();
            if !["get", "post", "put", "delete"].contains(&method.as_str()) {
                return Err(Error::InvalidInput("Invalid HTTP method".to_string()));
            }
        }
        if let Some(ip) = self.ip_address.as_deref().filter(|ip| !ip.is_empty()) {
            let valid = (2..=45).contains(&ip.len())
                && ip.chars().all(|c| c.is_ascii_hexdigit() || c == '.' || c == ':');
            if !valid {
                return Err(Error::InvalidInput(
                    "IP address contains invalid character".to_string(),
                ));
            }
        }
        if let Some(flag) = self.sess_user_flag.as_deref().filter(|f| !f.is_empty()) {
            let session_id = flag.len() > 1
                && !flag.starts_with('0')
                && flag.bytes().all(|b| b.is_ascii_digit());
            if !session_id && validate_username(flag).is_err() {
                return Err(Error::InvalidInput(
                    "Flag must be either session ID or a username".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl PublicApiService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Get the access triggers (e.g. `signUp`, `signIn`) and their state.
    pub async fn access(&self) -> Result<BTreeMap<String, bool>> {
        let mut triggers: BTreeMap<String, Value> = self
            .inner
            .get_field("/auth/public_api/access", &json!({}), "config")
            .await?;
        triggers.remove("cachedOn");
        Ok(triggers
            .into_iter()
            .filter_map(|(name, value)| value.as_bool().map(|enabled| (name, enabled)))
            .collect())
    }

    /// Save the access triggers.
    pub async fn set_access(
        &self,
        triggers: &BTreeMap<String, bool>,
        totp: &TotpCode,
    ) -> Result<()> {
        let mut payload: Map<String, Value> = triggers
            .iter()
            .map(|(name, enabled)| (name.clone(), Value::from(enabled.to_string())))
            .collect();
        payload.insert("totp".to_string(), json!(totp));

        self.inner
            .post("/auth/public_api/access", &payload)
            .await?;
        info!(triggers = triggers.len(), "public API access updated");
        Ok(())
    }

    /// Search public sessions, one page.
    pub async fn sessions(
        &self,
        query: &PublicSessionQuery,
    ) -> Result<SearchPage<PublicSession>> {
        if let Some(user) = query.user.as_deref().filter(|u| !u.is_empty()) {
            validate_username(user)?;
        }
        self.inner
            .get_field("/auth/public_api/sessions", query, "sessions")
            .await
    }

    /// Get one public session.
    pub async fn session(&self, id: PublicSessionId) -> Result<PublicSession> {
        self.inner
            .get_field("/auth/public_api/sessions", &json!({"sessionId": id}), "session")
            .await
    }

    /// Archive a public session, signing its user out.
    pub async fn archive_session(&self, id: PublicSessionId, totp: &TotpCode) -> Result<()> {
        self.inner
            .delete(
                "/auth/public_api/sessions",
                &json!({"sessionId": id, "totp": totp}),
            )
            .await?;
        info!(session = %id, "public session archived");
        Ok(())
    }

    /// Search the public query log, one page.
    pub async fn queries(
        &self,
        query: &PublicQueryLogQuery,
    ) -> Result<SearchPage<PublicQuery>> {
        query.validate()?;
        let mut payload = json!({"action": "search"});
        if let (Value::Object(map), Value::Object(fields)) =
            (&mut payload, serde_json::to_value(query)?)
        {
            map.extend(fields);
        }
        self.inner
            .get_field("/auth/public_api/queries", &payload, "queries")
            .await
    }

    /// Get one logged query with its recorded payload.
    pub async fn query(&self, id: QueryId) -> Result<PublicQueryDetail> {
        self.inner
            .get_field(
                "/auth/public_api/queries",
                &json!({"action": "query", "query": id}),
                "query",
            )
            .await
    }
}
