//! Signed call pipeline for the admin panel API.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use secrecy::ExposeSecret;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::api::{
    AppConfigService, BackupsService, CachingService, CountriesService, GroupsService,
    PublicApiService, StaffService, UsersService,
};
use crate::auth::{encode, RequestSigner, Session, SessionMeta};
use crate::events::EventBus;
use crate::models::{HttpMethod, ResponseMeta};
use crate::{Error, Result};

use super::config::{CallOptions, ClientConfig};
use super::response::{classify, failure, ApiOutcome, ApiSuccess, FailureKind, FileDownload};
use super::transport::{HttpRequest, HttpTransport, ReqwestTransport};

/// Client for the admin panel API.
///
/// Every call is stamped with `timeStamp`, signed with the current session's
/// HMAC secret and classified into exactly one [`ApiOutcome`]. Calls are
/// never retried.
///
/// # Example
///
/// ```no_run
/// use adminpanel_rs::{AdminClient, Session};
///
/// # async fn example() -> adminpanel_rs::Result<()> {
/// let session = Session::new();
/// session.sign_in("token-from-sign-in", "hmac-secret-from-sign-in").await;
///
/// let client = AdminClient::new("https://admin.example.com/api", session)?;
/// let status = client.caching().status().await?;
/// println!("cache engine: {status:?}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AdminClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) transport: Arc<dyn HttpTransport>,
    pub(crate) session: Session,
    pub(crate) config: ClientConfig,
    pub(crate) base_url: String,
    pub(crate) events: EventBus,
    next_request_id: AtomicU64,
}

impl AdminClient {
    /// Create a client with the default configuration.
    pub fn new(server: &str, session: Session) -> Result<Self> {
        Self::with_config(server, session, ClientConfig::default())
    }

    /// Create a client with a custom configuration.
    pub fn with_config(server: &str, session: Session, config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Self::with_transport(server, session, config, Arc::new(transport))
    }

    /// Create a client that sends requests through `transport`.
    ///
    /// Warnings and group reloads are published on the session's event bus,
    /// or on a fresh one if the session has none.
    pub fn with_transport(
        server: &str,
        session: Session,
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        let base_url = Url::parse(server)?.as_str().trim_end_matches('/').to_string();
        let events = session.events().cloned().unwrap_or_default();

        Ok(Self {
            inner: Arc::new(ClientInner {
                transport,
                session,
                config,
                base_url,
                events,
                next_request_id: AtomicU64::new(0),
            }),
        })
    }

    /// Issue one signed call and classify the response.
    ///
    /// This never returns `Err`: local failures (bad payload, no session)
    /// come back as [`ApiOutcome::Failure`] without touching the network.
    pub async fn call<P: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        payload: &P,
        options: CallOptions,
    ) -> ApiOutcome {
        self.inner.call(method, endpoint, payload, options).await
    }

    /// Get the session.
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Get the event bus carrying warnings, sign-in changes and group reloads.
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Get the caching engine service.
    pub fn caching(&self) -> CachingService {
        CachingService::new(self.inner.clone())
    }

    /// Get the database backups service.
    pub fn backups(&self) -> BackupsService {
        BackupsService::new(self.inner.clone())
    }

    /// Get the staff administration service.
    pub fn staff(&self) -> StaffService {
        StaffService::new(self.inner.clone())
    }

    /// Get the users service.
    pub fn users(&self) -> UsersService {
        UsersService::new(self.inner.clone())
    }

    /// Get the user groups service.
    pub fn groups(&self) -> GroupsService {
        GroupsService::new(self.inner.clone())
    }

    /// Get the public API service.
    pub fn public_api(&self) -> PublicApiService {
        PublicApiService::new(self.inner.clone())
    }

    /// Get the application configuration service.
    pub fn app_config(&self) -> AppConfigService {
        AppConfigService::new(self.inner.clone())
    }

    /// Get the country list service.
    pub fn countries(&self) -> CountriesService {
        CountriesService::new(self.inner.clone())
    }
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("base_url", &self.inner.base_url)
            .field("config", &self.inner.config)
            .finish()
    }
}

impl ClientInner {
    pub(crate) async fn call<P: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        payload: &P,
        options: CallOptions,
    ) -> ApiOutcome {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed) + 1;
        let meta = ResponseMeta::new(method, endpoint, request_id);

        let request = match self.build_request(method, endpoint, payload, &options).await {
            Ok(request) => request,
            Err(kind) => {
                debug!(request_id, %method, endpoint, "API call not sent: {kind:?}");
                return failure(meta, kind);
            }
        };

        debug!(request_id, %method, endpoint, "dispatching API call");

        let outcome = match self.transport.send(request).await {
            Ok(response) => classify(meta, response, options.allow_file_download),
            Err(e) => {
                let message = format!("API call to {method} {endpoint} failed; {e}");
                failure(
                    meta,
                    FailureKind::Transport {
                        status: None,
                        message,
                    },
                )
            }
        };

        if let ApiOutcome::Failure(failure) = &outcome {
            match &failure.kind {
                FailureKind::Transport { message, .. } | FailureKind::Malformed(message) => {
                    warn!(request_id, "{message}");
                }
                FailureKind::Exception(exception) => {
                    debug!(request_id, param = ?exception.param, "API exception: {}", exception.message);
                }
                _ => {}
            }
        }

        let warnings = outcome.warnings();
        for warning in warnings {
            warn!(
                request_id,
                endpoint,
                file = %warning.file,
                line = warning.line,
                "server warning: {}",
                warning.message
            );
        }
        if options.handle_warnings && self.config.handle_warnings {
            self.events.publish_warnings(warnings.to_vec());
        }

        outcome
    }

    /// Stamp, sign and assemble a request. Errors never reach the network.
    async fn build_request<P: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        payload: &P,
        options: &CallOptions,
    ) -> std::result::Result<HttpRequest, FailureKind> {
        let mut payload: Map<String, Value> = match serde_json::to_value(payload) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(FailureKind::Local(
                    "API call payload must be an object".to_string(),
                ))
            }
            Err(e) => {
                return Err(FailureKind::Local(format!(
                    "Failed to serialize API call payload; {e}"
                )))
            }
        };
        payload.insert(
            "timeStamp".to_string(),
            Value::from(chrono::Utc::now().timestamp()),
        );
        let payload = Value::Object(payload);

        let url = Url::parse(&format!("{}{}", self.base_url, endpoint))
            .map_err(|e| FailureKind::Local(format!("Invalid API endpoint \"{endpoint}\"; {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if options.auth_session {
            let session = match &options.session {
                Some(meta) => meta.clone(),
                None => self
                    .session
                    .current_meta()
                    .await
                    .map_err(|e| FailureKind::Session(local_message(e)))?,
            };
            headers.insert(AUTHORIZATION, self.authorization(&session, &payload, options)?);
        }

        let (query, body) = if method.uses_query_string() {
            (Some(encode(&payload, None, &[])), None)
        } else {
            let body = serde_json::to_vec(&payload)
                .map_err(|e| FailureKind::Local(format!("Failed to encode request body; {e}")))?;
            (None, Some(body))
        };

        Ok(HttpRequest {
            method,
            url,
            headers,
            query,
            body,
            timeout: options.timeout.unwrap_or(self.config.timeout),
        })
    }

    fn authorization(
        &self,
        session: &SessionMeta,
        payload: &Value,
        options: &CallOptions,
    ) -> std::result::Result<HeaderValue, FailureKind> {
        let signature = RequestSigner::new(&options.hmac_exclude)
            .signature(payload, session.hmac_secret().expose_secret())
            .map_err(|e| FailureKind::Local(local_message(e)))?;

        let value = format!(
            "{} {}, {} {}",
            self.config.token_scheme,
            session.token().expose_secret(),
            self.config.signature_scheme,
            signature
        );
        let mut header = HeaderValue::from_str(&value).map_err(|_| {
            FailureKind::Session("Session token is not a valid header value".to_string())
        })?;
        header.set_sensitive(true);
        Ok(header)
    }

    /// Call and require a successful JSON response.
    pub(crate) async fn send<P: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        payload: &P,
        options: CallOptions,
    ) -> Result<ApiSuccess> {
        self.call(method, endpoint, payload, options)
            .await
            .into_success()
    }

    pub(crate) async fn get<P: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        payload: &P,
    ) -> Result<ApiSuccess> {
        self.send(HttpMethod::Get, endpoint, payload, CallOptions::default())
            .await
    }

    /// GET and decode one key of the result.
    pub(crate) async fn get_field<T: DeserializeOwned, P: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        payload: &P,
        key: &str,
    ) -> Result<T> {
        self.get(endpoint, payload).await?.field(key)
    }

    pub(crate) async fn post<P: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        payload: &P,
    ) -> Result<ApiSuccess> {
        self.send(HttpMethod::Post, endpoint, payload, CallOptions::default())
            .await
    }

    pub(crate) async fn put<P: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        payload: &P,
    ) -> Result<ApiSuccess> {
        self.send(HttpMethod::Put, endpoint, payload, CallOptions::default())
            .await
    }

    pub(crate) async fn delete<P: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        payload: &P,
    ) -> Result<ApiSuccess> {
        self.send(HttpMethod::Delete, endpoint, payload, CallOptions::default())
            .await
    }

    /// GET that must answer with a file attachment.
    pub(crate) async fn download<P: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        payload: &P,
    ) -> Result<FileDownload> {
        self.call(
            HttpMethod::Get,
            endpoint,
            payload,
            CallOptions::default().allow_file_download(),
        )
        .await
        .into_download()
    }
}

fn local_message(error: Error) -> String {
    match error {
        Error::SessionRequired(m) | Error::InvalidInput(m) | Error::Config(m) => m,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::HttpResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        requests: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl HttpTransport for Recorder {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
            self.requests.lock().unwrap().push(request);
            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            Ok(HttpResponse {
                status: 200,
                headers,
                body: Some(br#"{"status":true}"#.to_vec()),
            })
        }
    }

    fn client(session: Session) -> (AdminClient, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let client = AdminClient::with_transport(
            "https://admin.example.com/api/",
            session,
            ClientConfig::default(),
            recorder.clone(),
        )
        .unwrap();
        (client, recorder)
    }

    #[tokio::test]
    async fn test_signed_out_call_fails_locally() {
        let (client, recorder) = client(Session::new());
        let outcome = client
            .call(HttpMethod::Get, "/auth/caching", &serde_json::json!({}), CallOptions::new())
            .await;
        match outcome {
            ApiOutcome::Failure(f) => assert!(matches!(f.kind, FailureKind::Session(_))),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(recorder.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_object_payload_fails_locally() {
        let (client, recorder) = client(Session::from_meta(SessionMeta::new("t", "s")));
        let outcome = client
            .call(HttpMethod::Post, "/auth/staff", &[1, 2, 3], CallOptions::new())
            .await;
        match outcome {
            ApiOutcome::Failure(f) => assert!(f.is_local()),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(recorder.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_builds_signed_query() {
        let (client, recorder) = client(Session::from_meta(SessionMeta::new("tok", "secret")));
        let outcome = client
            .call(
                HttpMethod::Get,
                "/auth/caching",
                &serde_json::json!({"action": "status"}),
                CallOptions::new(),
            )
            .await;
        assert!(outcome.is_success());
        assert_eq!(outcome.meta().request_id, 1);

        let requests = recorder.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.url.as_str(), "https://admin.example.com/api/auth/caching");
        assert!(request.body.is_none());
        let query = request.query.as_deref().unwrap();
        assert!(query.starts_with("action=status&timeStamp="));

        let auth = request.headers.get(AUTHORIZATION).unwrap();
        assert!(auth.is_sensitive());
        let auth = auth.to_str().unwrap();
        assert!(auth.starts_with("admin-sess-token tok, admin-signature "));
        let expected = crate::auth::sign(query, "secret").unwrap();
        assert!(auth.ends_with(&expected));
    }

    #[tokio::test]
    async fn test_unauthenticated_call_has_no_signature() {
        let (client, recorder) = client(Session::new());
        let outcome = client
            .call(
                HttpMethod::Post,
                "/auth/sign-in",
                &serde_json::json!({"username": "ops"}),
                CallOptions::new().unauthenticated(),
            )
            .await;
        assert!(outcome.is_success());

        let requests = recorder.requests.lock().unwrap();
        assert!(requests[0].headers.get(AUTHORIZATION).is_none());
        let body: Value = serde_json::from_slice(requests[0].body.as_ref().unwrap()).unwrap();
        assert_eq!(body["username"], "ops");
        assert!(body["timeStamp"].is_i64());
    }

    #[tokio::test]
    async fn test_request_ids_increase() {
        let (client, _) = client(Session::from_meta(SessionMeta::new("t", "s")));
        let empty = serde_json::json!({});
        let first = client.call(HttpMethod::Get, "/a", &empty, CallOptions::new()).await;
        let second = client.call(HttpMethod::Get, "/b", &empty, CallOptions::new()).await;
        assert!(second.meta().request_id > first.meta().request_id);
    }

    #[test]
    fn test_invalid_server_url() {
        let result = AdminClient::new("not a url", Session::new());
        assert!(matches!(result, Err(Error::UrlParse(_))));
    }
}
