//! Staff session state used to sign API calls.

use secrecy::SecretString;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::events::EventBus;
use crate::{Error, Result};

/// Credentials of an authenticated staff session.
///
/// The token identifies the session to the server; the HMAC secret keys
/// the per-request signature and never leaves the client.
#[derive(Clone)]
pub struct SessionMeta {
    token: SecretString,
    hmac_secret: SecretString,
}

impl SessionMeta {
    /// Create session credentials.
    pub fn new(token: impl Into<String>, hmac_secret: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            hmac_secret: SecretString::from(hmac_secret.into()),
        }
    }

    /// Session token sent in the `Authorization` header.
    pub fn token(&self) -> &SecretString {
        &self.token
    }

    /// Secret used to key request signatures.
    pub fn hmac_secret(&self) -> &SecretString {
        &self.hmac_secret
    }
}

impl std::fmt::Debug for SessionMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionMeta")
            .field("token", &"[REDACTED]")
            .field("hmac_secret", &"[REDACTED]")
            .finish()
    }
}

/// Authentication context shared by the client and the application.
///
/// Each API call reads one snapshot of the credentials; sign-in, refresh
/// and sign-out replace the whole snapshot atomically, so a call in flight
/// is never signed with a half-updated pair.
///
/// # Example
///
/// ```
/// use adminpanel_rs::Session;
///
/// # async fn example() -> adminpanel_rs::Result<()> {
/// let session = Session::new();
/// assert!(session.current_meta().await.is_err());
///
/// session.sign_in("token", "hmac-secret").await;
/// let meta = session.current_meta().await?;
/// # let _ = meta;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<Option<SessionMeta>>>,
    events: Option<EventBus>,
}

impl Session {
    /// Create a signed-out session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a signed-out session that reports sign-in changes on `events`.
    pub fn with_events(events: EventBus) -> Self {
        Self {
            inner: Arc::default(),
            events: Some(events),
        }
    }

    /// Create a session that is already signed in.
    pub fn from_meta(meta: SessionMeta) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(meta))),
            events: None,
        }
    }

    /// Store fresh credentials after a successful sign-in.
    pub async fn sign_in(&self, token: impl Into<String>, hmac_secret: impl Into<String>) {
        self.replace(SessionMeta::new(token, hmac_secret)).await;
    }

    /// Replace the current credentials.
    pub async fn replace(&self, meta: SessionMeta) {
        *self.inner.write().await = Some(meta);
        debug!("admin session credentials stored");
        self.notify(true);
    }

    /// Drop the credentials. Subsequent signed calls fail locally.
    pub async fn sign_out(&self) {
        let was_signed_in = self.inner.write().await.take().is_some();
        if was_signed_in {
            debug!("admin session cleared");
        }
        self.notify(false);
    }

    /// Returns `true` if credentials are present.
    pub async fn is_signed_in(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// Snapshot of the current credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionRequired`] when signed out.
    pub async fn current_meta(&self) -> Result<SessionMeta> {
        self.inner
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::SessionRequired("No authenticated session".to_string()))
    }

    /// Event bus this session reports to, if any.
    pub fn events(&self) -> Option<&EventBus> {
        self.events.as_ref()
    }

    fn notify(&self, signed_in: bool) {
        if let Some(events) = &self.events {
            events.set_signed_in(signed_in);
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("meta", &"[REDACTED]")
            .finish()
    }
}

const SESSION_ERRORS: &[(&str, &str)] = &[
    (
        "session_token_req",
        "A valid session token is required for this endpoint",
    ),
    ("session_redundant", "This session is no longer valid"),
    (
        "session_retrieve_error",
        "Authenticated session could not be retrieved",
    ),
    (
        "session_not_found",
        "Authenticated session could not be retrieved",
    ),
    ("session_archived", "Authenticated session was archived"),
    ("session_ip_error", "Your IP address has changed"),
    ("session_timed_out", "Authenticated session timed out"),
];

fn lookup_session_error(code: &str) -> Option<&'static str> {
    let code = code.to_ascii_lowercase();
    SESSION_ERRORS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, message)| *message)
}

/// Returns `true` if `code` is one of the server's session error codes.
pub fn is_session_error_code(code: &str) -> bool {
    lookup_session_error(code).is_some()
}

/// Translate a server session error code into a readable message.
///
/// Unknown codes are returned unchanged.
///
/// ```
/// use adminpanel_rs::auth::translate_session_error;
///
/// assert_eq!(
///     translate_session_error("session_ip_error"),
///     "Your IP address has changed"
/// );
/// assert_eq!(translate_session_error("Invalid e-mail"), "Invalid e-mail");
/// ```
pub fn translate_session_error(code: &str) -> String {
    lookup_session_error(code)
        .map(str::to_string)
        .unwrap_or_else(|| code.to_string())
}
