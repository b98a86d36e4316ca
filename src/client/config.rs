//! Client configuration and per-call options.

use std::time::Duration;

use crate::auth::SessionMeta;

/// Default `Authorization` scheme carrying the session token.
pub const DEFAULT_TOKEN_SCHEME: &str = "admin-sess-token";
/// Default `Authorization` scheme carrying the request signature.
pub const DEFAULT_SIGNATURE_SCHEME: &str = "admin-signature";

/// Configuration for the admin panel client.
///
/// # Example
///
/// ```
/// use adminpanel_rs::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_timeout(Duration::from_secs(60))
///     .with_user_agent("ops-console/2.1");
/// assert_eq!(config.token_scheme, "admin-sess-token");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Default request timeout
    pub timeout: Duration,
    /// User-Agent header value
    pub user_agent: String,
    /// `Authorization` scheme for the session token
    pub token_scheme: String,
    /// `Authorization` scheme for the payload signature
    pub signature_scheme: String,
    /// Whether server warnings are published on the event bus
    pub handle_warnings: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("adminpanel-rs/{} (Rust)", env!("CARGO_PKG_VERSION")),
            token_scheme: DEFAULT_TOKEN_SCHEME.to_string(),
            signature_scheme: DEFAULT_SIGNATURE_SCHEME.to_string(),
            handle_warnings: true,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set both `Authorization` schemes.
    pub fn with_auth_schemes(
        mut self,
        token_scheme: impl Into<String>,
        signature_scheme: impl Into<String>,
    ) -> Self {
        self.token_scheme = token_scheme.into();
        self.signature_scheme = signature_scheme.into();
        self
    }

    /// Enable or disable publication of server warnings.
    pub fn with_handle_warnings(mut self, enabled: bool) -> Self {
        self.handle_warnings = enabled;
        self
    }
}

/// Options for a single API call.
///
/// Defaults: signed with the current session, config timeout, warnings
/// published, file downloads refused.
///
/// ```
/// use adminpanel_rs::CallOptions;
/// use std::time::Duration;
///
/// let options = CallOptions::new()
///     .with_timeout(Duration::from_secs(5))
///     .exclude_from_signature("attachment")
///     .allow_file_download();
/// assert!(options.auth_session);
/// assert_eq!(options.hmac_exclude, vec!["attachment".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct CallOptions {
    /// Sign the call with session credentials
    pub auth_session: bool,
    /// Credentials to use instead of the current session
    pub session: Option<SessionMeta>,
    /// Timeout overriding the config default
    pub timeout: Option<Duration>,
    /// Top-level payload keys left out of the signature
    pub hmac_exclude: Vec<String>,
    /// Publish server warnings for this call
    pub handle_warnings: bool,
    /// Accept an attachment response
    pub allow_file_download: bool,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            auth_session: true,
            session: None,
            timeout: None,
            hmac_exclude: Vec::new(),
            handle_warnings: true,
            allow_file_download: false,
        }
    }
}

impl CallOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Send the call unsigned (sign-in and other public endpoints).
    pub fn unauthenticated(mut self) -> Self {
        self.auth_session = false;
        self
    }

    /// Sign with `meta` instead of the current session.
    pub fn with_session(mut self, meta: SessionMeta) -> Self {
        self.session = Some(meta);
        self
    }

    /// Override the timeout for this call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Leave a top-level payload key out of the signature.
    pub fn exclude_from_signature(mut self, key: impl Into<String>) -> Self {
        self.hmac_exclude.push(key.into());
        self
    }

    /// Do not publish server warnings for this call.
    pub fn without_warnings(mut self) -> Self {
        self.handle_warnings = false;
        self
    }

    /// Accept a file download response.
    pub fn allow_file_download(mut self) -> Self {
        self.allow_file_download = true;
        self
    }
}
