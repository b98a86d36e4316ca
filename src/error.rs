//! Error types for the admin panel API client.
//!
//! Errors fall into four families: local preconditions that never reach the
//! network, transport/protocol failures, application exceptions reported by
//! the server, and rejected file downloads.

use thiserror::Error;

use crate::auth::translate_session_error;
use crate::models::{ApiException, ApiWarning};

/// A specialized `Result` type for admin panel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for all admin panel API operations.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP client failed before a response was received
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered with `status: false` and an exception object
    #[error("API exception: {}", exception.message)]
    Api {
        /// Exception reported by the server
        exception: ApiException,
        /// Warnings returned alongside the exception
        warnings: Vec<ApiWarning>,
    },

    /// Non-2xx response, unreachable server or unreadable body
    #[error("{message}")]
    Transport {
        /// HTTP status code, if a response was received
        status: Option<u16>,
        /// Human-readable description
        message: String,
    },

    /// Response did not follow the JSON envelope contract
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// No authenticated session was available for a signed call
    #[error("Session required: {0}")]
    SessionRequired(String),

    /// Invalid input provided to a function
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File download refused by policy
    #[error("File download rejected: {0}")]
    DownloadRejected(String),

    /// A TOTP confirmation is already pending on this gate
    #[error("Another action is already awaiting TOTP confirmation")]
    TotpPending,

    /// The TOTP gate is not in a state that accepts this operation
    #[error("TOTP gate: {0}")]
    TotpState(String),

    /// Request timed out
    #[error("Request timeout")]
    Timeout,

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns `true` if the error was raised locally, before any request
    /// was sent.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Error::SessionRequired(_)
                | Error::InvalidInput(_)
                | Error::TotpPending
                | Error::TotpState(_)
                | Error::Config(_)
        )
    }

    /// Returns `true` if this is an authentication-related error.
    ///
    /// Server exceptions carrying one of the `session_*` codes count as
    /// authentication errors too.
    pub fn is_auth_error(&self) -> bool {
        match self {
            Error::SessionRequired(_) => true,
            Error::Transport {
                status: Some(401), ..
            } => true,
            Error::Api { exception, .. } => exception.is_session_error(),
            _ => false,
        }
    }

    /// Name of the input field the server blamed, if any.
    ///
    /// # Example
    ///
    /// ```
    /// use adminpanel_rs::Error;
    /// use adminpanel_rs::models::ApiException;
    ///
    /// let err = Error::Api {
    ///     exception: ApiException::new("Invalid code").with_param("totp"),
    ///     warnings: Vec::new(),
    /// };
    /// assert_eq!(err.param(), Some("totp"));
    /// ```
    pub fn param(&self) -> Option<&str> {
        match self {
            Error::Api { exception, .. } => exception.param.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` if the server rejected the submitted TOTP code.
    pub fn is_totp_rejection(&self) -> bool {
        self.param()
            .map(|p| p.eq_ignore_ascii_case("totp"))
            .unwrap_or(false)
    }

    /// Message suitable for showing to an operator.
    ///
    /// Session error codes are translated; everything else uses the
    /// `Display` form.
    pub fn user_message(&self) -> String {
        match self {
            Error::Api { exception, .. } => translate_session_error(&exception.message),
            other => other.to_string(),
        }
    }
}
