//! Enumeration types for the admin panel API.

use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP method of an API call.
///
/// `Get` sends the payload as a query string; every other method sends it
/// as a JSON body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    /// Read-only query
    #[default]
    Get,
    /// Update or command
    Post,
    /// Create
    Put,
    /// Delete or archive
    Delete,
}

impl HttpMethod {
    /// Upper-case method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Returns `true` if the payload travels in the query string.
    pub fn uses_query_string(&self) -> bool {
        matches!(self, HttpMethod::Get)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Sort direction for search endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Newest first
    #[default]
    Desc,
    /// Oldest first
    Asc,
}

/// How archived rows are treated by a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArchivedFilter {
    /// Leave archived rows out
    #[default]
    Exclude,
    /// Only archived rows
    Just,
    /// Archived and live rows
    Include,
}

/// Account status filter for user searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatusFilter {
    /// Active accounts only
    Active,
    /// Disabled accounts only
    Disabled,
    /// Any status
    #[default]
    Any,
}

/// Status of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Account may sign in
    Active,
    /// Account is disabled
    Disabled,
    /// Unknown status value
    #[serde(other)]
    Unknown,
}

/// Kind of public API session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    /// Browser session
    Web,
    /// Mobile/desktop application session
    App,
    /// Unknown session type
    #[serde(other)]
    Unknown,
}

/// Content types accepted for file downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadType {
    /// `application/json`
    Json,
    /// `application/zip`
    Zip,
    /// `application/octet-stream`
    Octet,
}

impl DownloadType {
    /// Every accepted download type.
    pub const ALL: [DownloadType; 3] = [DownloadType::Json, DownloadType::Zip, DownloadType::Octet];

    /// Media type prefix this variant matches.
    pub fn media_prefix(&self) -> &'static str {
        match self {
            DownloadType::Json => "application/json",
            DownloadType::Zip => "application/zip",
            DownloadType::Octet => "application/octet",
        }
    }

    /// Match a `Content-Type` header value against the allow-list.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let value = content_type.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| value.starts_with(t.media_prefix()))
    }
}

/// Configuration sections managed through `/auth/config/*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    /// Outgoing mail settings
    Mails,
    /// Program (business) settings
    Program,
    /// System settings
    System,
}

impl ConfigSection {
    /// Endpoint path for this section.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ConfigSection::Mails => "/auth/config/mails",
            ConfigSection::Program => "/auth/config/program",
            ConfigSection::System => "/auth/config/system",
        }
    }
}
