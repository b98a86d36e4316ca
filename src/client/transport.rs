//! Network I/O behind a trait so the call pipeline can be driven by any
//! HTTP stack (or a fake one in tests).

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::time::Duration;
use url::Url;

use super::config::ClientConfig;
use crate::models::HttpMethod;
use crate::{Error, Result};

/// A fully built request, ready for the wire.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Absolute URL, without query string
    pub url: Url,
    /// Request headers, including `Authorization` for signed calls
    pub headers: HeaderMap,
    /// Encoded query string for `GET` calls
    pub query: Option<String>,
    /// JSON body for all other methods
    pub body: Option<Vec<u8>>,
    /// Time allowed for the whole exchange
    pub timeout: Duration,
}

/// A raw response. The body is `None` when it could not be read.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Option<Vec<u8>>,
}

impl HttpResponse {
    /// Returns `true` for 2xx status codes.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Sends one request and returns whatever the server answered.
///
/// Implementations must not retry and must not interpret status codes:
/// non-2xx responses are returned as `Ok` so the caller can classify them.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send `request`.
    ///
    /// # Errors
    ///
    /// Only when no response was received (DNS, TLS, timeout, reset).
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// [`HttpTransport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport using the timeout and user agent from `config`.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { http })
    }

    /// Wrap an existing `reqwest` client.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut url = request.url;
        if let Some(query) = request.query.as_deref().filter(|q| !q.is_empty()) {
            url.set_query(Some(query));
        }

        let mut builder = self
            .http
            .request(request.method.into(), url)
            .headers(request.headers)
            .timeout(request.timeout);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout
            } else {
                Error::Http(e)
            }
        })?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.ok().map(|b| b.to_vec());

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, CONTENT_TYPE};

    #[test]
    fn test_response_helpers() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let response = HttpResponse {
            status: 204,
            headers,
            body: None,
        };
        assert!(response.is_success());
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("content-disposition"), None);

        let failed = HttpResponse {
            status: 503,
            ..Default::default()
        };
        assert!(!failed.is_success());
    }
}
