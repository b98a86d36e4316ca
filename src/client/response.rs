//! Classification of raw responses into exactly one call outcome.
//!
//! The server's envelope is validated here, once; everything downstream
//! works with typed outcomes and never re-inspects headers or raw JSON.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use super::transport::HttpResponse;
use crate::models::{ApiException, ApiWarning, DownloadType, ResponseMeta};
use crate::{Error, Result};

pub(crate) const DOWNLOADS_DISABLED: &str = "File downloads are disabled for this query";
pub(crate) const MALFORMED_STATUS: &str =
    "Malformed response from server; Expected \"status\" as boolean";

/// Result of one API call.
#[derive(Debug, Clone)]
pub enum ApiOutcome {
    /// `status: true` JSON response
    Success(ApiSuccess),
    /// Any failure, local or remote
    Failure(ApiFailure),
    /// Attachment response accepted for download
    FileDownload(FileDownload),
}

/// A successful JSON response.
#[derive(Debug, Clone)]
pub struct ApiSuccess {
    /// Call metadata
    pub meta: ResponseMeta,
    /// Response body with `warnings` removed
    pub result: Map<String, Value>,
    /// Warnings returned with the response
    pub warnings: Vec<ApiWarning>,
}

/// Why a call failed.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureKind {
    /// Invalid payload; nothing was sent
    Local(String),
    /// No session credentials; nothing was sent
    Session(String),
    /// No response, a non-2xx status or an unreadable body
    Transport {
        /// HTTP status, if a response arrived
        status: Option<u16>,
        /// Description of the failure
        message: String,
    },
    /// Response broke the envelope contract
    Malformed(String),
    /// Server reported an application exception
    Exception(ApiException),
    /// Attachment refused by policy or malformed
    DownloadRejected(String),
}

/// A failed call.
#[derive(Debug, Clone)]
pub struct ApiFailure {
    /// Call metadata
    pub meta: ResponseMeta,
    /// Failure details
    pub kind: FailureKind,
    /// Warnings returned alongside an exception
    pub warnings: Vec<ApiWarning>,
}

/// An accepted file download.
#[derive(Clone)]
pub struct FileDownload {
    /// Call metadata
    pub meta: ResponseMeta,
    /// File name from `Content-Disposition`
    pub filename: String,
    /// Raw `Content-Type` header value
    pub content_type: String,
    /// Matched download type
    pub kind: DownloadType,
    /// File contents
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for FileDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDownload")
            .field("meta", &self.meta)
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("kind", &self.kind)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ApiOutcome {
    /// Metadata of the call this outcome belongs to.
    pub fn meta(&self) -> &ResponseMeta {
        match self {
            ApiOutcome::Success(s) => &s.meta,
            ApiOutcome::Failure(f) => &f.meta,
            ApiOutcome::FileDownload(d) => &d.meta,
        }
    }

    /// Warnings returned by the server, if any.
    pub fn warnings(&self) -> &[ApiWarning] {
        match self {
            ApiOutcome::Success(s) => &s.warnings,
            ApiOutcome::Failure(f) => &f.warnings,
            ApiOutcome::FileDownload(_) => &[],
        }
    }

    /// Returns `true` for [`ApiOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, ApiOutcome::Success(_))
    }

    /// Convert into the success value, turning failures into errors.
    pub fn into_success(self) -> Result<ApiSuccess> {
        match self {
            ApiOutcome::Success(success) => Ok(success),
            ApiOutcome::Failure(failure) => Err(failure.into_error()),
            ApiOutcome::FileDownload(download) => Err(Error::MalformedResponse(format!(
                "Unexpected file download \"{}\" from {}",
                download.filename, download.meta.endpoint
            ))),
        }
    }

    /// Convert into a file download, turning everything else into errors.
    pub fn into_download(self) -> Result<FileDownload> {
        match self {
            ApiOutcome::FileDownload(download) => Ok(download),
            ApiOutcome::Failure(failure) => Err(failure.into_error()),
            ApiOutcome::Success(success) => Err(Error::MalformedResponse(format!(
                "Expected a file download from {}",
                success.meta.endpoint
            ))),
        }
    }
}

impl ApiSuccess {
    /// Decode the whole result object.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.result))?)
    }

    /// Decode one key of the result.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedResponse`] if the key is missing or `null`,
    /// [`Error::Json`] if it does not decode into `T`.
    pub fn field<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        match self.result.get(key) {
            Some(Value::Null) | None => Err(Error::MalformedResponse(format!(
                "Expected \"{key}\" in response from {}",
                self.meta.endpoint
            ))),
            Some(value) => Ok(T::deserialize(value)?),
        }
    }

    /// Decode one key of the result, treating a missing key as `None`.
    pub fn optional_field<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.result.get(key) {
            Some(Value::Null) | None => Ok(None),
            Some(value) => Ok(Some(T::deserialize(value)?)),
        }
    }
}

impl ApiFailure {
    /// Plain message for every failure except a server exception.
    pub fn error(&self) -> Option<&str> {
        match &self.kind {
            FailureKind::Local(m)
            | FailureKind::Session(m)
            | FailureKind::Malformed(m)
            | FailureKind::DownloadRejected(m) => Some(m),
            FailureKind::Transport { message, .. } => Some(message),
            FailureKind::Exception(_) => None,
        }
    }

    /// The server exception, if that is why the call failed.
    pub fn exception(&self) -> Option<&ApiException> {
        match &self.kind {
            FailureKind::Exception(e) => Some(e),
            _ => None,
        }
    }

    /// Returns `true` if the call never reached the network.
    pub fn is_local(&self) -> bool {
        matches!(self.kind, FailureKind::Local(_) | FailureKind::Session(_))
    }

    /// Convert into the crate error type.
    pub fn into_error(self) -> Error {
        match self.kind {
            FailureKind::Local(m) => Error::InvalidInput(m),
            FailureKind::Session(m) => Error::SessionRequired(m),
            FailureKind::Transport { status, message } => Error::Transport { status, message },
            FailureKind::Malformed(m) => Error::MalformedResponse(m),
            FailureKind::Exception(exception) => Error::Api {
                exception,
                warnings: self.warnings,
            },
            FailureKind::DownloadRejected(m) => Error::DownloadRejected(m),
        }
    }
}

pub(crate) fn failure(meta: ResponseMeta, kind: FailureKind) -> ApiOutcome {
    ApiOutcome::Failure(ApiFailure {
        meta,
        kind,
        warnings: Vec::new(),
    })
}

/// Classify a received response.
///
/// A JSON body with `"status": false` and no `exception` object is
/// malformed, never a success.
pub(crate) fn classify(
    mut meta: ResponseMeta,
    response: HttpResponse,
    allow_file_download: bool,
) -> ApiOutcome {
    meta.http_status = Some(response.status);

    let body = match response.body.as_deref() {
        Some(body) if response.is_success() => body,
        _ => {
            let message = format!(
                "API call to {} {} failed with HTTP status code {}",
                meta.method, meta.endpoint, response.status
            );
            return failure(
                meta,
                FailureKind::Transport {
                    status: Some(response.status),
                    message,
                },
            );
        }
    };

    if let Some(disposition) = response.header("content-disposition") {
        if is_attachment(disposition) {
            return classify_download(meta, &response, disposition, body, allow_file_download);
        }
    }

    let content_type = response.header("content-type");
    if !content_type
        .map(|ct| ct.trim().to_ascii_lowercase().starts_with("application/json"))
        .unwrap_or(false)
    {
        let got = content_type.unwrap_or("none");
        return failure(
            meta,
            FailureKind::Malformed(format!(
                "Expected content type header value \"application/json\"; got {got}"
            )),
        );
    }

    let mut result = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return failure(meta, FailureKind::Malformed(MALFORMED_STATUS.to_string())),
        Err(e) => {
            return failure(
                meta,
                FailureKind::Malformed(format!("Failed to decode JSON body; {e}")),
            )
        }
    };

    let status = match result.get("status") {
        Some(Value::Bool(status)) => *status,
        _ => return failure(meta, FailureKind::Malformed(MALFORMED_STATUS.to_string())),
    };

    let warnings = take_warnings(&mut result, &meta);

    if !status {
        let kind = match result.remove("exception") {
            Some(exception @ Value::Object(_)) => match serde_json::from_value(exception) {
                Ok(exception) => FailureKind::Exception(exception),
                Err(e) => FailureKind::Malformed(format!("Malformed exception object; {e}")),
            },
            _ => FailureKind::Malformed(
                "Server returned status false without an exception".to_string(),
            ),
        };
        return ApiOutcome::Failure(ApiFailure {
            meta,
            kind,
            warnings,
        });
    }

    ApiOutcome::Success(ApiSuccess {
        meta,
        result,
        warnings,
    })
}

fn is_attachment(disposition: &str) -> bool {
    disposition
        .trim_start()
        .get(..11)
        .map(|head| head.eq_ignore_ascii_case("attachment;"))
        .unwrap_or(false)
}

fn classify_download(
    meta: ResponseMeta,
    response: &HttpResponse,
    disposition: &str,
    body: &[u8],
    allow_file_download: bool,
) -> ApiOutcome {
    let rejected = |meta, message: &str| failure(meta, FailureKind::DownloadRejected(message.to_string()));

    if !allow_file_download {
        return rejected(meta, DOWNLOADS_DISABLED);
    }
    let Some(filename) = attachment_filename(disposition) else {
        return rejected(
            meta,
            "File name is expected to be specified from the server side",
        );
    };
    let Some(content_type) = response.header("content-type") else {
        return rejected(meta, "Cannot download file; Content-Type not received");
    };
    let Some(kind) = DownloadType::from_content_type(content_type) else {
        return rejected(meta, "Unsupported downloadable content type");
    };

    ApiOutcome::FileDownload(FileDownload {
        meta,
        filename,
        content_type: content_type.to_string(),
        kind,
        bytes: body.to_vec(),
    })
}

/// Extract `filename` from a `Content-Disposition` value, with or without
/// quotes.
pub(crate) fn attachment_filename(disposition: &str) -> Option<String> {
    disposition
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("filename"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

fn take_warnings(result: &mut Map<String, Value>, meta: &ResponseMeta) -> Vec<ApiWarning> {
    let Some(Value::Array(entries)) = result.remove("warnings") else {
        return Vec::new();
    };
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<ApiWarning>(entry) {
            Ok(mut warning) => {
                warning.meta = meta.clone();
                Some(warning)
            }
            Err(e) => {
                warn!(endpoint = %meta.endpoint, error = %e, "undecodable server warning dropped");
                None
            }
        })
        .collect()
}
