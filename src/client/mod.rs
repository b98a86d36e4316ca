//! HTTP client and call pipeline for the admin panel API.
//!
//! [`AdminClient`] is the entry point. Each call goes through the same
//! pipeline: stamp the payload, sign it, send it through an
//! [`HttpTransport`] and classify the response into one [`ApiOutcome`].
//!
//! # Example
//!
//! ```no_run
//! use adminpanel_rs::{AdminClient, CallOptions, Session};
//! use adminpanel_rs::models::HttpMethod;
//! use serde_json::json;
//!
//! # async fn example(session: Session) -> adminpanel_rs::Result<()> {
//! let client = AdminClient::new("https://admin.example.com/api", session)?;
//!
//! let outcome = client
//!     .call(HttpMethod::Get, "/auth/staff", &json!({}), CallOptions::new())
//!     .await;
//! let staff: serde_json::Value = outcome.into_success()?.field("staff")?;
//! # Ok(())
//! # }
//! ```

mod config;
mod fence;
mod http;
pub mod paginated;
mod response;
mod transport;

pub use config::{CallOptions, ClientConfig, DEFAULT_SIGNATURE_SCHEME, DEFAULT_TOKEN_SCHEME};
pub use fence::RequestFence;
pub use http::AdminClient;
pub use paginated::{PaginatedStream, SearchPage, DEFAULT_PAGE_SIZE};
pub use response::{ApiFailure, ApiOutcome, ApiSuccess, FailureKind, FileDownload};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub(crate) use http::ClientInner;
