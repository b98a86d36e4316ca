//! # adminpanel-rs
//!
//! A signed REST client for the admin panel API.
//!
//! Every call is stamped, signed with HMAC-SHA512 using the staff session's
//! secret and classified into a single [`ApiOutcome`]. Sensitive mutations
//! are confirmed with a six-digit TOTP code, collected through a
//! [`TotpGate`].
//!
//! ## Features
//!
//! - **Request signing**: RFC3986 payload canonicalization and HMAC-SHA512
//! - **Sessions**: token and secret held as secrets, swapped atomically
//! - **Outcome classification**: success, API exception, transport failure,
//!   malformed response or file download, with server warnings attached
//! - **TOTP confirmation**: park a command, collect a code, retry on rejection
//! - **Endpoint services**: caching, backups, staff, users, groups,
//!   countries, public API and configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use adminpanel_rs::{AdminClient, CacheCommand, Session, TotpGate, TotpResolution};
//!
//! #[tokio::main]
//! async fn main() -> adminpanel_rs::Result<()> {
//!     let session = Session::new();
//!     session.sign_in("session-token", "hmac-secret").await;
//!     let client = AdminClient::new("https://admin.example.com/api", session)?;
//!
//!     let status = client.caching().status().await?;
//!     println!("cache engine: {status:?}");
//!
//!     // Confirm a cache flush with the operator's code
//!     let gate = TotpGate::new();
//!     gate.request(CacheCommand::Flush).await?;
//!     let caching = client.caching();
//!     let resolution = gate
//!         .submit("123456", |cmd, code| async move { caching.execute(cmd, &code).await })
//!         .await?;
//!     if let TotpResolution::Rejected(message) = resolution {
//!         println!("code rejected: {message}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Raw Calls
//!
//! ```rust,no_run
//! use adminpanel_rs::{AdminClient, ApiOutcome, CallOptions, Session};
//! use adminpanel_rs::models::HttpMethod;
//! use serde_json::json;
//!
//! # async fn example(client: AdminClient) {
//! let outcome = client
//!     .call(HttpMethod::Get, "/auth/staff", &json!({}), CallOptions::new())
//!     .await;
//! match outcome {
//!     ApiOutcome::Success(success) => println!("{:?}", success.result.keys()),
//!     ApiOutcome::Failure(failure) => println!("failed: {:?}", failure.error()),
//!     ApiOutcome::FileDownload(_) => unreachable!("downloads are opt-in"),
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod events;
pub mod models;
pub mod totp;
pub mod validate;

// Re-export primary types at crate root for convenience
pub use error::{Error, Result};
pub use models::{
    AdminId, BackupId, CacheObjectId, CacheStatus, GroupId, PublicSessionId, QueryId, UserId,
};
pub use client::{
    AdminClient, ApiFailure, ApiOutcome, ApiSuccess, CallOptions, ClientConfig, FailureKind,
    FileDownload, HttpTransport, PaginatedStream, RequestFence, SearchPage,
};
pub use auth::{RequestSigner, Session, SessionMeta};
pub use events::EventBus;
pub use totp::{ModalState, TotpCode, TotpGate, TotpPhase, TotpResolution};
pub use api::{BackupCommand, CacheCommand, CountryCommand, UserCommand};

/// Prelude module for convenient imports.
///
/// ```rust
/// use adminpanel_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::models::{
        // Ids
        AdminId, UserId, GroupId, BackupId, PublicSessionId, QueryId, CacheObjectId,
        // Enums
        HttpMethod, SortOrder, ArchivedFilter, UserStatusFilter, ConfigSection, CacheStatus,
        // Envelope
        ApiException, ApiWarning, ResponseMeta,
    };
    pub use crate::client::{
        AdminClient, ApiOutcome, ApiSuccess, ApiFailure, CallOptions, ClientConfig, SearchPage,
    };
    pub use crate::api::{BackupCommand, CacheCommand, CountryCommand, UserCommand};
    pub use crate::auth::{Session, SessionMeta};
    pub use crate::events::EventBus;
    pub use crate::totp::{TotpCode, TotpGate, TotpResolution};
}
