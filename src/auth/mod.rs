//! Authentication for the admin panel API.
//!
//! Every signed call carries two credentials in its `Authorization`
//! header: the staff session token and an HMAC-SHA512 signature of the
//! request payload, keyed with the session's HMAC secret.
//!
//! ```text
//! Authorization: admin-sess-token <token>, admin-signature <hex>
//! ```
//!
//! The signature covers the RFC3986 encoding produced by [`encode`], so the
//! server can recompute it from the decoded request.
//!
//! # Example
//!
//! ```
//! use adminpanel_rs::auth::RequestSigner;
//! use serde_json::json;
//!
//! # fn example() -> adminpanel_rs::Result<()> {
//! let signer = RequestSigner::new(["totp"]);
//! let signature = signer.signature(&json!({"action": "flush"}), "hmac-secret")?;
//! assert_eq!(signature.len(), 128);
//! # Ok(())
//! # }
//! ```

mod session;
mod signer;

pub use session::{is_session_error_code, translate_session_error, Session, SessionMeta};
pub use signer::{encode, rfc3986, sign, RequestSigner};
