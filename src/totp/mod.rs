//! TOTP step-up confirmation.
//!
//! Sensitive mutations (flushing the cache, deleting backups, editing
//! staff) require a fresh six-digit code from the operator's authenticator.
//! [`TotpCode`] validates the code locally; [`TotpGate`] holds the command
//! while the operator types it and re-runs it on server rejection.

mod code;
mod gate;

pub use code::{TotpCode, TOTP_INVALID, TOTP_REQUIRED};
pub use gate::{ModalState, TotpGate, TotpPhase, TotpResolution};
