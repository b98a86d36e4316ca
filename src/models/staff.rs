//! Staff (administrator) models.

use serde::{Deserialize, Serialize};

use super::primitives::AdminId;

/// A staff account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    /// Staff id
    pub id: AdminId,
    /// Whether the account is enabled
    pub status: bool,
    /// Login e-mail address
    pub email: String,
    /// Phone number
    #[serde(default)]
    pub phone: Option<String>,
    /// Whether the row checksum verified
    #[serde(default)]
    pub checksum: bool,
    /// Root accounts cannot have their privileges edited
    #[serde(default)]
    pub is_root: bool,
}

/// One privilege of a staff account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    /// Privilege name
    pub name: String,
    /// Description shown to operators
    #[serde(default)]
    pub desc: Option<String>,
    /// Whether the staff member currently holds it
    #[serde(default)]
    pub current: bool,
    /// Sensitivity level
    #[serde(default, rename = "type")]
    pub kind: i64,
}

/// Entry of the staff activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminActivityLog {
    /// Log id
    pub id: u64,
    /// Staff member who performed the action
    pub admin: AdminId,
    /// Flags attached to the entry
    #[serde(default)]
    pub flags: Option<Vec<String>>,
    /// Controller that wrote the entry
    #[serde(default)]
    pub controller: Option<String>,
    /// Log message
    pub log: String,
    /// Originating IP address
    pub ip_address: String,
    /// Unix time of the entry
    pub time_stamp: i64,
}

/// A staff sign-in session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    /// Session id
    pub id: u64,
    /// Session type
    #[serde(rename = "type")]
    pub kind: String,
    /// Non-zero when archived
    #[serde(default)]
    pub archived: i64,
    /// Staff member owning the session
    pub admin_id: AdminId,
    /// IP address the session was issued to
    pub ip_address: String,
    /// Unix time of the last 2FA confirmation
    #[serde(default, rename = "last2faOn")]
    pub last_2fa_on: Option<i64>,
    /// Unix time the session was issued
    pub issued_on: i64,
    /// Unix time the session was last used
    pub last_used_on: i64,
    /// Whether the row checksum verified
    #[serde(default)]
    pub checksum_health: bool,
    /// Truncated session token
    #[serde(default)]
    pub partial_token: String,
}
