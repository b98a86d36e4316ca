//! End-user account models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::UserStatus;
use super::primitives::{GroupId, PublicSessionId, UserId};

/// An end-user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    /// User id
    pub id: UserId,
    /// Referring user
    #[serde(default)]
    pub referrer_id: Option<UserId>,
    /// Group membership
    pub group_id: GroupId,
    /// Non-zero when archived
    #[serde(default)]
    pub archived: i64,
    /// Account status
    pub status: UserStatus,
    /// Username
    pub username: String,
    /// E-mail address
    #[serde(default)]
    pub email: Option<String>,
    /// Non-zero when the e-mail address is verified
    #[serde(default)]
    pub email_verified: i64,
    /// Phone number
    #[serde(default)]
    pub phone: Option<String>,
    /// Non-zero when the phone number is verified
    #[serde(default)]
    pub phone_verified: i64,
    /// Country code
    #[serde(default)]
    pub country: Option<String>,
    /// Unix time of creation
    pub created_on: i64,
    /// Unix time of last update
    pub updated_on: i64,
    /// Username of the referrer
    #[serde(default)]
    pub referrer_username: Option<String>,
    /// Number of referred users
    #[serde(default)]
    pub referrals_count: Option<u64>,
    /// Whether the row checksum verified
    #[serde(default)]
    pub checksum_verified: Option<bool>,
}

/// A user group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGroup {
    /// Group id
    pub id: GroupId,
    /// Group name
    pub name: String,
    /// Number of members
    #[serde(default)]
    pub user_count: u64,
    /// Unix time of last update
    #[serde(default)]
    pub updated_on: i64,
}

/// Entry of the user activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivityLog {
    /// Log id
    pub id: u64,
    /// User who performed the action
    pub user: UserId,
    /// Public API session the action came from
    pub session: PublicSessionId,
    /// Flags attached to the entry
    #[serde(default)]
    pub flags: Option<Vec<String>>,
    /// Controller that wrote the entry
    #[serde(default)]
    pub controller: Option<String>,
    /// Extra data recorded with the entry
    #[serde(default)]
    pub data: Option<String>,
    /// Log message
    pub log: String,
    /// Originating IP address
    pub ip_address: String,
    /// Unix time of the entry
    pub time_stamp: i64,
}

/// Date of birth as split by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDob {
    /// Day of month
    pub d: u32,
    /// Month, from 1
    pub m: u32,
    /// Year
    #[serde(rename = "Y")]
    pub y: i32,
}

/// Personal details attached to a user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Owner of the profile
    pub user_id: UserId,
    /// Non-zero when identity is verified
    #[serde(default)]
    pub id_verified: i64,
    /// Non-zero when the address is verified
    #[serde(default)]
    pub address_verified: i64,
    /// Given name
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name
    #[serde(default)]
    pub last_name: Option<String>,
    /// `o`, `m` or `f`
    #[serde(default)]
    pub gender: Option<String>,
    /// Address line 1
    #[serde(default)]
    pub address1: Option<String>,
    /// Address line 2
    #[serde(default)]
    pub address2: Option<String>,
    /// Postal code
    #[serde(default)]
    pub postal_code: Option<String>,
    /// City
    #[serde(default)]
    pub city: Option<String>,
    /// State or province
    #[serde(default)]
    pub state: Option<String>,
    /// Whether a profile row exists
    #[serde(default)]
    pub is_registered: Option<bool>,
    /// Whether the row checksum verified
    #[serde(default)]
    pub checksum_validated: Option<bool>,
    /// Date of birth as Unix time
    #[serde(default)]
    pub dob_ts: Option<i64>,
    /// Date of birth split into parts
    #[serde(default)]
    pub dob_date: Option<ProfileDob>,
}

impl UserProfile {
    /// Date of birth, if set and a real calendar date.
    pub fn dob(&self) -> Option<NaiveDate> {
        let dob = self.dob_date?;
        NaiveDate::from_ymd_opt(dob.y, dob.m, dob.d)
    }
}

/// A key/value item stored against a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaggageItem {
    /// Owner of the item
    pub user: UserId,
    /// Item key
    pub key: String,
    /// Stored value
    pub data: String,
    /// Stored length in bytes
    #[serde(default)]
    pub length: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_deserialize() {
        let profile: UserProfile = serde_json::from_value(json!({
            "userId": 12,
            "idVerified": 1,
            "addressVerified": 0,
            "firstName": "Ada",
            "gender": "f",
            "dobTs": 631152000,
            "dobDate": {"d": 1, "m": 1, "Y": 1990}
        }))
        .unwrap();
        assert_eq!(profile.user_id, UserId::new(12));
        assert_eq!(profile.first_name.as_deref(), Some("Ada"));
        assert_eq!(profile.last_name, None);
        assert_eq!(profile.dob(), NaiveDate::from_ymd_opt(1990, 1, 1));
    }

    #[test]
    fn test_profile_bad_dob() {
        let profile: UserProfile = serde_json::from_value(json!({
            "userId": 3,
            "dobDate": {"d": 31, "m": 2, "Y": 2001}
        }))
        .unwrap();
        assert_eq!(profile.dob(), None);
    }
}
