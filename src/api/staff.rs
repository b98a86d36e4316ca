//! Staff administration service.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::json;
use tracing::info;

use crate::client::paginated::{PaginatedStream, PaginatedStreamBuilder, DEFAULT_PAGE_SIZE};
use crate::client::{ClientInner, SearchPage};
use crate::models::{AdminActivityLog, AdminId, AdminSession, Permission, StaffMember};
use crate::totp::TotpCode;
use crate::validate::{validate_email, validate_log_filter, validate_log_flags, validate_password, EMAIL_MAX_LEN};
use crate::{Error, Result};

/// Service for staff accounts, privileges, activity logs and sessions.
///
/// # Example
///
/// ```no_run
/// use adminpanel_rs::api::StaffLogQuery;
///
/// # async fn example(client: adminpanel_rs::AdminClient) -> adminpanel_rs::Result<()> {
/// for member in client.staff().list().await? {
///     println!("{} {}", member.id, member.email);
/// }
///
/// let page = client.staff().logs(&StaffLogQuery::default()).await?;
/// println!("{} log entries", page.total_rows);
/// # Ok(())
/// # }
/// ```
pub struct StaffService {
    inner: Arc<ClientInner>,
}

/// Activity log search. `admin: None` searches every staff member.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffLogQuery {
    /// Staff member whose log to search
    #[serde(serialize_with = "admin_or_any")]
    pub admin: Option<AdminId>,
    /// Flags, separated by spaces or commas
    #[serde(skip_serializing_if = "String::is_empty")]
    pub flags: String,
    /// Log message filter
    #[serde(skip_serializing_if = "String::is_empty")]
    pub filter: String,
    /// Page number, from 1
    pub page: u32,
    /// Rows per page
    pub per_page: u32,
}

impl Default for StaffLogQuery {
    fn default() -> Self {
        Self {
            admin: None,
            flags: String::new(),
            filter: String::new(),
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl StaffLogQuery {
    fn validate(&self) -> Result<()> {
        validate_log_flags(&self.flags)?;
        validate_log_filter(&self.filter)?;
        Ok(())
    }
}

/// Column staff sessions are sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminSessionSort {
    /// Newest issued first
    #[default]
    IssuedOn,
    /// Most recently used first
    LastUsedOn,
}

/// Staff session search.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffSessionQuery {
    /// Staff member whose sessions to search
    #[serde(serialize_with = "admin_or_any")]
    pub admin: Option<AdminId>,
    /// Only archived (`Some(true)`) or only live (`Some(false)`) sessions
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "flag_as_int")]
    pub archived: Option<bool>,
    /// Column to match `value` against (e.g. `ip_address`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Value to match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Page number, from 1
    pub page: u32,
    /// Rows per page
    pub per_page: u32,
    /// Sort column
    pub sort: AdminSessionSort,
}

impl Default for StaffSessionQuery {
    fn default() -> Self {
        Self {
            admin: None,
            archived: None,
            key: None,
            value: None,
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
            sort: AdminSessionSort::default(),
        }
    }
}

/// Maintenance actions of `/auth/staff/reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResetAction {
    /// Reset two-factor authentication
    #[serde(rename = "2fa")]
    TwoFactor,
    /// Recompute the account checksum
    #[serde(rename = "checksum")]
    Checksum,
    /// Re-sign the privileges record
    #[serde(rename = "privileges")]
    Privileges,
}

/// A newly created staff account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedAdmin {
    /// Id assigned by the server
    pub id: AdminId,
    /// Login e-mail address
    pub email: String,
}

fn admin_or_any<S: Serializer>(
    admin: &Option<AdminId>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(admin.map(|a| a.get()).unwrap_or(0))
}

fn flag_as_int<S: Serializer>(
    flag: &Option<bool>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match flag {
        Some(flag) => serializer.serialize_u8(u8::from(*flag)),
        None => serializer.serialize_none(),
    }
}

impl StaffService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// List all staff accounts.
    pub async fn list(&self) -> Result<Vec<StaffMember>> {
        self.inner.get_field("/auth/staff", &json!({}), "staff").await
    }

    /// Get one staff account.
    pub async fn get(&self, id: AdminId) -> Result<StaffMember> {
        let staff: Vec<StaffMember> = self
            .inner
            .get_field("/auth/staff", &json!({"id": id}), "staff")
            .await?;
        staff
            .into_iter()
            .find(|member| member.id == id)
            .ok_or_else(|| Error::MalformedResponse(format!("Staff member {id} not returned")))
    }

    /// Get the privileges of a staff account, keyed by privilege name.
    pub async fn privileges(&self, id: AdminId) -> Result<BTreeMap<String, Permission>> {
        self.inner
            .get_field("/auth/staff/privileges", &json!({"id": id}), "permissions")
            .await
    }

    /// Grant or revoke privileges.
    pub async fn set_privileges(
        &self,
        id: AdminId,
        permissions: &BTreeMap<String, bool>,
        totp: &TotpCode,
    ) -> Result<()> {
        self.inner
            .post(
                "/auth/staff/privileges",
                &json!({"id": id, "permissions": permissions, "totp": totp}),
            )
            .await?;
        info!(admin = %id, "staff privileges updated");
        Ok(())
    }

    /// Create a staff account with a temporary password.
    pub async fn insert(
        &self,
        email: &str,
        temp_password: &str,
        totp: &TotpCode,
    ) -> Result<CreatedAdmin> {
        validate_email(email, EMAIL_MAX_LEN)?;
        validate_password(temp_password, "Temporary password")?;

        let admin_id: AdminId = self
            .inner
            .post(
                "/auth/staff/insert",
                &json!({"email": email, "tempPassword": temp_password, "totp": totp}),
            )
            .await?
            .field("adminId")?;
        if admin_id.get() == 0 {
            return Err(Error::MalformedResponse(
                "Expected a new administrator id in response".to_string(),
            ));
        }

        info!(admin = %admin_id, "staff account created");
        Ok(CreatedAdmin {
            id: admin_id,
            email: email.to_string(),
        })
    }

    /// Enable or disable an account and change its e-mail address.
    pub async fn update_account(
        &self,
        id: AdminId,
        enabled: bool,
        email: &str,
        totp: &TotpCode,
    ) -> Result<()> {
        validate_email(email, EMAIL_MAX_LEN)?;
        self.inner
            .post(
                "/auth/staff/reset",
                &json!({
                    "id": id,
                    "action": "account",
                    "enabled": enabled,
                    "email": email,
                    "totp": totp
                }),
            )
            .await?;
        info!(admin = %id, enabled, "staff account updated");
        Ok(())
    }

    /// Replace the password with a temporary one.
    pub async fn reset_password(
        &self,
        id: AdminId,
        temp_password: &str,
        totp: &TotpCode,
    ) -> Result<()> {
        validate_password(temp_password, "Temporary password")?;
        self.inner
            .post(
                "/auth/staff/reset",
                &json!({
                    "id": id,
                    "action": "password",
                    "tempPassword": temp_password,
                    "totp": totp
                }),
            )
            .await?;
        info!(admin = %id, "staff password reset");
        Ok(())
    }

    /// Run a maintenance action. Returns the server's message, if any.
    pub async fn reset(
        &self,
        id: AdminId,
        action: ResetAction,
        totp: &TotpCode,
    ) -> Result<Option<String>> {
        let message = self
            .inner
            .post(
                "/auth/staff/reset",
                &json!({"id": id, "action": action, "totp": totp}),
            )
            .await?
            .optional_field::<String>("success")?
            .filter(|m| !m.is_empty());
        info!(admin = %id, ?action, "staff reset action executed");
        Ok(message)
    }

    /// Search the activity log, one page.
    pub async fn logs(&self, query: &StaffLogQuery) -> Result<SearchPage<AdminActivityLog>> {
        query.validate()?;
        self.inner.get_field("/auth/staff/logs", query, "logs").await
    }

    /// Stream every matching activity log entry.
    pub fn logs_stream(&self, query: StaffLogQuery) -> PaginatedStream<AdminActivityLog> {
        let builder = PaginatedStreamBuilder::new(self.inner.clone(), "/auth/staff/logs", "logs")
            .per_page(query.per_page);
        match query.validate() {
            Ok(()) => builder.build_with_query(&query),
            Err(e) => PaginatedStream::failed(e),
        }
    }

    /// Search staff sessions, one page.
    pub async fn sessions(&self, query: &StaffSessionQuery) -> Result<SearchPage<AdminSession>> {
        if query.key.is_some() && query.value.as_deref().unwrap_or("").is_empty() {
            return Err(Error::InvalidInput("Search value is required".to_string()));
        }
        self.inner
            .get_field("/auth/staff/sessions", query, "sessions")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_query_serialization() {
        let query = StaffLogQuery {
            admin: Some(AdminId::new(4)),
            flags: "auth".into(),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({"admin": 4, "flags": "auth", "page": 1, "perPage": DEFAULT_PAGE_SIZE})
        );

        let any = serde_json::to_value(StaffLogQuery::default()).unwrap();
        assert_eq!(any["admin"], 0);
    }

    #[test]
    fn test_session_query_serialization() {
        let query = StaffSessionQuery {
            archived: Some(true),
            sort: AdminSessionSort::LastUsedOn,
            ..Default::default()
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["archived"], 1);
        assert_eq!(value["sort"], "last_used_on");
        assert!(value.get("key").is_none());
    }

    #[test]
    fn test_reset_action_names() {
        assert_eq!(serde_json::to_value(ResetAction::TwoFactor).unwrap(), "2fa");
        assert_eq!(serde_json::to_value(ResetAction::Privileges).unwrap(), "privileges");
    }
}
