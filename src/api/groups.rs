//! User groups service.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::client::ClientInner;
use crate::models::{GroupId, UserGroup};
use crate::totp::TotpCode;
use crate::validate::validate_group_name;
use crate::Result;

const ENDPOINT: &str = "/auth/users/groups";

/// Service for user groups.
///
/// Every successful mutation asks group subscribers to reload through
/// [`EventBus::reload_groups`](crate::EventBus::reload_groups).
pub struct GroupsService {
    inner: Arc<ClientInner>,
}

impl GroupsService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// List all groups.
    pub async fn list(&self) -> Result<Vec<UserGroup>> {
        self.inner.get_field(ENDPOINT, &json!({}), "groups").await
    }

    /// Create a group.
    pub async fn create(&self, name: &str, totp: &TotpCode) -> Result<()> {
        validate_group_name(name)?;
        self.inner
            .put(ENDPOINT, &json!({"name": name, "totp": totp}))
            .await?;
        info!(name, "user group created");
        self.inner.events.reload_groups();
        Ok(())
    }

    /// Rename a group.
    pub async fn rename(&self, id: GroupId, name: &str, totp: &TotpCode) -> Result<()> {
        validate_group_name(name)?;
        self.inner
            .post(ENDPOINT, &json!({"group": id, "name": name, "totp": totp}))
            .await?;
        info!(group = %id, name, "user group renamed");
        self.inner.events.reload_groups();
        Ok(())
    }

    /// Delete a group.
    pub async fn delete(&self, id: GroupId, totp: &TotpCode) -> Result<()> {
        self.inner
            .delete(ENDPOINT, &json!({"group": id, "totp": totp}))
            .await?;
        info!(group = %id, "user group deleted");
        self.inner.events.reload_groups();
        Ok(())
    }
}
