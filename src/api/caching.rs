//! Caching engine inspection and maintenance.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::client::ClientInner;
use crate::models::{CacheConfig, CacheObjectId, CacheStatus, CachedObject};
use crate::totp::TotpCode;
use crate::Result;

const ENDPOINT: &str = "/auth/caching";

/// A cache mutation awaiting TOTP confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheCommand {
    /// Drop every cached object
    Flush,
    /// Drop one cached object
    Delete {
        /// Object to remove
        object_id: CacheObjectId,
    },
}

/// Service for the caching engine.
///
/// # Example
///
/// ```no_run
/// use adminpanel_rs::{CacheObjectId, CacheStatus};
///
/// # async fn example(client: adminpanel_rs::AdminClient) -> adminpanel_rs::Result<()> {
/// if client.caching().status().await? == CacheStatus::Connected {
///     let ids = [CacheObjectId::new("app.systemConfig")?];
///     for (id, object) in client.caching().objects(&ids).await? {
///         println!("{id}: cached={:?}", object.found);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct CachingService {
    inner: Arc<ClientInner>,
}

impl CachingService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Get the configured engine.
    pub async fn config(&self) -> Result<CacheConfig> {
        self.inner
            .get_field(ENDPOINT, &json!({"action": "config"}), "config")
            .await
    }

    /// Check whether the engine is configured and reachable.
    ///
    /// The connection is only checked when an engine is configured.
    pub async fn status(&self) -> Result<CacheStatus> {
        if !self.config().await?.is_enabled() {
            return Ok(CacheStatus::Disabled);
        }
        let connected = self
            .inner
            .get(ENDPOINT, &json!({"action": "status"}))
            .await?
            .optional_field::<bool>("isConnected")?
            .unwrap_or(false);
        Ok(if connected {
            CacheStatus::Connected
        } else {
            CacheStatus::Failed
        })
    }

    /// Look up cached objects by id.
    pub async fn objects(
        &self,
        ids: &[CacheObjectId],
    ) -> Result<BTreeMap<String, CachedObject>> {
        if ids.is_empty() {
            return Ok(BTreeMap::new());
        }
        let joined = ids
            .iter()
            .map(CacheObjectId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        self.inner
            .get_field(
                ENDPOINT,
                &json!({"action": "objects", "objects": joined}),
                "objects",
            )
            .await
    }

    /// Flush the whole cache.
    pub async fn flush(&self, totp: &TotpCode) -> Result<()> {
        self.inner
            .post(ENDPOINT, &json!({"action": "flush", "totp": totp}))
            .await?;
        info!("cache flushed");
        Ok(())
    }

    /// Remove one object from the cache.
    pub async fn delete(&self, object_id: &CacheObjectId, totp: &TotpCode) -> Result<()> {
        self.inner
            .post(
                ENDPOINT,
                &json!({"action": "delete", "object": object_id, "totp": totp}),
            )
            .await?;
        info!(object = %object_id, "cached object deleted");
        Ok(())
    }

    /// Run a confirmed [`CacheCommand`].
    pub async fn execute(&self, command: CacheCommand, totp: &TotpCode) -> Result<()> {
        match command {
            CacheCommand::Flush => self.flush(totp).await,
            CacheCommand::Delete { object_id } => self.delete(&object_id, totp).await,
        }
    }
}
