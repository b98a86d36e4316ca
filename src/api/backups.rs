//! Database backups service.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::info;

use crate::client::{ClientInner, FileDownload};
use crate::models::{BackupId, BackupsConfig, DatabaseConfig, DbBackup, LabeledDatabase};
use crate::totp::TotpCode;
use crate::{Error, Result};

const ENDPOINT: &str = "/auth/dbs";

/// A backup mutation awaiting TOTP confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupCommand {
    /// Queue a new backup of a configured database
    Queue {
        /// Label of the database, as returned by [`BackupsService::config`]
        database: String,
    },
    /// Delete a stored backup
    Delete {
        /// Backup to delete
        id: BackupId,
    },
}

/// Service for listing, downloading and managing database backups.
///
/// # Example
///
/// ```no_run
/// # async fn example(client: adminpanel_rs::AdminClient) -> adminpanel_rs::Result<()> {
/// let backups = client.backups().list().await?;
/// if let Some(latest) = backups.first() {
///     let file = client.backups().download(latest.id).await?;
///     std::fs::write(&file.filename, &file.bytes).ok();
/// }
/// # Ok(())
/// # }
/// ```
pub struct BackupsService {
    inner: Arc<ClientInner>,
}

impl BackupsService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// List stored backups.
    pub async fn list(&self) -> Result<Vec<DbBackup>> {
        self.inner
            .get_field(ENDPOINT, &json!({"action": "backups"}), "backups")
            .await
    }

    /// Get the databases available for backup and the queue state.
    pub async fn config(&self) -> Result<BackupsConfig> {
        let success = self.inner.get(ENDPOINT, &json!({"action": "config"})).await?;
        let databases: Map<String, Value> = success.field("config")?;
        let databases = databases
            .into_iter()
            .map(|(label, config)| {
                Ok(LabeledDatabase {
                    label,
                    config: serde_json::from_value::<DatabaseConfig>(config)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BackupsConfig {
            databases,
            backup_queue_busy: success
                .optional_field::<bool>("backupQueueBusy")?
                .unwrap_or(false),
        })
    }

    /// Download a stored backup file.
    pub async fn download(&self, id: BackupId) -> Result<FileDownload> {
        let file = self
            .inner
            .download(ENDPOINT, &json!({"action": "download", "id": id}))
            .await?;
        info!(backup = %id, filename = %file.filename, bytes = file.bytes.len(), "backup downloaded");
        Ok(file)
    }

    /// Queue a backup of the database labelled `database`.
    pub async fn queue(&self, database: &str, totp: &TotpCode) -> Result<()> {
        if database.is_empty() {
            return Err(Error::InvalidInput("Select a database to back up".to_string()));
        }
        self.inner
            .post(
                ENDPOINT,
                &json!({"action": "queue", "database": database, "totp": totp}),
            )
            .await?;
        info!(database, "database backup queued");
        Ok(())
    }

    /// Delete a stored backup.
    pub async fn delete(&self, id: BackupId, totp: &TotpCode) -> Result<()> {
        self.inner
            .post(ENDPOINT, &json!({"action": "delete", "id": id, "totp": totp}))
            .await?;
        info!(backup = %id, "database backup deleted");
        Ok(())
    }

    /// Run a confirmed [`BackupCommand`].
    pub async fn execute(&self, command: BackupCommand, totp: &TotpCode) -> Result<()> {
        match command {
            BackupCommand::Queue { database } => self.queue(&database, totp).await,
            BackupCommand::Delete { id } => self.delete(id, totp).await,
        }
    }
}
