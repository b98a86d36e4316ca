//! Database backup models.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::primitives::BackupId;

/// A stored database backup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbBackup {
    /// Backup id
    pub id: BackupId,
    /// Non-zero when the backup was queued by hand
    #[serde(default)]
    pub manual: i64,
    /// Database label the backup was taken from
    pub db: String,
    /// Unix time the backup was taken
    pub epoch: i64,
    /// Stored file name
    pub filename: String,
    /// Size in bytes
    pub size: u64,
}

impl DbBackup {
    /// Returns `true` if the backup was queued manually.
    pub fn is_manual(&self) -> bool {
        self.manual != 0
    }

    /// Size in megabytes, rounded to two decimals.
    pub fn size_mb(&self) -> f64 {
        let mb = self.size as f64 / 1024.0 / 1024.0;
        ((mb + f64::EPSILON) * 100.0).round() / 100.0
    }
}

/// Connection details of one configured database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Driver name (e.g. `mysql`)
    pub driver: String,
    /// Database host
    pub host: String,
    /// Database port; the server may send it as a string, number or null
    #[serde(default, deserialize_with = "lenient_port")]
    pub port: Option<u16>,
    /// Schema name
    pub name: String,
}

/// A configured database together with the label the server keys it by.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDatabase {
    /// Label used by `queue` requests
    pub label: String,
    /// Connection details
    pub config: DatabaseConfig,
}

/// Backup configuration returned by `/auth/dbs?action=config`.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupsConfig {
    /// Databases available for backup, in server order
    pub databases: Vec<LabeledDatabase>,
    /// Whether a backup job is already queued
    pub backup_queue_busy: bool,
}

fn lenient_port<'de, D>(deserializer: D) -> std::result::Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_size_mb() {
        let backup: DbBackup = serde_json::from_value(serde_json::json!({
            "id": 9,
            "manual": 1,
            "db": "primary",
            "epoch": 1700000000,
            "filename": "primary-1700000000.sql.gz",
            "size": 5_242_880
        }))
        .unwrap();
        assert!(backup.is_manual());
        assert_eq!(backup.size_mb(), 5.0);
    }

    #[test]
    fn test_database_port_forms() {
        let from_str: DatabaseConfig = serde_json::from_value(serde_json::json!({
            "driver": "mysql", "host": "localhost", "port": "3306", "name": "app"
        }))
        .unwrap();
        assert_eq!(from_str.port, Some(3306));

        let from_null: DatabaseConfig = serde_json::from_value(serde_json::json!({
            "driver": "mysql", "host": "localhost", "port": null, "name": "app"
        }))
        .unwrap();
        assert_eq!(from_null.port, None);

        let missing: DatabaseConfig = serde_json::from_value(serde_json::json!({
            "driver": "mysql", "host": "localhost", "name": "app"
        }))
        .unwrap();
        assert_eq!(missing.port, None);
    }
}
