//! Caching engine models.

use serde::{Deserialize, Serialize};

/// Caching engine connection settings, as configured on the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Engine name (e.g. `redis`); empty or absent when caching is off
    #[serde(default)]
    pub engine: Option<String>,
    /// Cache server host
    #[serde(default)]
    pub host: Option<String>,
    /// Cache server port
    #[serde(default)]
    pub port: Option<u16>,
}

impl CacheConfig {
    /// Returns `true` if an engine is configured.
    pub fn is_enabled(&self) -> bool {
        self.engine.as_deref().map(|e| !e.is_empty()).unwrap_or(false)
    }
}

/// Reachability of the caching engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// No engine configured
    Disabled,
    /// Engine configured and answering
    Connected,
    /// Engine configured but not connected
    Failed,
}

/// Lookup result for one cached object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedObject {
    /// Whether the object is currently cached
    #[serde(default)]
    pub found: Option<bool>,
    /// Unix time the object was cached
    #[serde(default)]
    pub cached_on: Option<i64>,
    /// Lookup error reported by the server
    #[serde(default)]
    pub error: Option<String>,
}
