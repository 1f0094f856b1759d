//! Lifecycle service and storage configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::application::server::ServiceSettings;

/// `[service]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Upper bound on one orchestrator call, in seconds.
    pub backend_timeout_secs: u64,
    /// Pause between stop and start on restart, in milliseconds.
    pub restart_settle_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            backend_timeout_secs: 30,
            restart_settle_ms: 2000,
        }
    }
}

impl ServiceConfig {
    #[must_use]
    pub const fn settings(&self) -> ServiceSettings {
        ServiceSettings {
            backend_timeout: Duration::from_secs(self.backend_timeout_secs),
            restart_settle: Duration::from_millis(self.restart_settle_ms),
        }
    }
}

/// Where server records live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory; lost on exit.
    Memory,
    #[default]
    Sqlite,
}

/// `[storage]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// SQLite database file.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            path: "server-manager.db".into(),
        }
    }
}
