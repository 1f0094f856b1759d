//! Repository construction for the configured storage backend.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::memory::{
    MemoryBackupRepository, MemoryHealthRepository, MemoryScalingRepository,
    MemoryServerRepository, MemoryStatsRepository, MemoryUpdateRepository,
};
use crate::adapter::outbound::sqlite::{
    open, SqliteHealthRepository, SqliteServerRepository, SqliteStatsRepository,
};
use crate::error::Result;
use crate::infrastructure::config::service::{StorageBackend, StorageConfig};
use crate::port::outbound::repository::{
    BackupRepository, HealthRepository, ScalingRepository, ServerRepository, StatsRepository,
    UpdateRepository,
};

/// Every repository the lifecycle service can use.
pub struct Repositories {
    pub servers: Arc<dyn ServerRepository>,
    pub stats: Arc<dyn StatsRepository>,
    pub health: Arc<dyn HealthRepository>,
    pub scaling: Arc<dyn ScalingRepository>,
    pub backups: Arc<dyn BackupRepository>,
    pub updates: Arc<dyn UpdateRepository>,
}

/// Build repositories for `config`.
///
/// Scaling, backup and update records are held in memory on both backends.
///
/// # Errors
///
/// Returns a database error if the SQLite file cannot be opened or migrated.
pub fn build_repositories(config: &StorageConfig) -> Result<Repositories> {
    let (servers, stats, health): (
        Arc<dyn ServerRepository>,
        Arc<dyn StatsRepository>,
        Arc<dyn HealthRepository>,
    ) = match config.backend {
        StorageBackend::Memory => (
            Arc::new(MemoryServerRepository::new()),
            Arc::new(MemoryStatsRepository::new()),
            Arc::new(MemoryHealthRepository::new()),
        ),
        StorageBackend::Sqlite => {
            let pool = open(&config.path)?;
            info!(path = %config.path, "Database ready");
            (
                Arc::new(SqliteServerRepository::new(pool.clone())),
                Arc::new(SqliteStatsRepository::new(pool.clone())),
                Arc::new(SqliteHealthRepository::new(pool)),
            )
        }
    };

    Ok(Repositories {
        servers,
        stats,
        health,
        scaling: Arc::new(MemoryScalingRepository::new()),
        backups: Arc::new(MemoryBackupRepository::new()),
        updates: Arc::new(MemoryUpdateRepository::new()),
    })
}
