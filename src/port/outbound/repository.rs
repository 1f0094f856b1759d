//! Repository ports for servers and their secondary records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::id::{RecordId, ServerId};
use crate::domain::policy::{Backup, BackupConfig, ScalingPolicy, UpdateStatus};
use crate::domain::server::{Server, ServerStatus, ServerType};
use crate::domain::stats::{ServerHealth, ServerStats};
use crate::error::Result;

/// Typed listing filter. Set fields combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerFilter {
    pub server_type: Option<ServerType>,
    pub region: Option<String>,
    pub status: Option<ServerStatus>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ServerFilter {
    #[must_use]
    pub fn by_type(server_type: ServerType) -> Self {
        Self {
            server_type: Some(server_type),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn by_region(region: impl Into<String>) -> Self {
        Self {
            region: Some(region.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn by_status(status: ServerStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Whether `server` satisfies every set predicate. Pagination is not
    /// considered here.
    #[must_use]
    pub fn matches(&self, server: &Server) -> bool {
        !server.is_deleted()
            && self.server_type.map_or(true, |t| t == server.server_type)
            && self.region.as_deref().map_or(true, |r| r == server.region)
            && self.status.map_or(true, |s| s == server.status())
    }
}

/// Persistence of server entities. Deleted servers are invisible to every
/// query except through their tombstone.
#[async_trait]
pub trait ServerRepository: Send + Sync {
    /// Insert a new server. Fails with `Conflict` when the id exists.
    async fn create(&self, server: &Server) -> Result<()>;

    /// Fetch an active server.
    async fn get_by_id(&self, id: &ServerId) -> Result<Option<Server>>;

    /// Active servers matching `filter`, newest first.
    async fn list(&self, filter: &ServerFilter) -> Result<Vec<Server>>;

    /// Overwrite an active server. Fails with `NotFound` otherwise.
    async fn update(&self, server: &Server) -> Result<()>;

    /// Record a tombstone. The row is kept for audit.
    async fn delete(&self, id: &ServerId) -> Result<()>;

    async fn get_by_type(&self, server_type: ServerType) -> Result<Vec<Server>> {
        self.list(&ServerFilter::by_type(server_type)).await
    }

    async fn get_by_region(&self, region: &str) -> Result<Vec<Server>> {
        self.list(&ServerFilter::by_region(region)).await
    }

    async fn get_by_status(&self, status: ServerStatus) -> Result<Vec<Server>> {
        self.list(&ServerFilter::by_status(status)).await
    }

    /// The active server called `name`, if any.
    async fn find_by_name(&self, name: &str) -> Result<Option<Server>> {
        Ok(self
            .list(&ServerFilter::default())
            .await?
            .into_iter()
            .find(|s| s.name == name))
    }
}

/// Append-only stats history.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn save_stats(&self, stats: &ServerStats) -> Result<()>;

    /// Up to `limit` samples, newest first.
    async fn get_stats(&self, server_id: &ServerId, limit: usize) -> Result<Vec<ServerStats>>;

    async fn get_latest_stats(&self, server_id: &ServerId) -> Result<Option<ServerStats>>;
}

/// Health history with a latest-per-server view.
#[async_trait]
pub trait HealthRepository: Send + Sync {
    async fn save_health(&self, health: &ServerHealth) -> Result<()>;

    async fn get_health(&self, server_id: &ServerId) -> Result<Option<ServerHealth>>;

    /// Latest verdict for every server that has one.
    async fn get_all_health(&self) -> Result<Vec<ServerHealth>>;

    /// Up to `limit` verdicts, newest first.
    async fn get_health_history(
        &self,
        server_id: &ServerId,
        limit: usize,
    ) -> Result<Vec<ServerHealth>>;
}

#[async_trait]
pub trait ScalingRepository: Send + Sync {
    async fn save_policy(&self, policy: &ScalingPolicy) -> Result<()>;
    async fn get_policy(&self, id: &RecordId) -> Result<Option<ScalingPolicy>>;
    async fn list_policies(&self) -> Result<Vec<ScalingPolicy>>;
    async fn update_policy(&self, policy: &ScalingPolicy) -> Result<()>;
    async fn delete_policy(&self, id: &RecordId) -> Result<()>;
}

#[async_trait]
pub trait BackupRepository: Send + Sync {
    async fn save_config(&self, config: &BackupConfig) -> Result<()>;
    async fn get_config(&self, id: &RecordId) -> Result<Option<BackupConfig>>;
    async fn list_configs(&self) -> Result<Vec<BackupConfig>>;
    async fn update_config(&self, config: &BackupConfig) -> Result<()>;
    async fn delete_config(&self, id: &RecordId) -> Result<()>;
    async fn save_backup(&self, backup: &Backup) -> Result<()>;
    async fn get_backups(&self, server_id: &ServerId) -> Result<Vec<Backup>>;
    async fn delete_backup(&self, id: &RecordId) -> Result<()>;
}

#[async_trait]
pub trait UpdateRepository: Send + Sync {
    async fn save_update_status(&self, status: &UpdateStatus) -> Result<()>;
    async fn get_update_status(&self, server_id: &ServerId) -> Result<Option<UpdateStatus>>;
    async fn update_progress(&self, server_id: &ServerId, progress: u8, message: &str) -> Result<()>;
    async fn complete_update(&self, server_id: &ServerId, success: bool, message: &str) -> Result<()>;
}
