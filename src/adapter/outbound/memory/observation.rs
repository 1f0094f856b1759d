use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::id::ServerId;
use crate::domain::stats::{ServerHealth, ServerStats};
use crate::error::Result;
use crate::port::outbound::repository::{HealthRepository, StatsRepository};

/// In-memory append-only stats history.
#[derive(Debug, Default)]
pub struct MemoryStatsRepository {
    samples: RwLock<HashMap<ServerId, Vec<ServerStats>>>,
}

impl MemoryStatsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatsRepository for MemoryStatsRepository {
    async fn save_stats(&self, stats: &ServerStats) -> Result<()> {
        self.samples
            .write()
            .entry(stats.server_id.clone())
            .or_default()
            .push(stats.clone());
        Ok(())
    }

    async fn get_stats(&self, server_id: &ServerId, limit: usize) -> Result<Vec<ServerStats>> {
        Ok(self
            .samples
            .read()
            .get(server_id)
            .map(|history| history.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn get_latest_stats(&self, server_id: &ServerId) -> Result<Option<ServerStats>> {
        Ok(self
            .samples
            .read()
            .get(server_id)
            .and_then(|history| history.last().cloned()))
    }
}

/// In-memory health history.
#[derive(Debug, Default)]
pub struct MemoryHealthRepository {
    verdicts: RwLock<HashMap<ServerId, Vec<ServerHealth>>>,
}

impl MemoryHealthRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HealthRepository for MemoryHealthRepository {
    async fn save_health(&self, health: &ServerHealth) -> Result<()> {
        self.verdicts
            .write()
            .entry(health.server_id.clone())
            .or_default()
            .push(health.clone());
        Ok(())
    }

    async fn get_health(&self, server_id: &ServerId) -> Result<Option<ServerHealth>> {
        Ok(self
            .verdicts
            .read()
            .get(server_id)
            .and_then(|history| history.last().cloned()))
    }

    async fn get_all_health(&self) -> Result<Vec<ServerHealth>> {
        let mut latest: Vec<ServerHealth> = self
            .verdicts
            .read()
            .values()
            .filter_map(|history| history.last().cloned())
            .collect();
        latest.sort_by(|a, b| a.server_id.cmp(&b.server_id));
        Ok(latest)
    }

    async fn get_health_history(
        &self,
        server_id: &ServerId,
        limit: usize,
    ) -> Result<Vec<ServerHealth>> {
        Ok(self
            .verdicts
            .read()
            .get(server_id)
            .map(|history| history.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stats::HealthStatus;

    #[tokio::test]
    async fn latest_stats_win() {
        let repo = MemoryStatsRepository::new();
        let id = ServerId::new("s");
        let mut first = ServerStats::zero(id.clone());
        first.cpu_usage = 10.0;
        let mut second = ServerStats::zero(id.clone());
        second.cpu_usage = 20.0;
        repo.save_stats(&first).await.unwrap();
        repo.save_stats(&second).await.unwrap();

        let latest = repo.get_latest_stats(&id).await.unwrap().unwrap();
        assert_eq!(latest.cpu_usage, 20.0);
        let history = repo.get_stats(&id, 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].cpu_usage, 20.0);
        assert!(repo.get_latest_stats(&ServerId::new("x")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn all_health_reports_latest_per_server() {
        let repo = MemoryHealthRepository::new();
        let a = ServerId::new("a");
        let b = ServerId::new("b");
        repo.save_health(&ServerHealth::new(a.clone(), HealthStatus::Starting, ""))
            .await
            .unwrap();
        repo.save_health(&ServerHealth::new(a.clone(), HealthStatus::Running, ""))
            .await
            .unwrap();
        repo.save_health(&ServerHealth::new(b.clone(), HealthStatus::Error, ""))
            .await
            .unwrap();

        let all = repo.get_all_health().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].status, HealthStatus::Running);
        assert_eq!(all[1].status, HealthStatus::Error);
        assert_eq!(repo.get_health_history(&a, 1).await.unwrap().len(), 1);
    }
}
