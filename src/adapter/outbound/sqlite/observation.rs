//! SQLite stats and health histories.

use async_trait::async_trait;
use diesel::prelude::*;

use super::database::connection::DbPool;
use super::database::model::{HealthRow, NewHealthRow, NewStatsRow, StatsRow};
use super::database::schema::{server_health, server_stats};
use super::{checked_count, decode_time, encode_time, stored_count};
use crate::domain::id::ServerId;
use crate::domain::stats::{HealthCheck, ServerHealth, ServerStats};
use crate::error::{Error, Result};
use crate::port::outbound::repository::{HealthRepository, StatsRepository};

/// Append-only stats samples.
pub struct SqliteStatsRepository {
    pool: DbPool,
}

impl SqliteStatsRepository {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn to_row(stats: &ServerStats) -> Result<NewStatsRow> {
        Ok(NewStatsRow {
            server_id: stats.server_id.to_string(),
            cpu_usage: stats.cpu_usage,
            memory_usage: stats.memory_usage,
            storage_usage: stats.storage_usage,
            network_in: checked_count(stats.network_in, "network_in")?,
            network_out: checked_count(stats.network_out, "network_out")?,
            uptime: checked_count(stats.uptime, "uptime")?,
            request_count: checked_count(stats.request_count, "request_count")?,
            response_time: stats.response_time,
            error_rate: stats.error_rate,
            recorded_at: encode_time(stats.timestamp),
        })
    }

    fn from_row(row: StatsRow) -> Result<ServerStats> {
        Ok(ServerStats {
            server_id: ServerId::from(row.server_id),
            cpu_usage: row.cpu_usage,
            memory_usage: row.memory_usage,
            storage_usage: row.storage_usage,
            network_in: stored_count(row.network_in),
            network_out: stored_count(row.network_out),
            uptime: stored_count(row.uptime),
            request_count: stored_count(row.request_count),
            response_time: row.response_time,
            error_rate: row.error_rate,
            timestamp: decode_time(&row.recorded_at)?,
        })
    }

    fn load(&self, server_id: &ServerId, limit: i64) -> Result<Vec<ServerStats>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let rows: Vec<StatsRow> = server_stats::table
            .filter(server_stats::server_id.eq(server_id.as_str()))
            .order(server_stats::id.desc())
            .limit(limit)
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(Self::from_row).collect()
    }
}

#[async_trait]
impl StatsRepository for SqliteStatsRepository {
    async fn save_stats(&self, stats: &ServerStats) -> Result<()> {
        let row = Self::to_row(stats)?;
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        diesel::insert_into(server_stats::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn get_stats(&self, server_id: &ServerId, limit: usize) -> Result<Vec<ServerStats>> {
        self.load(server_id, i64::try_from(limit).unwrap_or(i64::MAX))
    }

    async fn get_latest_stats(&self, server_id: &ServerId) -> Result<Option<ServerStats>> {
        Ok(self.load(server_id, 1)?.into_iter().next())
    }
}

/// Health verdict history.
pub struct SqliteHealthRepository {
    pool: DbPool,
}

impl SqliteHealthRepository {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn to_row(health: &ServerHealth) -> Result<NewHealthRow> {
        Ok(NewHealthRow {
            server_id: health.server_id.to_string(),
            status: health.status.as_str().to_string(),
            message: health.message.clone(),
            checks: serde_json::to_string(&health.checks)?,
            recorded_at: encode_time(health.timestamp),
        })
    }

    fn from_row(row: HealthRow) -> Result<ServerHealth> {
        let checks: Vec<HealthCheck> = serde_json::from_str(&row.checks)?;
        Ok(ServerHealth {
            server_id: ServerId::from(row.server_id),
            status: row.status.parse().map_err(Error::Parse)?,
            message: row.message,
            checks,
            timestamp: decode_time(&row.recorded_at)?,
        })
    }

    fn load(&self, server_id: &ServerId, limit: i64) -> Result<Vec<ServerHealth>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let rows: Vec<HealthRow> = server_health::table
            .filter(server_health::server_id.eq(server_id.as_str()))
            .order(server_health::id.desc())
            .limit(limit)
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(Self::from_row).collect()
    }
}

#[async_trait]
impl HealthRepository for SqliteHealthRepository {
    async fn save_health(&self, health: &ServerHealth) -> Result<()> {
        let row = Self::to_row(health)?;
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        diesel::insert_into(server_health::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    async fn get_health(&self, server_id: &ServerId) -> Result<Option<ServerHealth>> {
        Ok(self.load(server_id, 1)?.into_iter().next())
    }

    async fn get_all_health(&self) -> Result<Vec<ServerHealth>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let rows: Vec<HealthRow> = diesel::sql_query(
            "SELECT h.* FROM server_health h \
             JOIN (SELECT server_id, MAX(id) AS id FROM server_health GROUP BY server_id) latest \
             ON h.id = latest.id ORDER BY h.server_id",
        )
        .load(&mut conn)
        .map_err(|e| Error::Database(e.to_string()))?;
        rows.into_iter().map(Self::from_row).collect()
    }

    async fn get_health_history(
        &self,
        server_id: &ServerId,
        limit: usize,
    ) -> Result<Vec<ServerHealth>> {
        self.load(server_id, i64::try_from(limit).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::database::connection::memory_pool;
    use crate::domain::stats::HealthStatus;

    fn pool() -> DbPool {
        memory_pool()
    }

    #[tokio::test]
    async fn stats_history_is_newest_first() {
        let repo = SqliteStatsRepository::new(pool());
        let id = ServerId::new("s-1");
        for cpu in [10.0, 20.0, 30.0] {
            let mut sample = ServerStats::zero(id.clone());
            sample.cpu_usage = cpu;
            sample.network_in = 4096;
            repo.save_stats(&sample).await.unwrap();
        }

        let history = repo.get_stats(&id, 2).await.unwrap();
        let cpus: Vec<f64> = history.iter().map(|s| s.cpu_usage).collect();
        assert_eq!(cpus, vec![30.0, 20.0]);
        assert_eq!(history[0].network_in, 4096);

        let latest = repo.get_latest_stats(&id).await.unwrap().unwrap();
        assert_eq!(latest.cpu_usage, 30.0);
        assert!(repo
            .get_latest_stats(&ServerId::new("other"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn stats_reject_counters_beyond_i64() {
        let repo = SqliteStatsRepository::new(pool());
        let mut sample = ServerStats::zero(ServerId::new("s-1"));
        sample.network_out = u64::MAX;
        assert!(matches!(
            repo.save_stats(&sample).await,
            Err(Error::Parse(_))
        ));
    }

    #[tokio::test]
    async fn health_keeps_checks_and_latest_per_server() {
        let repo = SqliteHealthRepository::new(pool());
        let a = ServerId::new("a");
        let b = ServerId::new("b");
        repo.save_health(&ServerHealth::new(a.clone(), HealthStatus::Starting, "booting"))
            .await
            .unwrap();
        repo.save_health(
            &ServerHealth::new(a.clone(), HealthStatus::Running, "ok")
                .with_check(HealthCheck::new("container-state", true, "running")),
        )
        .await
        .unwrap();
        repo.save_health(&ServerHealth::new(b.clone(), HealthStatus::Error, "crashed"))
            .await
            .unwrap();

        let latest = repo.get_health(&a).await.unwrap().unwrap();
        assert_eq!(latest.status, HealthStatus::Running);
        assert_eq!(latest.checks.len(), 1);
        assert!(latest.checks[0].passed);

        let all = repo.get_all_health().await.unwrap();
        let statuses: Vec<_> = all.iter().map(|h| (h.server_id.as_str(), h.status)).collect();
        assert_eq!(
            statuses,
            vec![("a", HealthStatus::Running), ("b", HealthStatus::Error)]
        );
        assert_eq!(repo.get_health_history(&a, 10).await.unwrap().len(), 2);
    }
}
