//! Stats and health reads and recording.

use tracing::debug;

use super::ServerService;
use crate::domain::id::ServerId;
use crate::domain::stats::{Observation, ServerHealth, ServerStats};
use crate::error::{Error, Result};

const HEALTH_UNCONFIGURED: &str = "health repository not initialized";

impl ServerService {
    /// Latest recorded stats for `id`.
    ///
    /// Without a stats repository this is a zero-gauge placeholder tagged
    /// with `id`, not an error. The server need not exist.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the repository fails.
    pub async fn get_server_stats(&self, id: &ServerId) -> Result<Observation<ServerStats>> {
        let Some(repo) = &self.stats else {
            return Ok(Observation::Unconfigured(ServerStats::zero(id.clone())));
        };
        Ok(match repo.get_latest_stats(id).await? {
            Some(stats) => Observation::Recorded(stats),
            None => Observation::Empty,
        })
    }

    /// Up to `limit` stats samples for `id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Unconfigured` without a stats repository.
    pub async fn get_stats_history(&self, id: &ServerId, limit: usize) -> Result<Vec<ServerStats>> {
        let repo = self
            .stats
            .as_ref()
            .ok_or(Error::Unconfigured("stats repository"))?;
        repo.get_stats(id, limit).await
    }

    /// Latest recorded health verdict for `id`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the repository fails.
    pub async fn get_server_health(&self, id: &ServerId) -> Result<Observation<ServerHealth>> {
        let Some(repo) = &self.health else {
            return Ok(Observation::Unconfigured(ServerHealth::unknown(
                id.clone(),
                HEALTH_UNCONFIGURED,
            )));
        };
        Ok(match repo.get_health(id).await? {
            Some(health) => Observation::Recorded(health),
            None => Observation::Empty,
        })
    }

    /// Latest verdict for every server that has one.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the repository fails.
    pub async fn get_all_servers_health(&self) -> Result<Observation<Vec<ServerHealth>>> {
        let Some(repo) = &self.health else {
            return Ok(Observation::Unconfigured(Vec::new()));
        };
        let all = repo.get_all_health().await?;
        Ok(if all.is_empty() {
            Observation::Empty
        } else {
            Observation::Recorded(all)
        })
    }

    /// Sample stats from the backend and append them to the repository.
    ///
    /// # Errors
    ///
    /// Returns `Unconfigured` without a stats repository, `NotFound`, or the
    /// backend failure.
    pub async fn record_stats(&self, id: &ServerId) -> Result<ServerStats> {
        let repo = self
            .stats
            .as_ref()
            .ok_or(Error::Unconfigured("stats repository"))?;
        let server = self.get_server(id).await?;
        let stats = self
            .bounded("stats", self.orchestrator.get_server_stats(&server))
            .await?;
        repo.save_stats(&stats).await?;
        debug!(server_id = %id, cpu = stats.cpu_usage, memory = stats.memory_usage, "Stats recorded");
        Ok(stats)
    }

    /// Probe health on the backend and append the verdict to the repository.
    ///
    /// # Errors
    ///
    /// Returns `Unconfigured` without a health repository, `NotFound`, or the
    /// backend failure.
    pub async fn record_health(&self, id: &ServerId) -> Result<ServerHealth> {
        let repo = self
            .health
            .as_ref()
            .ok_or(Error::Unconfigured("health repository"))?;
        let server = self.get_server(id).await?;
        let health = self
            .bounded("health", self.orchestrator.get_server_health(&server))
            .await?;
        repo.save_health(&health).await?;
        debug!(server_id = %id, status = %health.status, "Health recorded");
        Ok(health)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::adapter::outbound::memory::{
        MemoryHealthRepository, MemoryServerRepository, MemoryStatsRepository,
    };
    use crate::application::server::ServerService;
    use crate::domain::server::ServerType;
    use crate::domain::stats::{HealthStatus, Observation};
    use crate::domain::ServerId;
    use crate::error::ErrorKind;
    use crate::port::inbound::server::CreateServerRequest;
    use crate::testkit::orchestrator::ScriptedOrchestrator;

    fn bare() -> ServerService {
        ServerService::new(
            Arc::new(MemoryServerRepository::new()),
            Arc::new(ScriptedOrchestrator::new()),
        )
    }

    #[tokio::test]
    async fn unconfigured_stats_are_a_zero_placeholder() {
        let service = bare();
        let observed = service
            .get_server_stats(&ServerId::new("missing-id"))
            .await
            .unwrap();
        let Observation::Unconfigured(stats) = observed else {
            panic!("expected placeholder, got {observed:?}");
        };
        assert_eq!(stats.server_id.as_str(), "missing-id");
        assert!(stats.is_zero());
    }

    #[tokio::test]
    async fn unconfigured_health_is_unknown_placeholder() {
        let service = bare();
        let observed = service.get_server_health(&ServerId::new("x")).await.unwrap();
        assert!(observed.is_unconfigured());
        assert_eq!(observed.value().unwrap().status, HealthStatus::Unknown);
        assert!(service.get_all_servers_health().await.unwrap().is_unconfigured());
    }

    #[tokio::test]
    async fn configured_but_empty_is_distinct() {
        let service = bare()
            .with_stats_repo(Arc::new(MemoryStatsRepository::new()))
            .with_health_repo(Arc::new(MemoryHealthRepository::new()));
        let id = ServerId::new("x");
        assert_eq!(service.get_server_stats(&id).await.unwrap(), Observation::Empty);
        assert_eq!(service.get_server_health(&id).await.unwrap(), Observation::Empty);
        assert_eq!(
            service.get_all_servers_health().await.unwrap(),
            Observation::Empty
        );
    }

    #[tokio::test]
    async fn record_then_read_back() {
        let service = bare()
            .with_stats_repo(Arc::new(MemoryStatsRepository::new()))
            .with_health_repo(Arc::new(MemoryHealthRepository::new()));
        let server = service
            .create_server(CreateServerRequest::new("vpn-1", ServerType::Vpn, "us"))
            .await
            .unwrap();

        service.record_stats(server.id()).await.unwrap();
        service.record_health(server.id()).await.unwrap();

        assert!(matches!(
            service.get_server_stats(server.id()).await.unwrap(),
            Observation::Recorded(_)
        ));
        let Observation::Recorded(all) = service.get_all_servers_health().await.unwrap() else {
            panic!("expected recorded health");
        };
        assert_eq!(all.len(), 1);
        assert_eq!(service.get_stats_history(server.id(), 5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn recording_without_repository_is_unconfigured() {
        let service = bare();
        let err = service.record_stats(&ServerId::new("x")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unconfigured);
        assert_eq!(err.to_string(), "stats repository not initialized");
    }
}
