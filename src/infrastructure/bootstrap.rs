//! Composition root: configuration to a ready [`ServerService`].

use std::sync::Arc;

use tracing::{info, warn};

use super::config::settings::Config;
use super::factory::{build_repositories, OrchestratorFactory};
use crate::application::server::ServerService;
use crate::error::Result;
use crate::port::outbound::orchestrator::Orchestrator;

/// Build the service for `config` against the configured backend.
///
/// # Errors
///
/// Returns the factory's error if the backend or storage cannot be set up,
/// or a storage error from interrupted-operation recovery.
pub async fn build_service(config: &Config) -> Result<ServerService> {
    let orchestrator = OrchestratorFactory::create(&config.orchestrator, &config.images).await?;
    assemble(config, Arc::new(orchestrator)).await
}

/// Build the service for `config` around an already constructed backend.
///
/// Runs [`ServerService::recover_interrupted`] once before returning.
///
/// # Errors
///
/// Returns a storage error if repositories cannot be opened or recovery
/// fails.
pub async fn assemble(config: &Config, orchestrator: Arc<dyn Orchestrator>) -> Result<ServerService> {
    let repos = build_repositories(&config.storage)?;
    let service = ServerService::new(repos.servers, orchestrator)
        .with_settings(config.service.settings())
        .with_stats_repo(repos.stats)
        .with_health_repo(repos.health)
        .with_scaling_repo(repos.scaling)
        .with_backup_repo(repos.backups)
        .with_update_repo(repos.updates);

    let recovered = service.recover_interrupted().await?;
    if recovered > 0 {
        warn!(recovered, "Recovered servers from interrupted operations");
    }
    info!(backend = service.backend(), "Server service ready");
    Ok(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::server::{ServerStatus, ServerType};
    use crate::infrastructure::config::service::StorageBackend;
    use crate::testkit::domain::server;
    use crate::testkit::orchestrator::ScriptedOrchestrator;

    #[tokio::test]
    async fn assemble_recovers_interrupted_servers() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Sqlite;
        config.storage.path = dir.path().join("sm.db").to_string_lossy().into_owned();

        let stuck = server("vpn-1", ServerType::Vpn);
        build_repositories(&config.storage)
            .unwrap()
            .servers
            .create(&stuck)
            .await
            .unwrap();

        let service = assemble(&config, Arc::new(ScriptedOrchestrator::new()))
            .await
            .unwrap();
        let recovered = service.get_server(stuck.id()).await.unwrap();
        assert_eq!(recovered.status(), ServerStatus::Error);
        assert_eq!(service.backend(), "scripted");
    }
}
