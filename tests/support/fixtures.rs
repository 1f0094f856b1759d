//! Service wiring shared by the integration tests.

use std::sync::Arc;
use std::time::Duration;

use server_manager::adapter::outbound::docker::DockerOrchestrator;
use server_manager::adapter::outbound::image::ImageConfig;
use server_manager::adapter::outbound::kubernetes::KubernetesOrchestrator;
use server_manager::adapter::outbound::memory::{
    MemoryBackupRepository, MemoryHealthRepository, MemoryScalingRepository,
    MemoryServerRepository, MemoryStatsRepository, MemoryUpdateRepository,
};
use server_manager::application::server::{ServerService, ServiceSettings};
use server_manager::port::Orchestrator;
use server_manager::testkit::cluster::FakeClusterApi;
use server_manager::testkit::engine::FakeContainerEngine;
use server_manager::testkit::journal::RecordingServerRepository;
use server_manager::testkit::orchestrator::ScriptedOrchestrator;

/// Settings with no restart pause and a short backend deadline.
pub fn fast_settings() -> ServiceSettings {
    ServiceSettings {
        backend_timeout: Duration::from_secs(2),
        restart_settle: Duration::ZERO,
    }
}

/// Service with every repository held in memory.
pub fn service_with(
    orchestrator: Arc<dyn Orchestrator>,
) -> (ServerService, Arc<MemoryServerRepository>) {
    let servers = Arc::new(MemoryServerRepository::new());
    let service = ServerService::new(servers.clone(), orchestrator)
        .with_settings(fast_settings())
        .with_stats_repo(Arc::new(MemoryStatsRepository::new()))
        .with_health_repo(Arc::new(MemoryHealthRepository::new()))
        .with_scaling_repo(Arc::new(MemoryScalingRepository::new()))
        .with_backup_repo(Arc::new(MemoryBackupRepository::new()))
        .with_update_repo(Arc::new(MemoryUpdateRepository::new()));
    (service, servers)
}

pub fn scripted() -> (ServerService, Arc<ScriptedOrchestrator>, Arc<MemoryServerRepository>) {
    let orchestrator = Arc::new(ScriptedOrchestrator::new());
    let (service, servers) = service_with(orchestrator.clone());
    (service, orchestrator, servers)
}

/// Scripted backend whose journal also records every server write.
pub fn recorded() -> (ServerService, Arc<ScriptedOrchestrator>) {
    let orchestrator = Arc::new(ScriptedOrchestrator::new());
    let servers = RecordingServerRepository::new(
        Arc::new(MemoryServerRepository::new()),
        orchestrator.journal(),
    );
    let service = ServerService::new(Arc::new(servers), orchestrator.clone())
        .with_settings(fast_settings());
    (service, orchestrator)
}

pub fn docker() -> (ServerService, Arc<FakeContainerEngine>) {
    let engine = Arc::new(FakeContainerEngine::new());
    let orchestrator = DockerOrchestrator::new(engine.clone(), ImageConfig::default());
    let (service, _) = service_with(Arc::new(orchestrator));
    (service, engine)
}

pub fn kubernetes() -> (ServerService, Arc<FakeClusterApi>) {
    let api = Arc::new(FakeClusterApi::new());
    let orchestrator = KubernetesOrchestrator::new(api.clone(), "edge", ImageConfig::default());
    let (service, _) = service_with(Arc::new(orchestrator));
    (service, api)
}
