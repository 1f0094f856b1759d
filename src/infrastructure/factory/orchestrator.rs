//! Orchestrator factory.
//!
//! The set of backends is closed, so selection yields a [`Backend`] enum that
//! implements [`Orchestrator`] by dispatch rather than a boxed trait object.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::adapter::outbound::docker::{BollardEngine, DockerOrchestrator};
use crate::adapter::outbound::image::ImageConfig;
use crate::adapter::outbound::kubernetes::{KubeClusterApi, KubernetesOrchestrator};
use crate::domain::server::Server;
use crate::domain::stats::{ServerHealth, ServerStats};
use crate::error::Result;
use crate::infrastructure::config::settings::{OrchestratorConfig, OrchestratorKind};
use crate::port::outbound::orchestrator::{Orchestrator, ProvisionOptions};

/// The configured backend.
pub enum Backend {
    Docker(DockerOrchestrator),
    Kubernetes(KubernetesOrchestrator),
}

impl Backend {
    fn inner(&self) -> &dyn Orchestrator {
        match self {
            Self::Docker(o) => o,
            Self::Kubernetes(o) => o,
        }
    }
}

#[async_trait]
impl Orchestrator for Backend {
    async fn create_server(&self, server: &Server, options: &ProvisionOptions) -> Result<String> {
        self.inner().create_server(server, options).await
    }

    async fn start_server(&self, server: &Server) -> Result<()> {
        self.inner().start_server(server).await
    }

    async fn stop_server(&self, server: &Server) -> Result<()> {
        self.inner().stop_server(server).await
    }

    async fn delete_server(&self, server: &Server) -> Result<()> {
        self.inner().delete_server(server).await
    }

    async fn get_server_stats(&self, server: &Server) -> Result<ServerStats> {
        self.inner().get_server_stats(server).await
    }

    async fn get_server_health(&self, server: &Server) -> Result<ServerHealth> {
        self.inner().get_server_health(server).await
    }

    async fn scale_server(&self, server: &Server, replicas: i32) -> Result<()> {
        self.inner().scale_server(server, replicas).await
    }

    async fn list_servers(&self) -> Result<Vec<Server>> {
        self.inner().list_servers().await
    }

    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn tracks_replicas(&self) -> bool {
        self.inner().tracks_replicas()
    }
}

/// Builds the backend selected by `[orchestrator] type`.
pub struct OrchestratorFactory;

impl OrchestratorFactory {
    /// Connect to the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnsupportedOrchestrator` for an unknown selector,
    /// or the backend's connection error.
    pub async fn create(config: &OrchestratorConfig, images: &ImageConfig) -> Result<Backend> {
        let backend = match config.backend()? {
            OrchestratorKind::Docker => {
                let engine = BollardEngine::connect(&config.docker)?;
                let orchestrator = DockerOrchestrator::new(Arc::new(engine), images.clone())
                    .with_stop_grace(Duration::from_secs(config.docker.stop_grace_secs));
                Backend::Docker(orchestrator)
            }
            OrchestratorKind::Kubernetes => {
                let api = KubeClusterApi::connect(&config.kubernetes).await?;
                Backend::Kubernetes(KubernetesOrchestrator::new(
                    Arc::new(api),
                    config.kubernetes.namespace.clone(),
                    images.clone(),
                ))
            }
        };
        info!(backend = backend.name(), "Orchestrator initialized");
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, Error};
    use crate::testkit::cluster::FakeClusterApi;
    use crate::testkit::engine::FakeContainerEngine;

    #[tokio::test]
    async fn unknown_kind_is_rejected_before_connecting() {
        let config = OrchestratorConfig {
            kind: "swarm".into(),
            ..OrchestratorConfig::default()
        };
        let err = OrchestratorFactory::create(&config, &ImageConfig::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            Error::Config(ConfigError::UnsupportedOrchestrator(ref t)) if t == "swarm"
        ));
    }

    #[tokio::test]
    async fn docker_backend_connects_lazily() {
        let backend = OrchestratorFactory::create(&OrchestratorConfig::default(), &ImageConfig::default())
            .await
            .unwrap();
        assert!(matches!(backend, Backend::Docker(_)));
        assert_eq!(backend.name(), "docker");
    }

    #[tokio::test]
    async fn unsupported_docker_scheme_is_a_config_error() {
        let mut config = OrchestratorConfig::default();
        config.docker.host = "ssh://box".into();
        let err = OrchestratorFactory::create(&config, &ImageConfig::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn variants_report_their_backend_name() {
        let docker = Backend::Docker(DockerOrchestrator::new(
            Arc::new(FakeContainerEngine::default()),
            ImageConfig::default(),
        ));
        let cluster = Backend::Kubernetes(KubernetesOrchestrator::new(
            Arc::new(FakeClusterApi::default()),
            "default",
            ImageConfig::default(),
        ));
        assert_eq!(docker.name(), "docker");
        assert_eq!(cluster.name(), "kubernetes");
    }
}
