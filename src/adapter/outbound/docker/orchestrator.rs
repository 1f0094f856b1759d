//! Single-host container backend.
//!
//! Each server is one container named after the server. Lookups use the
//! persisted container id when the entity has one and fall back to a scan of
//! managed containers otherwise (a create that failed between create and
//! start). The scan only accepts a container whose `server-id` label names
//! the entity, so a same-named container owned by another server is never
//! touched.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use tracing::{debug, info, warn};

use super::engine::{ContainerEngine, ContainerSpec, ContainerState};
use super::BACKEND;
use crate::adapter::outbound::image::ImageConfig;
use crate::adapter::outbound::labels::{managed_labels, observed_server, workload_env, Observed};
use crate::domain::server::{Server, ServerStatus};
use crate::domain::stats::{HealthCheck, HealthStatus, ServerHealth, ServerStats};
use crate::error::{Error, Result};
use crate::port::outbound::orchestrator::{
    Orchestrator, ProvisionOptions, MANAGED_LABEL, SERVER_ID_LABEL,
};

const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(30);

/// [`Orchestrator`] over a [`ContainerEngine`].
pub struct DockerOrchestrator {
    engine: Arc<dyn ContainerEngine>,
    images: ImageConfig,
    stop_grace: Duration,
}

impl DockerOrchestrator {
    pub fn new(engine: Arc<dyn ContainerEngine>, images: ImageConfig) -> Self {
        Self {
            engine,
            images,
            stop_grace: DEFAULT_STOP_GRACE,
        }
    }

    #[must_use]
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    fn spec_for(&self, server: &Server, options: &ProvisionOptions) -> ContainerSpec {
        ContainerSpec {
            name: server.name.clone(),
            image: self.images.image_for(server.server_type).to_string(),
            env: workload_env(server, options)
                .into_iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect(),
            command: options.command.clone(),
            labels: managed_labels(server).into_iter().collect(),
        }
    }

    /// Container id for `server`, if one exists.
    async fn locate(&self, server: &Server) -> Result<Option<String>> {
        if let Some(id) = &server.resource_ref {
            return Ok(Some(id.clone()));
        }
        let containers = self.engine.list(MANAGED_LABEL).await?;
        Ok(containers
            .into_iter()
            .find(|c| {
                c.has_name(&server.name)
                    && c.labels.get(SERVER_ID_LABEL).map(String::as_str) == Some(server.id().as_str())
            })
            .map(|c| c.id))
    }

    async fn require(&self, server: &Server) -> Result<String> {
        self.locate(server)
            .await?
            .ok_or_else(|| Error::not_found("container", server.name.as_str()))
    }
}

/// Map engine state onto the health vocabulary.
fn classify(state: &ContainerState) -> HealthStatus {
    if !state.error.is_empty() {
        return HealthStatus::Error;
    }
    match state.status.as_str() {
        "running" => match state.health.as_deref() {
            Some("unhealthy") => HealthStatus::Error,
            Some("starting") => HealthStatus::Starting,
            _ => HealthStatus::Running,
        },
        "created" | "restarting" => HealthStatus::Starting,
        "exited" | "paused" | "removing" => HealthStatus::Stopped,
        "dead" => HealthStatus::Error,
        _ => HealthStatus::Unknown,
    }
}

fn status_from_state(state: &str) -> ServerStatus {
    match state {
        "running" => ServerStatus::Running,
        "created" | "restarting" => ServerStatus::Creating,
        "exited" | "paused" => ServerStatus::Stopped,
        _ => ServerStatus::Error,
    }
}

#[async_trait]
impl Orchestrator for DockerOrchestrator {
    async fn create_server(&self, server: &Server, options: &ProvisionOptions) -> Result<String> {
        let spec = self.spec_for(server, options);
        let id = self.engine.create(&spec).await?;
        info!(server_id = %server.id(), container_id = %id, image = %spec.image, "Container created");

        self.engine.start(&id).await?;
        info!(server_id = %server.id(), container_id = %id, "Container started");
        Ok(id)
    }

    async fn start_server(&self, server: &Server) -> Result<()> {
        let id = self.require(server).await?;
        self.engine.start(&id).await?;
        info!(server_id = %server.id(), container_id = %id, "Container started");
        Ok(())
    }

    async fn stop_server(&self, server: &Server) -> Result<()> {
        let id = self.require(server).await?;
        self.engine.stop(&id, self.stop_grace).await?;
        info!(server_id = %server.id(), container_id = %id, "Container stopped");
        Ok(())
    }

    async fn delete_server(&self, server: &Server) -> Result<()> {
        let id = self.require(server).await?;
        self.engine.remove(&id).await?;
        info!(server_id = %server.id(), container_id = %id, "Container removed");
        Ok(())
    }

    async fn get_server_stats(&self, server: &Server) -> Result<ServerStats> {
        let mut stats = ServerStats::zero(server.id().clone());
        let Some(id) = self.locate(server).await? else {
            debug!(server_id = %server.id(), "No container, returning zero stats");
            return Ok(stats);
        };

        match self.engine.sample(&id).await {
            Ok(Some(sample)) => {
                stats.cpu_usage = sample.cpu_percent;
                stats.memory_usage = sample.memory_percent;
                stats.network_in = sample.rx_bytes;
                stats.network_out = sample.tx_bytes;
            }
            Ok(None) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        Ok(stats)
    }

    async fn get_server_health(&self, server: &Server) -> Result<ServerHealth> {
        let Some(id) = self.locate(server).await? else {
            return Ok(ServerHealth::unknown(
                server.id().clone(),
                "container not found",
            ));
        };
        let Some(state) = self.engine.inspect(&id).await? else {
            return Ok(ServerHealth::unknown(
                server.id().clone(),
                "container not found",
            ));
        };

        let status = classify(&state);
        let message = if state.error.is_empty() {
            format!("container {}", state.status)
        } else {
            state.error.clone()
        };
        let mut health = ServerHealth::new(server.id().clone(), status, message).with_check(
            HealthCheck::new("container-state", state.status == "running", state.status.clone()),
        );
        if let Some(verdict) = &state.health {
            health = health.with_check(HealthCheck::new(
                "healthcheck",
                verdict == "healthy",
                verdict.clone(),
            ));
        }
        Ok(health)
    }

    async fn scale_server(&self, server: &Server, replicas: i32) -> Result<()> {
        warn!(server_id = %server.id(), replicas, "Scale requested on docker backend");
        Err(Error::Conflict(
            "scaling is not supported by the docker backend".into(),
        ))
    }

    async fn list_servers(&self) -> Result<Vec<Server>> {
        let containers = self.engine.list(MANAGED_LABEL).await?;
        Ok(containers
            .into_iter()
            .filter_map(|c| {
                let labels: BTreeMap<String, String> = c.labels.into_iter().collect();
                let name = c
                    .names
                    .first()
                    .cloned()
                    .or_else(|| labels.get("app").cloned())
                    .unwrap_or_default();
                observed_server(Observed {
                    name: &name,
                    labels: &labels,
                    status: status_from_state(&c.state),
                    resource_ref: c.id,
                    replicas: None,
                    created_at: DateTime::from_timestamp(c.created, 0),
                })
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        BACKEND
    }
}
