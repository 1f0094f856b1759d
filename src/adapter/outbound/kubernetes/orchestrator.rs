//! Declarative cluster backend.
//!
//! A server is a Deployment plus a LoadBalancer Service, both named after the
//! server. Start and stop scale the Deployment to one and zero replicas, so
//! "stopped" means zero replicas and "running" means at least one ready.
//!
//! A server without a persisted reference only owns the Deployment of its
//! name when that Deployment's `server-id` label names it.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::api::ClusterApi;
use super::resources::{build_deployment, build_service, derive_health, pod_selector, ReplicaCounts};
use super::BACKEND;
use crate::adapter::outbound::image::ImageConfig;
use crate::adapter::outbound::labels::{observed_server, Observed};
use crate::domain::error::DomainError;
use crate::domain::server::Server;
use crate::domain::stats::{ServerHealth, ServerStats};
use crate::error::{Error, Result};
use crate::port::outbound::orchestrator::{
    Orchestrator, ProvisionOptions, MANAGED_LABEL, SERVER_ID_LABEL,
};

/// [`Orchestrator`] over a [`ClusterApi`].
pub struct KubernetesOrchestrator {
    api: Arc<dyn ClusterApi>,
    namespace: String,
    images: ImageConfig,
}

impl KubernetesOrchestrator {
    pub fn new(api: Arc<dyn ClusterApi>, namespace: impl Into<String>, images: ImageConfig) -> Self {
        Self {
            api,
            namespace: namespace.into(),
            images,
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Workload name owned by `server`, if any.
    async fn workload(&self, server: &Server) -> Result<Option<String>> {
        if let Some(name) = &server.resource_ref {
            return Ok(Some(name.clone()));
        }
        let Some(deployment) = self.api.get_deployment(&server.name).await? else {
            return Ok(None);
        };
        let owner = deployment
            .metadata
            .labels
            .as_ref()
            .and_then(|labels| labels.get(SERVER_ID_LABEL));
        if owner.map(String::as_str) == Some(server.id().as_str()) {
            Ok(Some(server.name.clone()))
        } else {
            debug!(
                server_id = %server.id(),
                deployment = %server.name,
                owner = owner.map_or("", String::as_str),
                "Deployment belongs to another server"
            );
            Ok(None)
        }
    }

    async fn set_replicas(&self, server: &Server, replicas: i32) -> Result<()> {
        let name = self
            .workload(server)
            .await?
            .ok_or_else(|| Error::not_found("deployment", server.name.as_str()))?;
        self.api.scale_deployment(&name, replicas).await?;
        info!(server_id = %server.id(), deployment = %name, replicas, "Deployment scaled");
        Ok(())
    }
}

#[async_trait]
impl Orchestrator for KubernetesOrchestrator {
    async fn create_server(&self, server: &Server, options: &ProvisionOptions) -> Result<String> {
        let image = self.images.image_for(server.server_type);
        let deployment = build_deployment(server, image, &self.namespace, options);
        self.api.create_deployment(&deployment).await?;
        info!(server_id = %server.id(), deployment = %server.name, image, "Deployment created");

        let service = build_service(server, &self.namespace);
        self.api.create_service(&service).await?;
        info!(server_id = %server.id(), service = %server.name, "Service created");

        Ok(server.name.clone())
    }

    async fn start_server(&self, server: &Server) -> Result<()> {
        self.set_replicas(server, 1).await
    }

    async fn stop_server(&self, server: &Server) -> Result<()> {
        self.set_replicas(server, 0).await
    }

    async fn delete_server(&self, server: &Server) -> Result<()> {
        let Some(name) = self.workload(server).await? else {
            debug!(server_id = %server.id(), "No owned workload, nothing to delete");
            return Ok(());
        };
        let deployment = self.api.delete_deployment(&name).await;
        let service = self.api.delete_service(&name).await;

        match (&deployment, &service) {
            (Ok(d), Ok(s)) => {
                info!(server_id = %server.id(), deployment_removed = d, service_removed = s, "Workload deleted");
            }
            _ => {
                warn!(server_id = %server.id(), deployment = %name, "Workload deletion incomplete");
            }
        }
        deployment?;
        service?;
        Ok(())
    }

    async fn get_server_stats(&self, server: &Server) -> Result<ServerStats> {
        let stats = ServerStats::zero(server.id().clone());
        let present = match self.workload(server).await? {
            Some(name) => self.api.get_deployment(&name).await?.is_some(),
            None => false,
        };
        if !present {
            debug!(server_id = %server.id(), "No deployment, returning zero stats");
        }
        Ok(stats)
    }

    async fn get_server_health(&self, server: &Server) -> Result<ServerHealth> {
        let deployment = match self.workload(server).await? {
            Some(name) => self.api.get_deployment(&name).await?.map(|d| (name, d)),
            None => None,
        };
        let Some((name, deployment)) = deployment else {
            return Ok(ServerHealth::unknown(
                server.id().clone(),
                "deployment not found",
            ));
        };
        let pods = self.api.list_pods(&pod_selector(&name)).await?;

        let (status, message, checks) = derive_health(ReplicaCounts::of(&deployment), &pods);
        let mut health = ServerHealth::new(server.id().clone(), status, message);
        health.checks = checks;
        Ok(health)
    }

    async fn scale_server(&self, server: &Server, replicas: i32) -> Result<()> {
        if replicas < 0 {
            return Err(DomainError::NegativeReplicas { replicas }.into());
        }
        self.set_replicas(server, replicas).await
    }

    async fn list_servers(&self) -> Result<Vec<Server>> {
        let selector = format!("{}={}", MANAGED_LABEL.0, MANAGED_LABEL.1);
        let deployments = self.api.list_deployments(&selector).await?;

        Ok(deployments
            .iter()
            .filter_map(|d| {
                let name = d.metadata.name.clone()?;
                let labels: BTreeMap<String, String> = d.metadata.labels.clone().unwrap_or_default();
                let counts = ReplicaCounts::of(d);
                observed_server(Observed {
                    name: &name,
                    labels: &labels,
                    status: counts.server_status(),
                    resource_ref: name.clone(),
                    replicas: Some(counts.desired),
                    created_at: d.metadata.creation_timestamp.as_ref().map(|t| t.0),
                })
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        BACKEND
    }

    fn tracks_replicas(&self) -> bool {
        true
    }
}
