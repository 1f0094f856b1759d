//! Seam between the cluster orchestrator and the Kubernetes API.
//!
//! All calls are scoped to one namespace chosen when the implementation is
//! built. Absent objects are reported through the return value, never as
//! errors, except for [`ClusterApi::scale_deployment`].

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Pod, Service};

use crate::error::Result;

#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn create_deployment(&self, deployment: &Deployment) -> Result<()>;

    async fn create_service(&self, service: &Service) -> Result<()>;

    async fn get_deployment(&self, name: &str) -> Result<Option<Deployment>>;

    /// Set desired replicas. Fails with `NotFound` when the Deployment is absent.
    async fn scale_deployment(&self, name: &str, replicas: i32) -> Result<()>;

    /// Returns `false` when there was nothing to delete.
    async fn delete_deployment(&self, name: &str) -> Result<bool>;

    /// Returns `false` when there was nothing to delete.
    async fn delete_service(&self, name: &str) -> Result<bool>;

    async fn list_deployments(&self, label_selector: &str) -> Result<Vec<Deployment>>;

    async fn list_pods(&self, label_selector: &str) -> Result<Vec<Pod>>;
}
