//! [`ClusterApi`] backed by `kube`.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Pod, Service};
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use serde_json::json;
use tracing::debug;

use super::api::ClusterApi;
use super::settings::KubernetesConfig;
use super::BACKEND;
use crate::error::{Error, InfraError, Result};

/// Namespaced Kubernetes client.
pub struct KubeClusterApi {
    deployments: Api<Deployment>,
    services: Api<Service>,
    pods: Api<Pod>,
}

impl KubeClusterApi {
    #[must_use]
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            deployments: Api::namespaced(client.clone(), namespace),
            services: Api::namespaced(client.clone(), namespace),
            pods: Api::namespaced(client, namespace),
        }
    }

    /// Build a client from the configured kubeconfig, or infer one.
    ///
    /// # Errors
    ///
    /// Returns an infra error if no usable cluster configuration is found.
    pub async fn connect(config: &KubernetesConfig) -> Result<Self> {
        let kube_config = match &config.kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path)
                    .map_err(|e| InfraError::wrap(BACKEND, "read kubeconfig", e))?;
                kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .map_err(|e| InfraError::wrap(BACKEND, "load kubeconfig", e))?
            }
            None => kube::Config::infer()
                .await
                .map_err(|e| InfraError::wrap(BACKEND, "infer config", e))?,
        };
        let client =
            Client::try_from(kube_config).map_err(|e| InfraError::wrap(BACKEND, "connect", e))?;

        debug!(namespace = %config.namespace, "Kubernetes client configured");
        Ok(Self::new(client, &config.namespace))
    }
}

fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(response) if response.code == 404)
}

fn is_already_exists(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(response) if response.code == 409)
}

/// Map a create failure, reporting an existing object as a conflict.
fn create_err(operation: &'static str, kind: &str, name: &str, err: kube::Error) -> Error {
    if is_already_exists(&err) {
        Error::Conflict(format!("{kind} {name} already exists"))
    } else {
        wrap(operation, err)
    }
}

fn wrap(operation: &'static str, err: kube::Error) -> Error {
    InfraError::wrap(BACKEND, operation, err).into()
}

#[async_trait]
impl ClusterApi for KubeClusterApi {
    async fn create_deployment(&self, deployment: &Deployment) -> Result<()> {
        let name = deployment.metadata.name.as_deref().unwrap_or_default();
        self.deployments
            .create(&PostParams::default(), deployment)
            .await
            .map(|_| ())
            .map_err(|e| create_err("create deployment", "deployment", name, e))
    }

    async fn create_service(&self, service: &Service) -> Result<()> {
        let name = service.metadata.name.as_deref().unwrap_or_default();
        self.services
            .create(&PostParams::default(), service)
            .await
            .map(|_| ())
            .map_err(|e| create_err("create service", "service", name, e))
    }

    async fn get_deployment(&self, name: &str) -> Result<Option<Deployment>> {
        self.deployments
            .get_opt(name)
            .await
            .map_err(|e| wrap("get deployment", e))
    }

    async fn scale_deployment(&self, name: &str, replicas: i32) -> Result<()> {
        let patch = json!({ "spec": { "replicas": replicas } });
        match self
            .deployments
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => Err(Error::not_found("deployment", name)),
            Err(e) => Err(wrap("scale deployment", e)),
        }
    }

    async fn delete_deployment(&self, name: &str) -> Result<bool> {
        match self.deployments.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(wrap("delete deployment", e)),
        }
    }

    async fn delete_service(&self, name: &str) -> Result<bool> {
        match self.services.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(wrap("delete service", e)),
        }
    }

    async fn list_deployments(&self, label_selector: &str) -> Result<Vec<Deployment>> {
        let params = ListParams::default().labels(label_selector);
        self.deployments
            .list(&params)
            .await
            .map(|list| list.items)
            .map_err(|e| wrap("list deployments", e))
    }

    async fn list_pods(&self, label_selector: &str) -> Result<Vec<Pod>> {
        let params = ListParams::default().labels(label_selector);
        self.pods
            .list(&params)
            .await
            .map(|list| list.items)
            .map_err(|e| wrap("list pods", e))
    }
}

#[cfg(test)]
mod tests {
    use kube::error::ErrorResponse;

    use super::*;
    use crate::error::ErrorKind;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".into(),
            message: format!("{reason} from the API server"),
            reason: reason.into(),
            code,
        })
    }

    #[test]
    fn existing_object_on_create_is_a_conflict() {
        let err = create_err("create deployment", "deployment", "gw-1", api_error(409, "AlreadyExists"));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.to_string().contains("deployment gw-1 already exists"));
    }

    #[test]
    fn other_create_failures_are_infra() {
        let err = create_err("create service", "service", "gw-1", api_error(403, "Forbidden"));
        assert_eq!(err.kind(), ErrorKind::Infra);
        assert!(!is_not_found(&api_error(403, "Forbidden")));
        assert!(is_not_found(&api_error(404, "NotFound")));
    }
}
