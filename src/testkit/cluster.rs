//! In-memory [`ClusterApi`].

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentStatus};
use k8s_openapi::api::core::v1::{Pod, PodStatus, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use parking_lot::Mutex;

use crate::adapter::outbound::kubernetes::api::ClusterApi;
use crate::error::{Error, InfraError, Result};

#[derive(Debug, Default)]
struct Namespace {
    deployments: BTreeMap<String, Deployment>,
    services: BTreeMap<String, Service>,
    failed_pods: BTreeMap<String, String>,
    failures: HashMap<&'static str, String>,
    ready_on_scale: bool,
}

/// One namespace held in memory.
///
/// Scaling a Deployment immediately marks that many replicas ready unless
/// [`FakeClusterApi::hold_readiness`] was called. Each Deployment reports
/// one pod per ready replica, in phase `Running` unless a failure was
/// injected with [`FakeClusterApi::fail_pod`].
#[derive(Debug)]
pub struct FakeClusterApi {
    inner: Mutex<Namespace>,
}

impl Default for FakeClusterApi {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Namespace {
                ready_on_scale: true,
                ..Namespace::default()
            }),
        }
    }
}

fn label_matches(meta: &ObjectMeta, selector: &str) -> bool {
    let labels = meta.labels.clone().unwrap_or_default();
    selector.split(',').filter(|s| !s.is_empty()).all(|term| {
        term.split_once('=')
            .is_some_and(|(k, v)| labels.get(k).map(String::as_str) == Some(v))
    })
}

fn set_ready(deployment: &mut Deployment, ready: i32) {
    let status = deployment.status.get_or_insert_with(DeploymentStatus::default);
    status.replicas = Some(ready);
    status.ready_replicas = Some(ready);
    status.available_replicas = Some(ready);
}

impl FakeClusterApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave ready counts untouched when Deployments are created or scaled.
    pub fn hold_readiness(&self) {
        self.inner.lock().ready_on_scale = false;
    }

    /// Make the pods of Deployment `name` report phase `Failed`.
    pub fn fail_pod(&self, name: &str, reason: &str) {
        self.inner
            .lock()
            .failed_pods
            .insert(name.to_string(), reason.to_string());
    }

    /// Fail every call of `operation` (`create_deployment`, `create_service`,
    /// `get_deployment`, `scale_deployment`, `delete_deployment`,
    /// `delete_service`, `list_deployments`, `list_pods`).
    pub fn fail(&self, operation: &'static str, message: impl Into<String>) {
        self.inner.lock().failures.insert(operation, message.into());
    }

    #[must_use]
    pub fn deployment(&self, name: &str) -> Option<Deployment> {
        self.inner.lock().deployments.get(name).cloned()
    }

    #[must_use]
    pub fn service(&self, name: &str) -> Option<Service> {
        self.inner.lock().services.get(name).cloned()
    }

    /// Desired replicas of Deployment `name`.
    #[must_use]
    pub fn replicas(&self, name: &str) -> Option<i32> {
        self.deployment(name)
            .and_then(|d| d.spec)
            .and_then(|s| s.replicas)
    }

    fn check(ns: &Namespace, operation: &'static str) -> Result<()> {
        match ns.failures.get(operation) {
            Some(message) => Err(InfraError::new("kubernetes", operation, message.clone()).into()),
            None => Ok(()),
        }
    }

    fn key(meta: &ObjectMeta) -> Result<String> {
        meta.name
            .clone()
            .ok_or_else(|| Error::Conflict("object has no name".into()))
    }
}

#[async_trait]
impl ClusterApi for FakeClusterApi {
    async fn create_deployment(&self, deployment: &Deployment) -> Result<()> {
        let mut ns = self.inner.lock();
        Self::check(&ns, "create_deployment")?;
        let name = Self::key(&deployment.metadata)?;
        if ns.deployments.contains_key(&name) {
            return Err(Error::Conflict(format!("deployment {name} already exists")));
        }
        let mut stored = deployment.clone();
        if ns.ready_on_scale {
            let desired = stored.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1);
            set_ready(&mut stored, desired);
        }
        ns.deployments.insert(name, stored);
        Ok(())
    }

    async fn create_service(&self, service: &Service) -> Result<()> {
        let mut ns = self.inner.lock();
        Self::check(&ns, "create_service")?;
        let name = Self::key(&service.metadata)?;
        if ns.services.contains_key(&name) {
            return Err(Error::Conflict(format!("service {name} already exists")));
        }
        ns.services.insert(name, service.clone());
        Ok(())
    }

    async fn get_deployment(&self, name: &str) -> Result<Option<Deployment>> {
        let ns = self.inner.lock();
        Self::check(&ns, "get_deployment")?;
        Ok(ns.deployments.get(name).cloned())
    }

    async fn scale_deployment(&self, name: &str, replicas: i32) -> Result<()> {
        let mut ns = self.inner.lock();
        Self::check(&ns, "scale_deployment")?;
        let ready_on_scale = ns.ready_on_scale;
        let deployment = ns
            .deployments
            .get_mut(name)
            .ok_or_else(|| Error::not_found("deployment", name))?;
        deployment.spec.get_or_insert_with(Default::default).replicas = Some(replicas);
        if ready_on_scale {
            set_ready(deployment, replicas);
        }
        Ok(())
    }

    async fn delete_deployment(&self, name: &str) -> Result<bool> {
        let mut ns = self.inner.lock();
        Self::check(&ns, "delete_deployment")?;
        Ok(ns.deployments.remove(name).is_some())
    }

    async fn delete_service(&self, name: &str) -> Result<bool> {
        let mut ns = self.inner.lock();
        Self::check(&ns, "delete_service")?;
        Ok(ns.services.remove(name).is_some())
    }

    async fn list_deployments(&self, label_selector: &str) -> Result<Vec<Deployment>> {
        let ns = self.inner.lock();
        Self::check(&ns, "list_deployments")?;
        Ok(ns
            .deployments
            .values()
            .filter(|d| label_matches(&d.metadata, label_selector))
            .cloned()
            .collect())
    }

    async fn list_pods(&self, label_selector: &str) -> Result<Vec<Pod>> {
        let ns = self.inner.lock();
        Self::check(&ns, "list_pods")?;
        let mut pods = Vec::new();
        for (name, deployment) in &ns.deployments {
            let template_labels = deployment
                .spec
                .as_ref()
                .and_then(|s| s.template.metadata.clone())
                .unwrap_or_default();
            if !label_matches(&template_labels, label_selector) {
                continue;
            }
            let ready = deployment
                .status
                .as_ref()
                .and_then(|s| s.ready_replicas)
                .unwrap_or(0);
            let failed = ns.failed_pods.get(name);
            for i in 0..ready.max(i32::from(failed.is_some())) {
                pods.push(Pod {
                    metadata: ObjectMeta {
                        name: Some(format!("{name}-{i}")),
                        labels: template_labels.labels.clone(),
                        ..ObjectMeta::default()
                    },
                    spec: None,
                    status: Some(PodStatus {
                        phase: Some(if failed.is_some() { "Failed" } else { "Running" }.into()),
                        reason: failed.cloned(),
                        ..PodStatus::default()
                    }),
                });
            }
        }
        Ok(pods)
    }
}
