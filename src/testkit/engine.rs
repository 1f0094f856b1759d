//! In-memory [`ContainerEngine`].

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::adapter::outbound::docker::engine::{
    ContainerEngine, ContainerSample, ContainerSpec, ContainerState, ContainerSummary,
};
use crate::error::{Error, InfraError, Result};

#[derive(Debug, Clone)]
struct Container {
    spec: ContainerSpec,
    state: ContainerState,
    sample: Option<ContainerSample>,
    created: i64,
}

#[derive(Debug, Default)]
struct Engine {
    next_id: u32,
    containers: BTreeMap<String, Container>,
    failures: HashMap<&'static str, String>,
}

/// Container engine that keeps containers in a map.
///
/// Ids are `c0001`, `c0002`, ... in creation order. Failures are injected
/// per operation name (`create`, `start`, `stop`, `remove`, `list`,
/// `inspect`, `sample`) and persist until cleared.
#[derive(Debug, Default)]
pub struct FakeContainerEngine {
    inner: Mutex<Engine>,
}

impl FakeContainerEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, operation: &'static str, message: impl Into<String>) {
        self.inner.lock().failures.insert(operation, message.into());
    }

    pub fn clear_failures(&self) {
        self.inner.lock().failures.clear();
    }

    /// Specs of every existing container, in id order.
    #[must_use]
    pub fn specs(&self) -> Vec<ContainerSpec> {
        self.inner
            .lock()
            .containers
            .values()
            .map(|c| c.spec.clone())
            .collect()
    }

    /// Engine status of container `id`.
    #[must_use]
    pub fn status_of(&self, id: &str) -> Option<String> {
        self.inner
            .lock()
            .containers
            .get(id)
            .map(|c| c.state.status.clone())
    }

    pub fn set_health(&self, id: &str, verdict: &str) {
        if let Some(c) = self.inner.lock().containers.get_mut(id) {
            c.state.health = Some(verdict.to_string());
        }
    }

    pub fn set_sample(&self, id: &str, sample: ContainerSample) {
        if let Some(c) = self.inner.lock().containers.get_mut(id) {
            c.sample = Some(sample);
        }
    }

    /// Drop a container behind the orchestrator's back.
    pub fn vanish(&self, id: &str) {
        self.inner.lock().containers.remove(id);
    }

    fn check(engine: &Engine, operation: &'static str) -> Result<()> {
        match engine.failures.get(operation) {
            Some(message) => Err(InfraError::new("docker", operation, message.clone()).into()),
            None => Ok(()),
        }
    }

    fn with_container<T>(
        &self,
        operation: &'static str,
        id: &str,
        f: impl FnOnce(&mut Container) -> T,
    ) -> Result<T> {
        let mut engine = self.inner.lock();
        Self::check(&engine, operation)?;
        engine
            .containers
            .get_mut(id)
            .map(f)
            .ok_or_else(|| Error::not_found("container", id))
    }
}

#[async_trait]
impl ContainerEngine for FakeContainerEngine {
    async fn create(&self, spec: &ContainerSpec) -> Result<String> {
        let mut engine = self.inner.lock();
        Self::check(&engine, "create")?;
        if engine.containers.values().any(|c| c.spec.name == spec.name) {
            return Err(Error::Conflict(format!(
                "container name {} is already in use",
                spec.name
            )));
        }
        engine.next_id += 1;
        let id = format!("c{:04}", engine.next_id);
        let created = Utc::now().timestamp();
        engine.containers.insert(
            id.clone(),
            Container {
                spec: spec.clone(),
                state: ContainerState {
                    status: "created".into(),
                    ..ContainerState::default()
                },
                sample: None,
                created,
            },
        );
        Ok(id)
    }

    async fn start(&self, id: &str) -> Result<()> {
        self.with_container("start", id, |c| {
            c.state.status = "running".into();
            c.state.started_at = Some(Utc::now().to_rfc3339());
        })
    }

    async fn stop(&self, id: &str, _grace: Duration) -> Result<()> {
        self.with_container("stop", id, |c| c.state.status = "exited".into())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let mut engine = self.inner.lock();
        Self::check(&engine, "remove")?;
        engine
            .containers
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("container", id))
    }

    async fn list(&self, label: (&str, &str)) -> Result<Vec<ContainerSummary>> {
        let engine = self.inner.lock();
        Self::check(&engine, "list")?;
        Ok(engine
            .containers
            .iter()
            .filter(|(_, c)| c.spec.labels.get(label.0).map(String::as_str) == Some(label.1))
            .map(|(id, c)| ContainerSummary {
                id: id.clone(),
                names: vec![c.spec.name.clone()],
                state: c.state.status.clone(),
                labels: c.spec.labels.clone(),
                created: c.created,
            })
            .collect())
    }

    async fn inspect(&self, id: &str) -> Result<Option<ContainerState>> {
        let engine = self.inner.lock();
        Self::check(&engine, "inspect")?;
        Ok(engine.containers.get(id).map(|c| c.state.clone()))
    }

    async fn sample(&self, id: &str) -> Result<Option<ContainerSample>> {
        let engine = self.inner.lock();
        Self::check(&engine, "sample")?;
        Ok(engine.containers.get(id).and_then(|c| c.sample))
    }
}
