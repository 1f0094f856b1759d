//! Seam between the container orchestrator and the engine client.
//!
//! [`DockerOrchestrator`](super::DockerOrchestrator) speaks only this trait,
//! so the lifecycle logic can be exercised against an in-memory engine.
//! Engines report a missing container as `Error::NotFound`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Everything needed to create one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    /// `KEY=value` pairs.
    pub env: Vec<String>,
    pub command: Option<Vec<String>>,
    pub labels: HashMap<String, String>,
}

/// One entry of a container listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    pub id: String,
    /// Names without the engine's leading `/`.
    pub names: Vec<String>,
    /// Engine state string (`running`, `exited`, ...).
    pub state: String,
    pub labels: HashMap<String, String>,
    /// Creation time, seconds since the epoch.
    pub created: i64,
}

impl ContainerSummary {
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

/// Runtime state reported by inspect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerState {
    /// `created`, `running`, `paused`, `restarting`, `removing`, `exited`, `dead`.
    pub status: String,
    /// Engine health-check verdict, when the image defines one.
    pub health: Option<String>,
    /// Last runtime error, empty when none.
    pub error: String,
    /// Start time in RFC 3339, when known.
    pub started_at: Option<String>,
}

/// One decoded stats sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContainerSample {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Container engine operations used by the orchestrator.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Create a container and return its id. Does not start it.
    async fn create(&self, spec: &ContainerSpec) -> Result<String>;

    async fn start(&self, id: &str) -> Result<()>;

    async fn stop(&self, id: &str, grace: Duration) -> Result<()>;

    /// Force-remove a container.
    async fn remove(&self, id: &str) -> Result<()>;

    /// All containers, running or not, carrying label `key=value`.
    async fn list(&self, label: (&str, &str)) -> Result<Vec<ContainerSummary>>;

    /// `None` when the container does not exist.
    async fn inspect(&self, id: &str) -> Result<Option<ContainerState>>;

    /// One stats sample. `None` when the container does not exist or the
    /// engine returned nothing usable.
    async fn sample(&self, id: &str) -> Result<Option<ContainerSample>>;
}
