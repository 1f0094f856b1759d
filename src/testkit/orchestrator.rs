//! Scripted [`Orchestrator`] for service-level tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::journal::{Event, Journal};
use crate::domain::server::Server;
use crate::domain::stats::{HealthStatus, ServerHealth, ServerStats};
use crate::error::{Error, InfraError, Result};
use crate::port::outbound::orchestrator::{Orchestrator, ProvisionOptions};

pub const BACKEND: &str = "scripted";

/// Orchestrator operation, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Create,
    Start,
    Stop,
    Delete,
    Stats,
    Health,
    Scale,
    List,
}

impl Op {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Delete => "delete",
            Self::Stats => "stats",
            Self::Health => "health",
            Self::Scale => "scale",
            Self::List => "list",
        }
    }
}

/// One recorded call, keyed by server name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create(String),
    Start(String),
    Stop(String),
    Delete(String),
    Stats(String),
    Health(String),
    Scale(String, i32),
    List,
}

#[derive(Debug, Clone)]
enum Failure {
    Infra(String),
    NotFound,
}

/// In-memory orchestrator with injectable latency and failures.
///
/// Every call is recorded before the scripted latency elapses; the outcome
/// is decided after it, so a caller's timeout observes a call in flight.
#[derive(Default)]
pub struct ScriptedOrchestrator {
    calls: Mutex<Vec<Call>>,
    journal: Arc<Journal>,
    failures: Mutex<HashMap<Op, Failure>>,
    latency: Mutex<Duration>,
    listed: Mutex<Vec<Server>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a> {
    owner: &'a ScriptedOrchestrator,
    call: Call,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.owner.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.owner.journal.push(Event::End(self.call.clone()));
    }
}

impl ScriptedOrchestrator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every `op` call with an infra error carrying `message`.
    pub fn fail(&self, op: Op, message: impl Into<String>) {
        self.failures.lock().insert(op, Failure::Infra(message.into()));
    }

    /// Fail every `op` call with `NotFound`.
    pub fn fail_not_found(&self, op: Op) {
        self.failures.lock().insert(op, Failure::NotFound);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// Servers returned by `list_servers`.
    pub fn set_listed(&self, servers: Vec<Server>) {
        *self.listed.lock() = servers;
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Journal holding this backend's call events. Share it with a
    /// [`RecordingServerRepository`](super::journal::RecordingServerRepository)
    /// to interleave storage writes into the same log.
    #[must_use]
    pub fn journal(&self) -> Arc<Journal> {
        self.journal.clone()
    }

    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.journal.events()
    }

    /// Highest number of calls observed running at once.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn run(&self, op: Op, call: Call) -> Result<()> {
        self.calls.lock().push(call.clone());
        self.journal.push(Event::Begin(call.clone()));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight { owner: self, call };

        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let failure = self.failures.lock().get(&op).cloned();
        match failure {
            None => Ok(()),
            Some(Failure::Infra(message)) => Err(InfraError::new(BACKEND, op.as_str(), message).into()),
            Some(Failure::NotFound) => Err(Error::not_found("resource", op.as_str())),
        }
    }
}

#[async_trait]
impl Orchestrator for ScriptedOrchestrator {
    async fn create_server(&self, server: &Server, _options: &ProvisionOptions) -> Result<String> {
        self.run(Op::Create, Call::Create(server.name.clone())).await?;
        Ok(format!("ref-{}", server.name))
    }

    async fn start_server(&self, server: &Server) -> Result<()> {
        self.run(Op::Start, Call::Start(server.name.clone())).await
    }

    async fn stop_server(&self, server: &Server) -> Result<()> {
        self.run(Op::Stop, Call::Stop(server.name.clone())).await
    }

    async fn delete_server(&self, server: &Server) -> Result<()> {
        self.run(Op::Delete, Call::Delete(server.name.clone())).await
    }

    async fn get_server_stats(&self, server: &Server) -> Result<ServerStats> {
        self.run(Op::Stats, Call::Stats(server.name.clone())).await?;
        let mut stats = ServerStats::zero(server.id().clone());
        stats.cpu_usage = 12.5;
        stats.memory_usage = 40.0;
        Ok(stats)
    }

    async fn get_server_health(&self, server: &Server) -> Result<ServerHealth> {
        self.run(Op::Health, Call::Health(server.name.clone())).await?;
        Ok(ServerHealth::new(
            server.id().clone(),
            HealthStatus::Running,
            "scripted",
        ))
    }

    async fn scale_server(&self, server: &Server, replicas: i32) -> Result<()> {
        self.run(Op::Scale, Call::Scale(server.name.clone(), replicas))
            .await
    }

    async fn list_servers(&self) -> Result<Vec<Server>> {
        self.run(Op::List, Call::List).await?;
        Ok(self.listed.lock().clone())
    }

    fn name(&self) -> &'static str {
        BACKEND
    }
}
