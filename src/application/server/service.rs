use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::ServiceSettings;
use crate::domain::error::DomainError;
use crate::domain::id::ServerId;
use crate::domain::server::{Server, ServerStatus};
use crate::error::{Error, InfraError, Result};
use crate::port::inbound::server::{CreateServerRequest, UpdateServerRequest};
use crate::port::outbound::orchestrator::Orchestrator;
use crate::port::outbound::repository::{
    BackupRepository, HealthRepository, ScalingRepository, ServerFilter, ServerRepository,
    StatsRepository, UpdateRepository,
};

/// Coordinates persisted servers with the single active orchestrator.
///
/// Create, update, delete, start, stop and scale hold `lifecycle` for their
/// whole persistence-plus-backend sequence, so mutations observe one total
/// order regardless of which server they target.
pub struct ServerService {
    pub(super) servers: Arc<dyn ServerRepository>,
    pub(super) orchestrator: Arc<dyn Orchestrator>,
    pub(super) stats: Option<Arc<dyn StatsRepository>>,
    pub(super) health: Option<Arc<dyn HealthRepository>>,
    pub(super) scaling: Option<Arc<dyn ScalingRepository>>,
    pub(super) backups: Option<Arc<dyn BackupRepository>>,
    pub(super) updates: Option<Arc<dyn UpdateRepository>>,
    pub(super) settings: ServiceSettings,
    lifecycle: Mutex<()>,
}

impl ServerService {
    pub fn new(servers: Arc<dyn ServerRepository>, orchestrator: Arc<dyn Orchestrator>) -> Self {
        Self {
            servers,
            orchestrator,
            stats: None,
            health: None,
            scaling: None,
            backups: None,
            updates: None,
            settings: ServiceSettings::default(),
            lifecycle: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ServiceSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_stats_repo(mut self, repo: Arc<dyn StatsRepository>) -> Self {
        self.stats = Some(repo);
        self
    }

    #[must_use]
    pub fn with_health_repo(mut self, repo: Arc<dyn HealthRepository>) -> Self {
        self.health = Some(repo);
        self
    }

    #[must_use]
    pub fn with_scaling_repo(mut self, repo: Arc<dyn ScalingRepository>) -> Self {
        self.scaling = Some(repo);
        self
    }

    #[must_use]
    pub fn with_backup_repo(mut self, repo: Arc<dyn BackupRepository>) -> Self {
        self.backups = Some(repo);
        self
    }

    #[must_use]
    pub fn with_update_repo(mut self, repo: Arc<dyn UpdateRepository>) -> Self {
        self.updates = Some(repo);
        self
    }

    #[must_use]
    pub fn settings(&self) -> ServiceSettings {
        self.settings
    }

    /// Name of the active backend.
    #[must_use]
    pub fn backend(&self) -> &'static str {
        self.orchestrator.name()
    }

    /// Provision a new server.
    ///
    /// The entity is persisted in `creating` before the backend is called.
    /// A backend failure leaves it persisted in `error` and returns the
    /// backend's error.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input, `Conflict` when an active
    /// server already has the name, or the backend or storage failure.
    pub async fn create_server(&self, request: CreateServerRequest) -> Result<Server> {
        request.validate()?;
        let mut server = Server::new(request.name, request.server_type, request.region)?;

        let _guard = self.lifecycle.lock().await;
        self.ensure_name_free(&server.name, None).await?;
        self.servers.create(&server).await?;
        info!(
            server_id = %server.id(),
            name = %server.name,
            server_type = %server.server_type,
            region = %server.region,
            "Server registered"
        );

        let provisioned = self
            .bounded(
                "create",
                self.orchestrator.create_server(&server, &request.options),
            )
            .await;

        match provisioned {
            Ok(resource_ref) => {
                server.resource_ref = Some(resource_ref);
                if self.orchestrator.tracks_replicas() {
                    server.replicas = Some(1);
                }
                server.transition(ServerStatus::Running)?;
                self.servers.update(&server).await?;
                info!(
                    server_id = %server.id(),
                    backend = self.backend(),
                    resource = server.resource_ref.as_deref().unwrap_or_default(),
                    "Server provisioned"
                );
                Ok(server)
            }
            Err(e) => {
                warn!(server_id = %server.id(), backend = self.backend(), error = %e, "Provisioning failed");
                self.mark_error(&mut server).await;
                Err(e)
            }
        }
    }

    /// Fetch an active server.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the server does not exist or is deleted.
    pub async fn get_server(&self, id: &ServerId) -> Result<Server> {
        self.servers
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("server", id.as_str()))
    }

    /// Active servers matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the repository fails.
    pub async fn list_servers(&self, filter: &ServerFilter) -> Result<Vec<Server>> {
        self.servers.list(filter).await
    }

    /// Patch persisted fields. Backend resources keep their original names.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, a validation error for an invalid name, or
    /// `Conflict` when another active server has the name.
    pub async fn update_server(&self, id: &ServerId, patch: UpdateServerRequest) -> Result<Server> {
        let _guard = self.lifecycle.lock().await;
        let mut server = self.get_server(id).await?;
        if let Some(name) = patch.name {
            self.ensure_name_free(&name, Some(id)).await?;
            server.rename(name)?;
        }
        self.servers.update(&server).await?;
        debug!(server_id = %id, name = %server.name, "Server updated");
        Ok(server)
    }

    /// Tear down backend resources, then tombstone the server.
    ///
    /// A backend `NotFound` counts as already torn down. Any other backend
    /// failure leaves the server in `error` and is returned.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, the backend failure, or a storage error.
    pub async fn delete_server(&self, id: &ServerId) -> Result<()> {
        let _guard = self.lifecycle.lock().await;
        let mut server = self.get_server(id).await?;

        if server.status() != ServerStatus::Deleting {
            server.transition(ServerStatus::Deleting)?;
            self.servers.update(&server).await?;
        }

        match self
            .bounded("delete", self.orchestrator.delete_server(&server))
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!(server_id = %id, "Backend resources already absent");
            }
            Err(e) => {
                warn!(server_id = %id, backend = self.backend(), error = %e, "Teardown failed");
                self.mark_error(&mut server).await;
                return Err(e);
            }
        }

        self.servers.delete(id).await?;
        info!(server_id = %id, name = %server.name, "Server deleted");
        Ok(())
    }

    /// Start a stopped server.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the server is already running or cannot start
    /// from its current status, or the backend failure.
    pub async fn start_server(&self, id: &ServerId) -> Result<Server> {
        let _guard = self.lifecycle.lock().await;
        self.switch(id, ServerStatus::Running).await
    }

    /// Stop a running server.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the server is already stopped or cannot stop
    /// from its current status, or the backend failure.
    pub async fn stop_server(&self, id: &ServerId) -> Result<Server> {
        let _guard = self.lifecycle.lock().await;
        self.switch(id, ServerStatus::Stopped).await
    }

    /// Stop, wait for the settle delay, then start. A failed stop skips the
    /// start.
    ///
    /// # Errors
    ///
    /// Returns the first failing half.
    pub async fn restart_server(&self, id: &ServerId) -> Result<Server> {
        self.stop_server(id).await?;
        tokio::time::sleep(self.settings.restart_settle).await;
        self.start_server(id).await
    }

    /// Set the desired replica count of a running server on the backend.
    /// Zero is refused: stopping is what runs no replicas.
    ///
    /// # Errors
    ///
    /// Returns a validation error for counts below one, `NotFound`,
    /// `Conflict` unless the server is running, or the backend failure (the
    /// container backend always refuses).
    pub async fn scale_server(&self, id: &ServerId, replicas: i32) -> Result<Server> {
        if replicas < 0 {
            return Err(DomainError::NegativeReplicas { replicas }.into());
        }
        if replicas == 0 {
            return Err(DomainError::ScaleToZero.into());
        }
        let _guard = self.lifecycle.lock().await;
        let mut server = self.get_server(id).await?;
        if server.status() != ServerStatus::Running {
            return Err(Error::Conflict(format!(
                "server {id} must be running to scale, it is {}",
                server.status()
            )));
        }

        self.bounded("scale", self.orchestrator.scale_server(&server, replicas))
            .await?;
        server.replicas = Some(replicas);
        server.touch();
        self.servers.update(&server).await?;
        info!(server_id = %id, replicas, "Server scaled");
        Ok(server)
    }

    /// Move servers left in `creating` or `deleting` by an interrupted
    /// process to `error`. Returns how many were moved.
    ///
    /// # Errors
    ///
    /// Returns a storage error if listing or updating fails.
    pub async fn recover_interrupted(&self) -> Result<usize> {
        let _guard = self.lifecycle.lock().await;
        let mut recovered = 0;
        for status in [ServerStatus::Creating, ServerStatus::Deleting] {
            for mut server in self.servers.get_by_status(status).await? {
                server.transition(ServerStatus::Error)?;
                self.servers.update(&server).await?;
                warn!(server_id = %server.id(), from = %status, "Interrupted operation marked as error");
                recovered += 1;
            }
        }
        Ok(recovered)
    }

    async fn switch(&self, id: &ServerId, target: ServerStatus) -> Result<Server> {
        let mut server = self.get_server(id).await?;
        let current = server.status();
        if current == target {
            return Err(Error::Conflict(format!("server {id} is already {target}")));
        }
        if !current.can_transition_to(target) {
            return Err(DomainError::InvalidTransition {
                from: current,
                to: target,
            }
            .into());
        }

        match target {
            ServerStatus::Running => {
                self.bounded("start", self.orchestrator.start_server(&server))
                    .await?;
            }
            _ => {
                self.bounded("stop", self.orchestrator.stop_server(&server))
                    .await?;
            }
        }

        server.transition(target)?;
        if self.orchestrator.tracks_replicas() {
            server.replicas = Some(i32::from(target == ServerStatus::Running));
        }
        self.servers.update(&server).await?;
        info!(server_id = %id, from = %current, to = %target, "Server status changed");
        Ok(server)
    }

    async fn ensure_name_free(&self, name: &str, owner: Option<&ServerId>) -> Result<()> {
        match self.servers.find_by_name(name).await? {
            Some(existing) if Some(existing.id()) != owner => Err(Error::Conflict(format!(
                "server name {name} is already used by {}",
                existing.id()
            ))),
            _ => Ok(()),
        }
    }

    /// Best-effort move to `error`; failures are only logged.
    async fn mark_error(&self, server: &mut Server) {
        if let Err(e) = server.transition(ServerStatus::Error) {
            error!(server_id = %server.id(), error = %e, "Cannot mark server as error");
            return;
        }
        if let Err(e) = self.servers.update(server).await {
            error!(server_id = %server.id(), error = %e, "Failed to persist error status");
        }
    }

    /// Run a backend call under the configured deadline.
    pub(super) async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let deadline = self.settings.backend_timeout;
        match tokio::time::timeout(deadline, call).await {
            Ok(result) => result,
            Err(_) => {
                let err = InfraError::timed_out(self.backend(), operation, deadline);
                warn!(backend = self.backend(), operation, "Backend call timed out");
                Err(err.into())
            }
        }
    }
}
