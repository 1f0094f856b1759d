//! Software update progress.

use std::sync::Arc;

use tracing::info;

use super::ServerService;
use crate::domain::id::ServerId;
use crate::domain::policy::{UpdateRequest, UpdateState, UpdateStatus};
use crate::domain::stats::Observation;
use crate::error::{Error, Result};
use crate::port::outbound::repository::UpdateRepository;

impl ServerService {
    fn update_repo(&self) -> Result<&Arc<dyn UpdateRepository>> {
        self.updates
            .as_ref()
            .ok_or(Error::Unconfigured("update repository"))
    }

    /// Current update record for a server.
    ///
    /// # Errors
    ///
    /// Returns `Unconfigured` without an update repository.
    pub async fn get_update_status(&self, server_id: &ServerId) -> Result<Observation<UpdateStatus>> {
        Ok(match self.update_repo()?.get_update_status(server_id).await? {
            Some(status) => Observation::Recorded(status),
            None => Observation::Empty,
        })
    }

    /// Record the start of an update. An update already in progress is only
    /// replaced when `request.force` is set.
    ///
    /// # Errors
    ///
    /// Returns `Unconfigured`, `NotFound` for the server, or `Conflict`.
    pub async fn start_update(&self, request: UpdateRequest) -> Result<UpdateStatus> {
        let repo = self.update_repo()?;
        self.get_server(&request.server_id).await?;

        if let Some(current) = repo.get_update_status(&request.server_id).await? {
            if !current.state.is_terminal() && !request.force {
                return Err(Error::Conflict(format!(
                    "update to {} already in progress for server {}",
                    current.version, request.server_id
                )));
            }
        }

        let status = UpdateStatus::started(&request);
        repo.save_update_status(&status).await?;
        info!(server_id = %request.server_id, version = %request.version, force = request.force, "Update started");
        Ok(status)
    }

    /// # Errors
    ///
    /// Returns `Unconfigured` or `NotFound`.
    pub async fn report_update_progress(
        &self,
        server_id: &ServerId,
        progress: u8,
        message: &str,
    ) -> Result<()> {
        self.update_repo()?
            .update_progress(server_id, progress, message)
            .await
    }

    /// # Errors
    ///
    /// Returns `Unconfigured` or `NotFound`.
    pub async fn complete_update(&self, server_id: &ServerId, success: bool, message: &str) -> Result<()> {
        self.update_repo()?
            .complete_update(server_id, success, message)
            .await?;
        info!(server_id = %server_id, success, "Update finished");
        Ok(())
    }

    /// Close an in-progress update as cancelled.
    ///
    /// # Errors
    ///
    /// Returns `Unconfigured`, `NotFound`, or `Conflict` if the update has
    /// already finished.
    pub async fn cancel_update(&self, server_id: &ServerId) -> Result<UpdateStatus> {
        let repo = self.update_repo()?;
        let mut status = repo
            .get_update_status(server_id)
            .await?
            .ok_or_else(|| Error::not_found("update", server_id.as_str()))?;
        if status.state.is_terminal() {
            return Err(Error::Conflict(format!(
                "update for server {server_id} already {}",
                status.state
            )));
        }
        status.finish(UpdateState::Cancelled, "cancelled by operator");
        repo.save_update_status(&status).await?;
        info!(server_id = %server_id, version = %status.version, "Update cancelled");
        Ok(status)
    }
}
