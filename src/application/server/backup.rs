//! Backup configs and backup records.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::ServerService;
use crate::domain::id::{RecordId, ServerId};
use crate::domain::policy::{Backup, BackupConfig, BackupStatus};
use crate::error::{Error, Result};
use crate::port::outbound::repository::BackupRepository;

impl ServerService {
    fn backup_repo(&self) -> Result<&Arc<dyn BackupRepository>> {
        self.backups
            .as_ref()
            .ok_or(Error::Unconfigured("backup repository"))
    }

    /// # Errors
    ///
    /// Returns `Unconfigured` without a backup repository.
    pub async fn list_backup_configs(&self) -> Result<Vec<BackupConfig>> {
        self.backup_repo()?.list_configs().await
    }

    /// Store a backup schedule for an existing server.
    ///
    /// # Errors
    ///
    /// Returns `Unconfigured`, a validation error, or `NotFound` for the server.
    pub async fn create_backup_config(&self, config: BackupConfig) -> Result<BackupConfig> {
        let repo = self.backup_repo()?;
        config.validate()?;
        self.get_server(&config.server_id).await?;
        repo.save_config(&config).await?;
        info!(config_id = %config.id, server_id = %config.server_id, schedule = %config.schedule, "Backup config created");
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `Unconfigured`, a validation error, or `NotFound`.
    pub async fn update_backup_config(&self, config: BackupConfig) -> Result<BackupConfig> {
        let repo = self.backup_repo()?;
        config.validate()?;
        repo.update_config(&config).await?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `Unconfigured` or `NotFound`.
    pub async fn delete_backup_config(&self, id: &RecordId) -> Result<()> {
        self.backup_repo()?.delete_config(id).await
    }

    /// Record a pending backup of an existing server.
    ///
    /// # Errors
    ///
    /// Returns `Unconfigured`, `NotFound` for the server or config, or
    /// `Conflict` when the config belongs to another server.
    pub async fn create_backup(
        &self,
        server_id: &ServerId,
        config_id: Option<RecordId>,
    ) -> Result<Backup> {
        let repo = self.backup_repo()?;
        self.get_server(server_id).await?;
        if let Some(config_id) = &config_id {
            let config = repo
                .get_config(config_id)
                .await?
                .ok_or_else(|| Error::not_found("backup config", config_id.as_str()))?;
            if &config.server_id != server_id {
                return Err(Error::Conflict(format!(
                    "backup config {config_id} belongs to server {}",
                    config.server_id
                )));
            }
        }

        let backup = Backup::pending(server_id.clone(), config_id);
        repo.save_backup(&backup).await?;
        info!(backup_id = %backup.id, server_id = %server_id, "Backup requested");
        Ok(backup)
    }

    /// Mark one of the server's completed backups as restoring.
    ///
    /// # Errors
    ///
    /// Returns `Unconfigured`, `NotFound` when the backup is not one of the
    /// server's, or `Conflict` when it never completed.
    pub async fn restore_backup(&self, server_id: &ServerId, backup_id: &RecordId) -> Result<Backup> {
        let repo = self.backup_repo()?;
        let mut backup = repo
            .get_backups(server_id)
            .await?
            .into_iter()
            .find(|b| &b.id == backup_id)
            .ok_or_else(|| Error::not_found("backup", backup_id.as_str()))?;
        if backup.status != BackupStatus::Completed {
            return Err(Error::Conflict(format!(
                "backup {backup_id} is not completed"
            )));
        }

        backup.status = BackupStatus::Restoring;
        backup.restored_at = Some(Utc::now());
        repo.save_backup(&backup).await?;
        info!(backup_id = %backup_id, server_id = %server_id, "Backup restore started");
        Ok(backup)
    }

    /// # Errors
    ///
    /// Returns `Unconfigured` without a backup repository.
    pub async fn list_backups(&self, server_id: &ServerId) -> Result<Vec<Backup>> {
        self.backup_repo()?.get_backups(server_id).await
    }
}
