use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::id::{RecordId, ServerId};
use crate::domain::policy::{Backup, BackupConfig, ScalingPolicy, UpdateState, UpdateStatus};
use crate::error::{Error, Result};
use crate::port::outbound::repository::{BackupRepository, ScalingRepository, UpdateRepository};

/// In-memory scaling policies.
#[derive(Debug, Default)]
pub struct MemoryScalingRepository {
    policies: RwLock<HashMap<RecordId, ScalingPolicy>>,
}

impl MemoryScalingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScalingRepository for MemoryScalingRepository {
    async fn save_policy(&self, policy: &ScalingPolicy) -> Result<()> {
        self.policies
            .write()
            .insert(policy.id.clone(), policy.clone());
        Ok(())
    }

    async fn get_policy(&self, id: &RecordId) -> Result<Option<ScalingPolicy>> {
        Ok(self.policies.read().get(id).cloned())
    }

    async fn list_policies(&self) -> Result<Vec<ScalingPolicy>> {
        let mut policies: Vec<_> = self.policies.read().values().cloned().collect();
        policies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(policies)
    }

    async fn update_policy(&self, policy: &ScalingPolicy) -> Result<()> {
        let mut policies = self.policies.write();
        let slot = policies
            .get_mut(&policy.id)
            .ok_or_else(|| Error::not_found("scaling policy", policy.id.as_str()))?;
        *slot = policy.clone();
        Ok(())
    }

    async fn delete_policy(&self, id: &RecordId) -> Result<()> {
        self.policies
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("scaling policy", id.as_str()))
    }
}

/// In-memory backup configs and backup records.
#[derive(Debug, Default)]
pub struct MemoryBackupRepository {
    configs: RwLock<HashMap<RecordId, BackupConfig>>,
    backups: RwLock<Vec<Backup>>,
}

impl MemoryBackupRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BackupRepository for MemoryBackupRepository {
    async fn save_config(&self, config: &BackupConfig) -> Result<()> {
        self.configs
            .write()
            .insert(config.id.clone(), config.clone());
        Ok(())
    }

    async fn get_config(&self, id: &RecordId) -> Result<Option<BackupConfig>> {
        Ok(self.configs.read().get(id).cloned())
    }

    async fn list_configs(&self) -> Result<Vec<BackupConfig>> {
        let mut configs: Vec<_> = self.configs.read().values().cloned().collect();
        configs.sort_by(|a, b| a.server_id.cmp(&b.server_id).then(a.id.cmp(&b.id)));
        Ok(configs)
    }

    async fn update_config(&self, config: &BackupConfig) -> Result<()> {
        let mut configs = self.configs.write();
        let slot = configs
            .get_mut(&config.id)
            .ok_or_else(|| Error::not_found("backup config", config.id.as_str()))?;
        *slot = config.clone();
        Ok(())
    }

    async fn delete_config(&self, id: &RecordId) -> Result<()> {
        self.configs
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found("backup config", id.as_str()))
    }

    async fn save_backup(&self, backup: &Backup) -> Result<()> {
        let mut backups = self.backups.write();
        match backups.iter_mut().find(|b| b.id == backup.id) {
            Some(existing) => *existing = backup.clone(),
            None => backups.push(backup.clone()),
        }
        Ok(())
    }

    async fn get_backups(&self, server_id: &ServerId) -> Result<Vec<Backup>> {
        Ok(self
            .backups
            .read()
            .iter()
            .rev()
            .filter(|b| &b.server_id == server_id)
            .cloned()
            .collect())
    }

    async fn delete_backup(&self, id: &RecordId) -> Result<()> {
        let mut backups = self.backups.write();
        let before = backups.len();
        backups.retain(|b| &b.id != id);
        if backups.len() == before {
            return Err(Error::not_found("backup", id.as_str()));
        }
        Ok(())
    }
}

/// In-memory update progress, one record per server.
#[derive(Debug, Default)]
pub struct MemoryUpdateRepository {
    updates: RwLock<HashMap<ServerId, UpdateStatus>>,
}

impl MemoryUpdateRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UpdateRepository for MemoryUpdateRepository {
    async fn save_update_status(&self, status: &UpdateStatus) -> Result<()> {
        self.updates
            .write()
            .insert(status.server_id.clone(), status.clone());
        Ok(())
    }

    async fn get_update_status(&self, server_id: &ServerId) -> Result<Option<UpdateStatus>> {
        Ok(self.updates.read().get(server_id).cloned())
    }

    async fn update_progress(&self, server_id: &ServerId, progress: u8, message: &str) -> Result<()> {
        let mut updates = self.updates.write();
        let status = updates
            .get_mut(server_id)
            .ok_or_else(|| Error::not_found("update", server_id.as_str()))?;
        status.progress = progress.min(100);
        status.message = message.to_string();
        Ok(())
    }

    async fn complete_update(&self, server_id: &ServerId, success: bool, message: &str) -> Result<()> {
        let mut updates = self.updates.write();
        let status = updates
            .get_mut(server_id)
            .ok_or_else(|| Error::not_found("update", server_id.as_str()))?;
        let state = if success {
            UpdateState::Completed
        } else {
            UpdateState::Failed
        };
        status.finish(state, message);
        Ok(())
    }
}
