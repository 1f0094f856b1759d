//! Records owned by the policy extension points: scaling, backup and
//! software updates. Each refers to a server by id; none is held by it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{RecordId, ServerId};

/// Bounds and thresholds consumed by an external autoscaling loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingPolicy {
    pub id: RecordId,
    pub name: String,
    pub min_replicas: i32,
    pub max_replicas: i32,
    /// CPU percentage that triggers a scale-up.
    pub cpu_threshold: f64,
    /// Memory percentage that triggers a scale-up.
    pub memory_threshold: f64,
    pub scale_up_cooldown_secs: u64,
    pub scale_down_cooldown_secs: u64,
    pub enabled: bool,
}

impl ScalingPolicy {
    /// Check replica bounds and thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidPolicy`] describing the first problem.
    pub fn validate(&self) -> Result<(), DomainError> {
        let invalid = |reason: &str| DomainError::InvalidPolicy {
            reason: reason.to_string(),
        };
        if self.name.trim().is_empty() {
            return Err(invalid("name is required"));
        }
        if self.min_replicas < 0 {
            return Err(invalid("min_replicas must be non-negative"));
        }
        if self.max_replicas < self.min_replicas {
            return Err(invalid("max_replicas must be >= min_replicas"));
        }
        for threshold in [self.cpu_threshold, self.memory_threshold] {
            if !(0.0..=100.0).contains(&threshold) {
                return Err(invalid("thresholds must be between 0 and 100"));
            }
        }
        Ok(())
    }
}

/// Full or incremental backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupKind {
    #[default]
    Full,
    Incremental,
}

/// Schedule and retention for a server's backups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupConfig {
    pub id: RecordId,
    pub server_id: ServerId,
    /// Cron expression.
    pub schedule: String,
    pub retention_days: u32,
    pub kind: BackupKind,
    pub destination: String,
    pub enabled: bool,
    pub last_backup: Option<DateTime<Utc>>,
    pub next_backup: Option<DateTime<Utc>>,
}

impl BackupConfig {
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidBackupConfig`] describing the first problem.
    pub fn validate(&self) -> Result<(), DomainError> {
        let invalid = |reason: &str| DomainError::InvalidBackupConfig {
            reason: reason.to_string(),
        };
        if self.schedule.split_whitespace().count() != 5 {
            return Err(invalid("schedule must be a five-field cron expression"));
        }
        if self.retention_days == 0 {
            return Err(invalid("retention_days must be greater than 0"));
        }
        if self.destination.trim().is_empty() {
            return Err(invalid("destination is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupStatus {
    Pending,
    Completed,
    Failed,
    Restoring,
}

/// One backup taken of a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub id: RecordId,
    pub server_id: ServerId,
    pub config_id: Option<RecordId>,
    pub status: BackupStatus,
    pub created_at: DateTime<Utc>,
    pub restored_at: Option<DateTime<Utc>>,
}

impl Backup {
    #[must_use]
    pub fn pending(server_id: ServerId, config_id: Option<RecordId>) -> Self {
        Self {
            id: RecordId::generate(),
            server_id,
            config_id,
            status: BackupStatus::Pending,
            created_at: Utc::now(),
            restored_at: None,
        }
    }
}

/// Request to roll a server onto a new software version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub server_id: ServerId,
    pub version: String,
    /// Replace an update already in progress.
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateState {
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl UpdateState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        })
    }
}

/// Progress of a software update on one server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStatus {
    pub server_id: ServerId,
    pub version: String,
    pub state: UpdateState,
    /// Percent complete, 0..=100.
    pub progress: u8,
    pub message: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl UpdateStatus {
    #[must_use]
    pub fn started(request: &UpdateRequest) -> Self {
        Self {
            server_id: request.server_id.clone(),
            version: request.version.clone(),
            state: UpdateState::InProgress,
            progress: 0,
            message: format!("update to {} started", request.version),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Close the update with a terminal state.
    pub fn finish(&mut self, state: UpdateState, message: impl Into<String>) {
        self.state = state;
        self.message = message.into();
        self.completed_at = Some(Utc::now());
        if state == UpdateState::Completed {
            self.progress = 100;
        }
    }
}
