//! Backend-agnostic domain model.
//!
//! - [`server`] - the managed [`Server`] entity and its status state machine
//! - [`stats`] - resource and health observations
//! - [`policy`] - scaling, backup and update records
//! - [`id`] - identifier newtypes
//! - [`error`] - invariant violations

pub mod error;
pub mod id;
pub mod policy;
pub mod server;
pub mod stats;

pub use error::DomainError;
pub use id::{RecordId, ServerId};
pub use policy::{
    Backup, BackupConfig, BackupKind, BackupStatus, ScalingPolicy, UpdateRequest, UpdateState,
    UpdateStatus,
};
pub use server::{Server, ServerParts, ServerStatus, ServerType, Tombstone};
pub use stats::{HealthCheck, HealthStatus, Observation, ServerHealth, ServerStats};
