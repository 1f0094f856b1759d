//! Domain validation errors for server types.
//!
//! This module defines errors that occur when domain invariants are violated.
//! They are returned by validating constructors and by the status state
//! machine.
//!
//! # Examples
//!
//! ```
//! use server_manager::domain::error::DomainError;
//! use server_manager::domain::server::{Server, ServerType};
//!
//! let result = Server::new("Not A Label", ServerType::Vpn, "us-east-1");
//! assert!(matches!(result, Err(DomainError::InvalidName { .. })));
//! ```

use thiserror::Error;

use super::server::ServerStatus;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field was empty.
    #[error("{field} is required")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// Server names become backend resource names and must be DNS labels.
    #[error("invalid server name '{name}': {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Status change not permitted by the lifecycle graph.
    #[error("cannot transition server from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: ServerStatus,
        /// Requested status.
        to: ServerStatus,
    },

    /// The server carries a tombstone and can no longer change.
    #[error("server {id} is deleted")]
    Deleted {
        /// Identifier of the deleted server.
        id: String,
    },

    /// Replica counts must be non-negative.
    #[error("replica count must be non-negative, got {replicas}")]
    NegativeReplicas {
        /// The rejected count.
        replicas: i32,
    },

    /// Zero replicas is a stop, not a scale.
    #[error("cannot scale to zero replicas, stop the server instead")]
    ScaleToZero,

    /// Scaling bounds are inconsistent.
    #[error("invalid scaling policy: {reason}")]
    InvalidPolicy {
        /// Why the policy was rejected.
        reason: String,
    },

    /// Backup configuration is inconsistent.
    #[error("invalid backup config: {reason}")]
    InvalidBackupConfig {
        /// Why the config was rejected.
        reason: String,
    },
}
