//! Server lifecycle service.
//!
//! [`ServerService`] coordinates the server repository with the active
//! orchestrator. Every mutating lifecycle operation is serialised behind one
//! process-wide lock and every backend call is bounded by
//! [`ServiceSettings::backend_timeout`]. Reads never take the lock.
//!
//! The secondary concerns live in their own files:
//! - [`monitoring`] - stats and health reads and recording
//! - [`scaling`] - scaling policies
//! - [`backup`] - backup configs and backup records
//! - [`update`] - software update progress
//! - [`reconcile`] - repository versus backend drift

mod backup;
mod monitoring;
mod reconcile;
mod scaling;
mod service;
mod update;

use std::time::Duration;

pub use reconcile::{Drift, ReconciliationReport};
pub use service::ServerService;

/// Tunables for [`ServerService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Upper bound on a single orchestrator call.
    pub backend_timeout: Duration,
    /// Pause between the stop and start halves of a restart.
    pub restart_settle: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            backend_timeout: Duration::from_secs(30),
            restart_settle: Duration::from_millis(2000),
        }
    }
}
