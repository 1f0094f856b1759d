//! Read-only comparison of the repository with what the backend reports.

use serde::Serialize;
use tracing::{info, warn};

use super::ServerService;
use crate::domain::id::ServerId;
use crate::domain::server::{Server, ServerStatus};
use crate::error::Result;
use crate::port::outbound::repository::ServerFilter;

/// A tracked server whose backend status differs from the recorded one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Drift {
    pub server_id: ServerId,
    pub name: String,
    pub recorded: ServerStatus,
    pub observed: ServerStatus,
}

/// Outcome of [`ServerService::reconcile`]. Nothing is changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub backend: &'static str,
    /// Managed backend resources with no active server behind them.
    pub untracked: Vec<Server>,
    /// Provisioned servers whose backend resource is gone.
    pub missing: Vec<Server>,
    pub drifted: Vec<Drift>,
}

impl ReconciliationReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.untracked.is_empty() && self.missing.is_empty() && self.drifted.is_empty()
    }
}

fn same_resource(tracked: &Server, observed: &Server) -> bool {
    tracked.id() == observed.id()
        || tracked
            .resource_ref
            .as_deref()
            .is_some_and(|r| observed.resource_ref.as_deref() == Some(r))
}

impl ServerService {
    /// Compare active servers with the backend's managed resources.
    ///
    /// # Errors
    ///
    /// Returns a storage error or the backend listing failure.
    pub async fn reconcile(&self) -> Result<ReconciliationReport> {
        let tracked = self.servers.list(&ServerFilter::default()).await?;
        let mut observed = self
            .bounded("list", self.orchestrator.list_servers())
            .await?;

        let mut report = ReconciliationReport {
            backend: self.backend(),
            ..ReconciliationReport::default()
        };

        for server in tracked {
            match observed.iter().position(|o| same_resource(&server, o)) {
                Some(index) => {
                    let found = observed.swap_remove(index);
                    if found.status() != server.status() {
                        report.drifted.push(Drift {
                            server_id: server.id().clone(),
                            name: server.name.clone(),
                            recorded: server.status(),
                            observed: found.status(),
                        });
                    }
                }
                // Never provisioned, nothing to miss.
                None if server.resource_ref.is_none() => {}
                None => report.missing.push(server),
            }
        }
        report.untracked = observed;

        if report.is_clean() {
            info!(backend = report.backend, "Backend matches repository");
        } else {
            warn!(
                backend = report.backend,
                untracked = report.untracked.len(),
                missing = report.missing.len(),
                drifted = report.drifted.len(),
                "Backend drift detected"
            );
        }
        Ok(report)
    }
}
