//! `reconcile` subcommand.

use super::output;
use crate::application::server::ServerService;
use crate::error::Result;

pub async fn execute(service: &ServerService) -> Result<()> {
    let report = service.reconcile().await?;

    if output::is_json() {
        output::json_output(&report);
        return Ok(());
    }

    output::section(&format!("Reconciliation ({})", report.backend));
    if report.is_clean() {
        output::success("Repository and backend agree");
        return Ok(());
    }
    for server in &report.untracked {
        let reference = server.resource_ref.as_deref().unwrap_or("-");
        output::warning(&format!("untracked resource {} ({reference})", server.name));
    }
    for server in &report.missing {
        output::warning(&format!("{} ({}) has no backend resource", server.name, server.id()));
    }
    for drift in &report.drifted {
        output::warning(&format!(
            "{} recorded {} but backend reports {}",
            drift.name, drift.recorded, drift.observed
        ));
    }
    output::note("No changes were made");
    Ok(())
}
