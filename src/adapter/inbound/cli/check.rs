//! `check config`.

use std::path::Path;

use serde_json::json;

use super::output;
use crate::error::Result;
use crate::infrastructure::config::service::StorageBackend;
use crate::infrastructure::config::settings::{Config, OrchestratorKind};

/// Report the effective configuration. Validation already happened on load.
pub fn execute_config(config: &Config, source: Option<&Path>) -> Result<()> {
    let backend = config.orchestrator.backend()?;
    let storage = match config.storage.backend {
        StorageBackend::Memory => "memory".to_string(),
        StorageBackend::Sqlite => format!("sqlite ({})", config.storage.path),
    };
    let source = source.map_or_else(|| "defaults + environment".to_string(), |p| p.display().to_string());

    if output::is_json() {
        output::json_output(&json!({
            "command": "check.config",
            "valid": true,
            "source": source,
            "orchestrator": backend.as_str(),
            "storage": storage,
            "backend_timeout_secs": config.service.backend_timeout_secs,
        }));
        return Ok(());
    }

    output::section("Configuration Check");
    output::field("Config", &source);
    output::success("Configuration is valid");

    output::section("Summary");
    output::field("Backend", backend);
    match backend {
        OrchestratorKind::Docker => {
            output::field("Host", &config.orchestrator.docker.host);
            output::field("API", &config.orchestrator.docker.api_version);
        }
        OrchestratorKind::Kubernetes => {
            output::field("Namespace", &config.orchestrator.kubernetes.namespace);
            output::field(
                "Kubeconfig",
                config
                    .orchestrator
                    .kubernetes
                    .kubeconfig
                    .as_deref()
                    .unwrap_or("inferred"),
            );
        }
    }
    output::field("Storage", storage);
    output::field("Timeout", format!("{}s", config.service.backend_timeout_secs));
    Ok(())
}
