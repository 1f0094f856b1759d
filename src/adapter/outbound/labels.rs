//! Labels and environment shared by both orchestration backends.
//!
//! Every backend resource carries the management label plus `app`, `type`,
//! `region` and `server-id`, so listings can be mapped back to entities.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::id::ServerId;
use crate::domain::server::{Server, ServerParts, ServerStatus, ServerType, Tombstone};
use crate::port::outbound::orchestrator::{ProvisionOptions, MANAGED_LABEL, SERVER_ID_LABEL};

/// Labels attached to every resource created for `server`.
#[must_use]
pub fn managed_labels(server: &Server) -> BTreeMap<String, String> {
    BTreeMap::from([
        (MANAGED_LABEL.0.to_string(), MANAGED_LABEL.1.to_string()),
        ("app".to_string(), server.name.clone()),
        ("type".to_string(), server.server_type.to_string()),
        ("region".to_string(), server.region.clone()),
        (SERVER_ID_LABEL.to_string(), server.id().to_string()),
    ])
}

/// Environment for the server's workload: identity first, then user
/// overrides. A user key that shadows a built-in one replaces it.
#[must_use]
pub fn workload_env(server: &Server, options: &ProvisionOptions) -> Vec<(String, String)> {
    let mut env = BTreeMap::from([
        ("SERVER_ID".to_string(), server.id().to_string()),
        ("SERVER_TYPE".to_string(), server.server_type.to_string()),
        ("REGION".to_string(), server.region.clone()),
    ]);
    env.extend(options.env.clone());
    env.into_iter().collect()
}

/// What a backend observed about one managed resource.
pub struct Observed<'a> {
    pub name: &'a str,
    pub labels: &'a BTreeMap<String, String>,
    pub status: ServerStatus,
    pub resource_ref: String,
    pub replicas: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Rebuild a server snapshot from a labelled backend resource.
///
/// Returns `None` (and logs) when the type label is missing or unknown.
#[must_use]
pub fn observed_server(observed: Observed<'_>) -> Option<Server> {
    let server_type = match observed
        .labels
        .get("type")
        .map(|t| t.parse::<ServerType>())
    {
        Some(Ok(t)) => t,
        _ => {
            warn!(resource = %observed.resource_ref, "Managed resource has no valid type label, skipping");
            return None;
        }
    };

    let id = observed
        .labels
        .get(SERVER_ID_LABEL)
        .map_or_else(ServerId::generate, |id| ServerId::new(id.as_str()));
    let created_at = observed.created_at.unwrap_or_else(Utc::now);

    Some(Server::from_parts(ServerParts {
        id,
        name: observed.name.to_string(),
        server_type,
        status: observed.status,
        region: observed.labels.get("region").cloned().unwrap_or_default(),
        ip: String::new(),
        port: 0,
        cpu: 0.0,
        memory: 0.0,
        disk: 0.0,
        network: 0.0,
        resource_ref: Some(observed.resource_ref),
        replicas: observed.replicas,
        created_at,
        updated_at: created_at,
        tombstone: Tombstone::Live,
    }))
}
