//! Orchestrator port: the capability contract every backend satisfies.
//!
//! Both backends implement the same eight operations, but their resource
//! models differ and some failure semantics diverge on purpose:
//!
//! | operation       | container backend              | cluster backend                  |
//! |-----------------|--------------------------------|----------------------------------|
//! | `delete_server` | `NotFound` if no container     | succeeds when resources are gone |
//! | `scale_server`  | always `Conflict` (unsupported)| patches desired replicas         |
//! | stats / health  | zero / unknown when absent     | zero / unknown when absent       |

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::server::Server;
use crate::domain::stats::{ServerHealth, ServerStats};
use crate::error::Result;

/// Label key/value marking backend resources owned by this system.
pub const MANAGED_LABEL: (&str, &str) = ("managed", "server-manager");

/// Label key carrying the owning server's id on backend resources.
pub const SERVER_ID_LABEL: &str = "server-id";

/// Per-create provisioning overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionOptions {
    /// Replaces the image's default command.
    #[serde(default)]
    pub command: Option<Vec<String>>,
    /// Extra environment variables, added after the built-in ones.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Infrastructure operations on the active backend.
///
/// Every operation except [`create_server`](Self::create_server) receives the
/// persisted server so backends can use its `resource_ref` for direct lookup.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Provision backend resources named after `server.name`.
    ///
    /// Returns the backend-native resource identifier. Must only be called
    /// once per entity.
    async fn create_server(&self, server: &Server, options: &ProvisionOptions) -> Result<String>;

    /// Start the server's resources. Fails with `NotFound` if none exist.
    async fn start_server(&self, server: &Server) -> Result<()>;

    /// Stop the server's resources. Fails with `NotFound` if none exist.
    async fn stop_server(&self, server: &Server) -> Result<()>;

    /// Remove the server's resources.
    async fn delete_server(&self, server: &Server) -> Result<()>;

    /// Sample resource gauges. Returns zero gauges when the resource is absent.
    async fn get_server_stats(&self, server: &Server) -> Result<ServerStats>;

    /// Derive a health verdict. Returns `unknown` when the resource is absent.
    async fn get_server_health(&self, server: &Server) -> Result<ServerHealth>;

    /// Set the desired replica count.
    async fn scale_server(&self, server: &Server, replicas: i32) -> Result<()>;

    /// Enumerate managed resources as observed servers.
    ///
    /// Used for reconciliation; the repository stays the source of truth.
    async fn list_servers(&self) -> Result<Vec<Server>>;

    /// Backend name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Whether the backend runs a replica count that start, stop and scale
    /// change. Start runs one replica and stop runs none.
    fn tracks_replicas(&self) -> bool {
        false
    }
}
