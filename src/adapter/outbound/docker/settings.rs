//! Container-engine connection settings.

use serde::Deserialize;

/// Docker endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    /// Engine endpoint: `unix://`, `tcp://` or `http://`.
    pub host: String,
    /// Engine API version, `major.minor`.
    pub api_version: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Seconds a container gets to exit before it is killed on stop.
    pub stop_grace_secs: u64,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            host: "unix:///var/run/docker.sock".into(),
            api_version: "1.41".into(),
            timeout_secs: 30,
            stop_grace_secs: 30,
        }
    }
}
