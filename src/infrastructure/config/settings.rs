//! Application configuration loading and validation.
//!
//! Configuration is read from a TOML file, then environment variables
//! override individual fields:
//!
//! | variable                  | field                              |
//! |---------------------------|------------------------------------|
//! | `ORCHESTRATOR_TYPE`       | `orchestrator.type`                |
//! | `DOCKER_HOST`             | `orchestrator.docker.host`         |
//! | `DOCKER_API_VERSION`      | `orchestrator.docker.api_version`  |
//! | `DOCKER_TIMEOUT`          | `orchestrator.docker.timeout_secs` |
//! | `KUBECONFIG`              | `orchestrator.kubernetes.kubeconfig` |
//! | `KUBERNETES_NAMESPACE`    | `orchestrator.kubernetes.namespace` |
//! | `SERVER_MANAGER_DATABASE` | `storage.path` (forces sqlite)     |
//!
//! # Example
//!
//! ```no_run
//! use server_manager::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use super::logging::LoggingConfig;
use super::service::{ServiceConfig, StorageBackend, StorageConfig};
use crate::adapter::outbound::docker::DockerConfig;
use crate::adapter::outbound::image::ImageConfig;
use crate::adapter::outbound::kubernetes::KubernetesConfig;
use crate::domain::server::ServerType;
use crate::error::{ConfigError, Result};

/// The two supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorKind {
    Docker,
    Kubernetes,
}

impl OrchestratorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::Kubernetes => "kubernetes",
        }
    }
}

impl fmt::Display for OrchestratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrchestratorKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "docker" => Ok(Self::Docker),
            "kubernetes" => Ok(Self::Kubernetes),
            other => Err(ConfigError::UnsupportedOrchestrator(other.to_string())),
        }
    }
}

fn default_kind() -> String {
    OrchestratorKind::Docker.as_str().to_string()
}

/// `[orchestrator]` section.
///
/// The selector is kept as written so an unknown value is reported as
/// [`ConfigError::UnsupportedOrchestrator`] rather than a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub docker: DockerConfig,
    #[serde(default)]
    pub kubernetes: KubernetesConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            docker: DockerConfig::default(),
            kubernetes: KubernetesConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Resolve the backend selector.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedOrchestrator`] for anything other
    /// than `docker` or `kubernetes`.
    pub fn backend(&self) -> std::result::Result<OrchestratorKind, ConfigError> {
        self.kind.parse()
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Image per server type.
    #[serde(default)]
    pub images: ImageConfig,

    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse and validate TOML without consulting the environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the content is malformed or invalid.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Read `path`, apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or the result is
    /// invalid.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Self = toml::from_str(&content).map_err(ConfigError::Parse)?;
        let config = config.with_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if an override is invalid.
    #[allow(clippy::result_large_err)]
    pub fn from_env() -> Result<Self> {
        let config = Self::default().with_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides looked up by variable name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when `DOCKER_TIMEOUT` is not a
    /// whole number of seconds.
    #[allow(clippy::result_large_err)]
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(kind) = lookup("ORCHESTRATOR_TYPE") {
            self.orchestrator.kind = kind;
        }
        let docker = &mut self.orchestrator.docker;
        if let Some(host) = lookup("DOCKER_HOST") {
            docker.host = host;
        }
        if let Some(version) = lookup("DOCKER_API_VERSION") {
            docker.api_version = version;
        }
        if let Some(timeout) = lookup("DOCKER_TIMEOUT") {
            docker.timeout_secs = timeout.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: "DOCKER_TIMEOUT",
                reason: format!("expected seconds, got '{timeout}'"),
            })?;
        }
        let kubernetes = &mut self.orchestrator.kubernetes;
        if let Some(path) = lookup("KUBECONFIG") {
            kubernetes.kubeconfig = Some(path);
        }
        if let Some(namespace) = lookup("KUBERNETES_NAMESPACE") {
            kubernetes.namespace = namespace;
        }
        if let Some(path) = lookup("SERVER_MANAGER_DATABASE") {
            self.storage.backend = StorageBackend::Sqlite;
            self.storage.path = path;
        }
        Ok(self)
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        self.orchestrator.backend()?;

        let docker = &self.orchestrator.docker;
        if docker.host.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "docker.host" }.into());
        }
        if docker.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "docker.timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.orchestrator.kubernetes.namespace.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "kubernetes.namespace",
            }
            .into());
        }

        for server_type in ServerType::ALL {
            if self.images.image_for(server_type).trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "images",
                    reason: format!("no image configured for {server_type}"),
                }
                .into());
            }
        }

        if self.service.backend_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "service.backend_timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.storage.backend == StorageBackend::Sqlite && self.storage.path.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "storage.path",
            }
            .into());
        }
        Ok(())
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;
    use crate::error::Error;
    use crate::infrastructure::config::logging::LogFormat;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_file_gives_docker_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.orchestrator.backend().unwrap(), OrchestratorKind::Docker);
        assert_eq!(config.orchestrator.docker.host, "unix:///var/run/docker.sock");
        assert_eq!(config.orchestrator.kubernetes.namespace, "default");
        assert_eq!(config.images.image_for(ServerType::Dpi), "silence/dpi-bypass:latest");
        assert_eq!(config.service.settings().backend_timeout, Duration::from_secs(30));
        assert_eq!(config.service.settings().restart_settle, Duration::from_secs(2));
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
    }

    #[test]
    fn full_file_parses() {
        let toml = r#"
[orchestrator]
type = "kubernetes"

[orchestrator.kubernetes]
kubeconfig = "/etc/kube/config"
namespace = "edge"

[images]
vpn = "registry.local/vpn:2.1"

[service]
backend_timeout_secs = 10
restart_settle_ms = 500

[storage]
backend = "memory"

[logging]
level = "debug"
format = "json"
"#;
        let config = Config::parse_toml(toml).unwrap();
        assert_eq!(config.orchestrator.backend().unwrap(), OrchestratorKind::Kubernetes);
        assert_eq!(
            config.orchestrator.kubernetes.kubeconfig.as_deref(),
            Some("/etc/kube/config")
        );
        assert_eq!(config.images.image_for(ServerType::Vpn), "registry.local/vpn:2.1");
        assert_eq!(config.images.image_for(ServerType::Gateway), "silence/gateway:latest");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn unknown_orchestrator_is_unsupported() {
        let err = Config::parse_toml("[orchestrator]\ntype = \"nomad\"").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::UnsupportedOrchestrator(ref t)) if t == "nomad"
        ));
    }

    #[test]
    fn zero_timeouts_and_empty_namespace_rejected() {
        assert!(Config::parse_toml("[service]\nbackend_timeout_secs = 0").is_err());
        assert!(Config::parse_toml("[orchestrator.docker]\ntimeout_secs = 0").is_err());
        assert!(Config::parse_toml("[orchestrator.kubernetes]\nnamespace = \"\"").is_err());
        assert!(Config::parse_toml("[images]\nanalytics = \"\"").is_err());
    }

    #[test]
    fn environment_overrides_file_values() {
        let config = Config::default()
            .with_overrides(env(&[
                ("ORCHESTRATOR_TYPE", "kubernetes"),
                ("DOCKER_HOST", "tcp://10.0.0.5:2375"),
                ("DOCKER_API_VERSION", "1.43"),
                ("DOCKER_TIMEOUT", "45"),
                ("KUBECONFIG", "/home/ops/.kube/config"),
                ("KUBERNETES_NAMESPACE", "vpn"),
                ("SERVER_MANAGER_DATABASE", "/var/lib/sm.db"),
            ]))
            .unwrap();

        assert_eq!(config.orchestrator.kind, "kubernetes");
        assert_eq!(config.orchestrator.docker.host, "tcp://10.0.0.5:2375");
        assert_eq!(config.orchestrator.docker.api_version, "1.43");
        assert_eq!(config.orchestrator.docker.timeout_secs, 45);
        assert_eq!(config.orchestrator.kubernetes.namespace, "vpn");
        assert_eq!(config.storage.path, "/var/lib/sm.db");
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
    }

    #[test]
    fn non_numeric_docker_timeout_rejected() {
        let err = Config::default()
            .with_overrides(env(&[("DOCKER_TIMEOUT", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { field: "DOCKER_TIMEOUT", .. })
        ));
    }
}
