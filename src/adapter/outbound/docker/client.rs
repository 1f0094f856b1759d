//! [`ContainerEngine`] backed by the Docker Engine API via `bollard`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions,
    RemoveContainerOptions, StartContainerOptions, Stats, StatsOptions, StopContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::{ClientVersion, Docker};
use futures_util::StreamExt;
use tracing::debug;

use super::engine::{ContainerEngine, ContainerSample, ContainerSpec, ContainerState, ContainerSummary};
use super::settings::DockerConfig;
use super::BACKEND;
use crate::error::{ConfigError, Error, InfraError, Result};

/// Docker Engine client.
pub struct BollardEngine {
    docker: Docker,
}

impl BollardEngine {
    /// Connect to the endpoint in `config`.
    ///
    /// The connection is lazy; no request is sent until the first call.
    ///
    /// # Errors
    ///
    /// Returns a config error for an unparseable API version or an
    /// unsupported endpoint scheme.
    pub fn connect(config: &DockerConfig) -> Result<Self> {
        let version = parse_api_version(&config.api_version)?;
        let connected = match config.host.split_once("://").map(|(scheme, _)| scheme) {
            Some("unix") => Docker::connect_with_unix(&config.host, config.timeout_secs, &version),
            Some("tcp" | "http") => {
                Docker::connect_with_http(&config.host, config.timeout_secs, &version)
            }
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: "docker.host",
                    reason: format!("unsupported scheme in '{}'", config.host),
                }
                .into())
            }
        };
        let docker = connected.map_err(|e| InfraError::wrap(BACKEND, "connect", e))?;

        debug!(host = %config.host, api_version = %config.api_version, "Docker client configured");
        Ok(Self { docker })
    }
}

fn parse_api_version(raw: &str) -> Result<ClientVersion> {
    let invalid = || ConfigError::InvalidValue {
        field: "docker.api_version",
        reason: format!("expected 'major.minor', got '{raw}'"),
    };
    let (major, minor) = raw.trim().split_once('.').ok_or_else(invalid)?;
    Ok(ClientVersion {
        major_version: major.parse().map_err(|_| invalid())?,
        minor_version: minor.parse().map_err(|_| invalid())?,
    })
}

fn is_not_found(err: &BollardError) -> bool {
    matches!(
        err,
        BollardError::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

fn map_err(operation: &'static str, id: &str, err: BollardError) -> Error {
    if is_not_found(&err) {
        Error::not_found("container", id)
    } else {
        InfraError::wrap(BACKEND, operation, err).into()
    }
}

/// CPU usage as a percentage of all online CPUs, the way `docker stats`
/// computes it.
pub(crate) fn cpu_percent(cpu_delta: u64, system_delta: u64, online_cpus: u64) -> f64 {
    if cpu_delta == 0 || system_delta == 0 {
        return 0.0;
    }
    let cpus = online_cpus.max(1) as f64;
    (cpu_delta as f64 / system_delta as f64) * cpus * 100.0
}

pub(crate) fn memory_percent(usage: u64, limit: u64) -> f64 {
    if limit == 0 {
        return 0.0;
    }
    usage as f64 / limit as f64 * 100.0
}

fn decode_stats(stats: &Stats) -> ContainerSample {
    let cpu_delta = stats
        .cpu_stats
        .cpu_usage
        .total_usage
        .saturating_sub(stats.precpu_stats.cpu_usage.total_usage);
    let system_delta = stats
        .cpu_stats
        .system_cpu_usage
        .unwrap_or(0)
        .saturating_sub(stats.precpu_stats.system_cpu_usage.unwrap_or(0));
    let online_cpus = stats.cpu_stats.online_cpus.unwrap_or(1);

    let (rx_bytes, tx_bytes) = stats
        .networks
        .as_ref()
        .map(|networks| {
            networks
                .values()
                .fold((0u64, 0u64), |(rx, tx), n| (rx + n.rx_bytes, tx + n.tx_bytes))
        })
        .unwrap_or_default();

    ContainerSample {
        cpu_percent: cpu_percent(cpu_delta, system_delta, online_cpus),
        memory_percent: memory_percent(
            stats.memory_stats.usage.unwrap_or(0),
            stats.memory_stats.limit.unwrap_or(0),
        ),
        rx_bytes,
        tx_bytes,
    }
}

#[async_trait]
impl ContainerEngine for BollardEngine {
    async fn create(&self, spec: &ContainerSpec) -> Result<String> {
        let options = CreateContainerOptions {
            name: spec.name.as_str(),
            platform: None,
        };
        let config = Config {
            image: Some(spec.image.clone()),
            env: Some(spec.env.clone()),
            cmd: spec.command.clone(),
            labels: Some(spec.labels.clone()),
            ..Default::default()
        };

        let response = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| InfraError::wrap(BACKEND, "create container", e))?;
        Ok(response.id)
    }

    async fn start(&self, id: &str) -> Result<()> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| map_err("start container", id, e))
    }

    async fn stop(&self, id: &str, grace: Duration) -> Result<()> {
        let t = i64::try_from(grace.as_secs()).unwrap_or(i64::MAX);
        self.docker
            .stop_container(id, Some(StopContainerOptions { t }))
            .await
            .map_err(|e| map_err("stop container", id, e))
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        self.docker
            .remove_container(id, Some(options))
            .await
            .map_err(|e| map_err("remove container", id, e))
    }

    async fn list(&self, label: (&str, &str)) -> Result<Vec<ContainerSummary>> {
        let mut filters = HashMap::new();
        filters.insert("label".to_string(), vec![format!("{}={}", label.0, label.1)]);
        let options = ListContainersOptions {
            all: true,
            filters,
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| InfraError::wrap(BACKEND, "list containers", e))?;

        Ok(containers
            .into_iter()
            .map(|c| ContainerSummary {
                id: c.id.unwrap_or_default(),
                names: c
                    .names
                    .unwrap_or_default()
                    .into_iter()
                    .map(|n| n.trim_start_matches('/').to_string())
                    .collect(),
                state: c.state.unwrap_or_default(),
                labels: c.labels.unwrap_or_default(),
                created: c.created.unwrap_or_default(),
            })
            .collect())
    }

    async fn inspect(&self, id: &str) -> Result<Option<ContainerState>> {
        let response = match self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
        {
            Ok(response) => response,
            Err(e) if is_not_found(&e) => return Ok(None),
            Err(e) => return Err(InfraError::wrap(BACKEND, "inspect container", e).into()),
        };

        let state = response.state.unwrap_or_default();
        Ok(Some(ContainerState {
            status: state.status.map(|s| s.to_string()).unwrap_or_default(),
            health: state
                .health
                .and_then(|h| h.status)
                .map(|s| s.to_string())
                .filter(|s| !s.is_empty() && s != "none"),
            error: state.error.unwrap_or_default(),
            started_at: state.started_at,
        }))
    }

    async fn sample(&self, id: &str) -> Result<Option<ContainerSample>> {
        let options = StatsOptions {
            stream: false,
            one_shot: true,
        };
        let mut stream = Box::pin(self.docker.stats(id, Some(options)));
        match stream.next().await {
            Some(Ok(stats)) => Ok(Some(decode_stats(&stats))),
            Some(Err(e)) if is_not_found(&e) => Ok(None),
            Some(Err(e)) => Err(InfraError::wrap(BACKEND, "container stats", e).into()),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_version_parses_major_minor() {
        let version = parse_api_version("1.41").unwrap();
        assert_eq!(version.major_version, 1);
        assert_eq!(version.minor_version, 41);
        assert!(parse_api_version("latest").is_err());
        assert!(parse_api_version("1.x").is_err());
    }

    #[test]
    fn cpu_percent_scales_by_online_cpus() {
        assert_eq!(cpu_percent(0, 100, 4), 0.0);
        assert_eq!(cpu_percent(50, 0, 4), 0.0);
        let pct = cpu_percent(25, 100, 2);
        assert!((pct - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn memory_percent_handles_missing_limit() {
        assert_eq!(memory_percent(10, 0), 0.0);
        assert!((memory_percent(256, 1024) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unsupported_scheme_is_a_config_error() {
        let config = DockerConfig {
            host: "ssh://docker.internal".into(),
            ..DockerConfig::default()
        };
        let err = BollardEngine::connect(&config).err().unwrap();
        assert!(err.to_string().contains("docker.host"));
    }
}
