//! Point-in-time observations of a server: resource gauges and health.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ServerId;

/// Resource and traffic gauges sampled at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerStats {
    pub server_id: ServerId,
    /// CPU usage in percent of the allotted CPUs.
    pub cpu_usage: f64,
    /// Memory usage in percent of the limit.
    pub memory_usage: f64,
    pub storage_usage: f64,
    /// Bytes received.
    pub network_in: u64,
    /// Bytes sent.
    pub network_out: u64,
    /// Seconds since the workload started.
    pub uptime: u64,
    pub request_count: u64,
    /// Mean response time in milliseconds.
    pub response_time: f64,
    pub error_rate: f64,
    pub timestamp: DateTime<Utc>,
}

impl ServerStats {
    /// A well-formed sample with every gauge at zero.
    #[must_use]
    pub fn zero(server_id: ServerId) -> Self {
        Self {
            server_id,
            cpu_usage: 0.0,
            memory_usage: 0.0,
            storage_usage: 0.0,
            network_in: 0,
            network_out: 0,
            uptime: 0,
            request_count: 0,
            response_time: 0.0,
            error_rate: 0.0,
            timestamp: Utc::now(),
        }
    }

    /// True when every gauge is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.cpu_usage == 0.0
            && self.memory_usage == 0.0
            && self.storage_usage == 0.0
            && self.network_in == 0
            && self.network_out == 0
            && self.uptime == 0
            && self.request_count == 0
            && self.response_time == 0.0
            && self.error_rate == 0.0
    }
}

/// Health classification reported for a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Running,
    Stopped,
    Starting,
    Error,
    Unknown,
}

impl HealthStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "stopped" => Ok(Self::Stopped),
            "starting" => Ok(Self::Starting),
            "error" => Ok(Self::Error),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown health status '{other}'")),
        }
    }
}

/// One named sub-check contributing to a health verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl HealthCheck {
    pub fn new(name: impl Into<String>, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

/// Health verdict for a server at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerHealth {
    pub server_id: ServerId,
    pub status: HealthStatus,
    pub message: String,
    pub checks: Vec<HealthCheck>,
    pub timestamp: DateTime<Utc>,
}

impl ServerHealth {
    pub fn new(server_id: ServerId, status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            server_id,
            status,
            message: message.into(),
            checks: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Placeholder used when nothing is known about the server.
    #[must_use]
    pub fn unknown(server_id: ServerId, message: impl Into<String>) -> Self {
        Self::new(server_id, HealthStatus::Unknown, message)
    }

    #[must_use]
    pub fn with_check(mut self, check: HealthCheck) -> Self {
        self.checks.push(check);
        self
    }
}

/// Result of reading a secondary observation.
///
/// Separates "no repository wired" from "repository wired but empty" so
/// callers never have to guess from a zero value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", content = "value", rename_all = "snake_case")]
pub enum Observation<T> {
    /// Value read from the configured repository.
    Recorded(T),
    /// Repository configured, but it holds nothing for this key.
    Empty,
    /// No repository configured; carries a placeholder value.
    Unconfigured(T),
}

impl<T> Observation<T> {
    /// The carried value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Recorded(v) | Self::Unconfigured(v) => Some(v),
            Self::Empty => None,
        }
    }

    #[must_use]
    pub const fn is_unconfigured(&self) -> bool {
        matches!(self, Self::Unconfigured(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_stats_are_tagged_and_zero() {
        let stats = ServerStats::zero(ServerId::new("missing-id"));
        assert_eq!(stats.server_id.as_str(), "missing-id");
        assert!(stats.is_zero());
    }

    #[test]
    fn health_builder_collects_checks() {
        let health = ServerHealth::new(ServerId::new("s"), HealthStatus::Running, "ok")
            .with_check(HealthCheck::new("replicas", true, "1/1 ready"));
        assert_eq!(health.checks.len(), 1);
        assert_eq!(health.status.to_string(), "running");
    }

    #[test]
    fn observation_distinguishes_unconfigured_from_empty() {
        let empty: Observation<u8> = Observation::Empty;
        let placeholder = Observation::Unconfigured(0u8);
        assert!(empty.value().is_none());
        assert!(placeholder.is_unconfigured());
        assert_eq!(placeholder.value(), Some(&0));
    }
}
