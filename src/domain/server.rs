//! The managed server entity and its lifecycle state machine.
//!
//! A [`Server`] is created in [`ServerStatus::Creating`] and moves only along
//! the edges accepted by [`ServerStatus::can_transition_to`]:
//!
//! ```text
//! creating -> running | error | deleting
//! running  -> stopped | error | deleting
//! stopped  -> running | error | deleting
//! error    -> deleting
//! deleting -> error
//! ```
//!
//! Soft deletion is recorded as a [`Tombstone`]. Once a server is tombstoned
//! nothing can clear it again.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::ServerId;

/// Longest accepted server name (DNS-1123 label limit).
pub const MAX_NAME_LEN: usize = 63;

/// Kind of workload a server runs. Determines the backend image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    Vpn,
    Dpi,
    Gateway,
    Analytics,
}

impl ServerType {
    /// All known server types.
    pub const ALL: [ServerType; 4] = [Self::Vpn, Self::Dpi, Self::Gateway, Self::Analytics];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vpn => "vpn",
            Self::Dpi => "dpi",
            Self::Gateway => "gateway",
            Self::Analytics => "analytics",
        }
    }
}

impl fmt::Display for ServerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vpn" => Ok(Self::Vpn),
            "dpi" => Ok(Self::Dpi),
            "gateway" => Ok(Self::Gateway),
            "analytics" => Ok(Self::Analytics),
            other => Err(format!("unknown server type '{other}'")),
        }
    }
}

/// Lifecycle status of a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Creating,
    Running,
    Stopped,
    Error,
    Deleting,
}

impl ServerStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Creating => "creating",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Error => "error",
            Self::Deleting => "deleting",
        }
    }

    /// Whether the lifecycle graph has an edge from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: ServerStatus) -> bool {
        use ServerStatus::{Creating, Deleting, Error, Running, Stopped};

        matches!(
            (self, next),
            (Creating, Running | Error | Deleting)
                | (Running, Stopped | Error | Deleting)
                | (Stopped, Running | Error | Deleting)
                | (Error, Deleting)
                | (Deleting, Error)
        )
    }

    /// Statuses a crashed process may leave behind mid-operation.
    #[must_use]
    pub const fn is_in_flight(self) -> bool {
        matches!(self, Self::Creating | Self::Deleting)
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "creating" => Ok(Self::Creating),
            "running" => Ok(Self::Running),
            "stopped" => Ok(Self::Stopped),
            "error" => Ok(Self::Error),
            "deleting" => Ok(Self::Deleting),
            other => Err(format!("unknown server status '{other}'")),
        }
    }
}

/// Soft-delete marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Tombstone {
    /// The server is active.
    #[default]
    Live,
    /// The server was logically removed at the given instant.
    Deleted { at: DateTime<Utc> },
}

impl Tombstone {
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted { .. })
    }

    #[must_use]
    pub const fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Live => None,
            Self::Deleted { at } => Some(*at),
        }
    }
}

/// All stored fields of a server, used to rehydrate persisted or observed
/// entities without replaying the state machine.
#[derive(Debug, Clone)]
pub struct ServerParts {
    pub id: ServerId,
    pub name: String,
    pub server_type: ServerType,
    pub status: ServerStatus,
    pub region: String,
    pub ip: String,
    pub port: u16,
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
    pub network: f64,
    pub resource_ref: Option<String>,
    pub replicas: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tombstone: Tombstone,
}

/// A managed infrastructure unit.
///
/// Identity, status and tombstone are private so every change goes through
/// the lifecycle methods. Observed facts (address, gauges, replica count) are
/// public because backends populate them opportunistically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    id: ServerId,
    pub name: String,
    #[serde(rename = "type")]
    pub server_type: ServerType,
    status: ServerStatus,
    pub region: String,
    pub ip: String,
    pub port: u16,
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
    pub network: f64,
    /// Backend-native identifier (container id or workload name).
    pub resource_ref: Option<String>,
    /// Desired replica count, on backends that have one.
    pub replicas: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    tombstone: Tombstone,
}

impl Server {
    /// Create a new server in `creating` status with a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MissingField`] for an empty region and
    /// [`DomainError::InvalidName`] when the name is not a DNS-1123 label.
    pub fn new(
        name: impl Into<String>,
        server_type: ServerType,
        region: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        let region = region.into();
        validate_name(&name)?;
        if region.trim().is_empty() {
            return Err(DomainError::MissingField { field: "region" });
        }

        let now = Utc::now();
        Ok(Self {
            id: ServerId::generate(),
            name,
            server_type,
            status: ServerStatus::Creating,
            region,
            ip: String::new(),
            port: 0,
            cpu: 0.0,
            memory: 0.0,
            disk: 0.0,
            network: 0.0,
            resource_ref: None,
            replicas: None,
            created_at: now,
            updated_at: now,
            tombstone: Tombstone::Live,
        })
    }

    /// Rebuild a server from stored or observed fields.
    #[must_use]
    pub fn from_parts(parts: ServerParts) -> Self {
        Self {
            id: parts.id,
            name: parts.name,
            server_type: parts.server_type,
            status: parts.status,
            region: parts.region,
            ip: parts.ip,
            port: parts.port,
            cpu: parts.cpu,
            memory: parts.memory,
            disk: parts.disk,
            network: parts.network,
            resource_ref: parts.resource_ref,
            replicas: parts.replicas,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
            tombstone: parts.tombstone,
        }
    }

    #[must_use]
    pub fn id(&self) -> &ServerId {
        &self.id
    }

    #[must_use]
    pub const fn status(&self) -> ServerStatus {
        self.status
    }

    #[must_use]
    pub const fn tombstone(&self) -> Tombstone {
        self.tombstone
    }

    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.tombstone.is_deleted()
    }

    /// Move to `next` if the lifecycle graph allows it.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Deleted`] for tombstoned servers and
    /// [`DomainError::InvalidTransition`] for edges not in the graph.
    pub fn transition(&mut self, next: ServerStatus) -> Result<(), DomainError> {
        self.ensure_live()?;
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    /// Rename the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is deleted or the name is invalid.
    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), DomainError> {
        self.ensure_live()?;
        let name = name.into();
        validate_name(&name)?;
        self.name = name;
        self.touch();
        Ok(())
    }

    /// Record a soft delete. Only servers in `deleting` can be tombstoned.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is already deleted or not in `deleting`.
    pub fn mark_deleted(&mut self, at: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_live()?;
        if self.status != ServerStatus::Deleting {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: ServerStatus::Deleting,
            });
        }
        self.tombstone = Tombstone::Deleted { at };
        self.updated_at = at;
        Ok(())
    }

    /// Bump `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn ensure_live(&self) -> Result<(), DomainError> {
        if self.tombstone.is_deleted() {
            return Err(DomainError::Deleted {
                id: self.id.to_string(),
            });
        }
        Ok(())
    }
}

/// Check that `name` is a DNS-1123 label.
///
/// # Errors
///
/// Returns [`DomainError::MissingField`] for an empty name and
/// [`DomainError::InvalidName`] otherwise.
pub fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.is_empty() {
        return Err(DomainError::MissingField { field: "name" });
    }
    let invalid = |reason| DomainError::InvalidName {
        name: name.to_string(),
        reason,
    };
    if name.len() > MAX_NAME_LEN {
        return Err(invalid("must be at most 63 characters"));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(invalid("only lowercase letters, digits and '-' are allowed"));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(invalid("must start and end with a letter or digit"));
    }
    Ok(())
}
