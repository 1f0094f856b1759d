use thiserror::Error;

use crate::domain::error::DomainError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unsupported orchestrator type: {0}")]
    UnsupportedOrchestrator(String),

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// A backend call that failed, with the underlying cause.
#[derive(Error, Debug)]
#[error("{backend} {operation} failed: {message}")]
pub struct InfraError {
    /// Backend that was called (`docker`, `kubernetes`).
    pub backend: &'static str,
    /// Operation that was attempted.
    pub operation: &'static str,
    /// Human-readable cause.
    pub message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl InfraError {
    pub fn new(backend: &'static str, operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            backend,
            operation,
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error, keeping its text as the message.
    pub fn wrap<E>(backend: &'static str, operation: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            backend,
            operation,
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// A backend call that exceeded its deadline.
    #[must_use]
    pub fn timed_out(backend: &'static str, operation: &'static str, after: std::time::Duration) -> Self {
        Self::new(backend, operation, format!("timed out after {after:?}"))
    }
}

/// Discoverable classification of an [`Error`], for transport layers that
/// map failures onto protocol status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Infra,
    Unconfigured,
    Config,
    Storage,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Infra(#[from] InfraError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("{0} not initialized")]
    Unconfigured(&'static str),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl Error {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Domain(DomainError::InvalidTransition { .. }) => ErrorKind::Conflict,
            Self::Domain(DomainError::Deleted { .. }) | Self::NotFound { .. } => {
                ErrorKind::NotFound
            }
            Self::Domain(_) => ErrorKind::Validation,
            Self::Infra(_) => ErrorKind::Infra,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Unconfigured(_) => ErrorKind::Unconfigured,
            Self::Json(_) | Self::Io(_) | Self::Connection(_) | Self::Database(_) | Self::Parse(_) => {
                ErrorKind::Storage
            }
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
