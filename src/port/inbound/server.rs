//! Request shapes for the server lifecycle operations.

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::server::ServerType;
use crate::port::outbound::orchestrator::ProvisionOptions;

/// Input to create a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateServerRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub server_type: ServerType,
    pub region: String,
    #[serde(default)]
    pub options: ProvisionOptions,
}

impl CreateServerRequest {
    pub fn new(name: impl Into<String>, server_type: ServerType, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server_type,
            region: region.into(),
            options: ProvisionOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ProvisionOptions) -> Self {
        self.options = options;
        self
    }

    /// Check that required fields are present.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MissingField`] for the first blank field.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::MissingField { field: "name" });
        }
        if self.region.trim().is_empty() {
            return Err(DomainError::MissingField { field: "region" });
        }
        Ok(())
    }
}

/// Patch applied to a persisted server.
///
/// Only the name can change today, and the change is not propagated to
/// existing backend resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateServerRequest {
    #[serde(default)]
    pub name: Option<String>,
}
