//! Container image selection per server type.

use serde::Deserialize;

use crate::domain::server::ServerType;

/// Image reference for each [`ServerType`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub vpn: String,
    pub dpi: String,
    pub gateway: String,
    pub analytics: String,
}

impl ImageConfig {
    /// Image to run for `server_type`.
    #[must_use]
    pub fn image_for(&self, server_type: ServerType) -> &str {
        match server_type {
            ServerType::Vpn => &self.vpn,
            ServerType::Dpi => &self.dpi,
            ServerType::Gateway => &self.gateway,
            ServerType::Analytics => &self.analytics,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            vpn: "silence/vpn-core:latest".into(),
            dpi: "silence/dpi-bypass:latest".into(),
            gateway: "silence/gateway:latest".into(),
            analytics: "silence/analytics:latest".into(),
        }
    }
}
