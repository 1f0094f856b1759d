//! Cluster connection settings.

use serde::Deserialize;

/// Kubernetes API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KubernetesConfig {
    /// Path to a kubeconfig file. When unset the client is inferred from
    /// the environment (`KUBECONFIG`, `~/.kube/config`, in-cluster account).
    pub kubeconfig: Option<String>,
    /// Namespace every resource is created in.
    pub namespace: String,
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            namespace: "default".into(),
        }
    }
}
