//! Cluster backend.
//!
//! - [`api`] - the [`ClusterApi`] seam
//! - [`client`] - `kube` implementation of the seam
//! - [`resources`] - Deployment/Service manifests and status derivation
//! - [`orchestrator`] - [`KubernetesOrchestrator`]
//! - [`settings`] - cluster connection configuration

pub mod api;
pub mod client;
pub mod orchestrator;
pub mod resources;
pub mod settings;

pub use api::ClusterApi;
pub use client::KubeClusterApi;
pub use orchestrator::KubernetesOrchestrator;
pub use settings::KubernetesConfig;

/// Backend name used in logs and errors.
pub const BACKEND: &str = "kubernetes";
