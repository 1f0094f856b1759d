//! Container-runtime backend.
//!
//! - [`engine`] - the [`ContainerEngine`] seam and its value types
//! - [`client`] - `bollard` implementation of the seam
//! - [`orchestrator`] - [`DockerOrchestrator`], the [`Orchestrator`](crate::port::Orchestrator) impl
//! - [`settings`] - endpoint configuration

pub mod client;
pub mod engine;
pub mod orchestrator;
pub mod settings;

pub use client::BollardEngine;
pub use engine::{ContainerEngine, ContainerSample, ContainerSpec, ContainerState, ContainerSummary};
pub use orchestrator::DockerOrchestrator;
pub use settings::DockerConfig;

/// Backend name used in logs and errors.
pub const BACKEND: &str = "docker";
