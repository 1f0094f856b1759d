//! Factory modules for building infrastructure components.
//!
//! # Submodules
//!
//! - [`orchestrator`] - Backend selection and construction
//! - [`persistence`] - Repository construction for the configured storage

pub mod orchestrator;
pub mod persistence;

pub use orchestrator::{Backend, OrchestratorFactory};
pub use persistence::{build_repositories, Repositories};
