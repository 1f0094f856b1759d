//! Outbound adapters (driven side).
//!
//! - [`docker`] and [`kubernetes`] implement the orchestrator port
//! - [`memory`] and [`sqlite`] implement the repository ports

pub mod docker;
pub mod image;
pub mod kubernetes;
pub mod labels;
pub mod memory;
pub mod sqlite;
