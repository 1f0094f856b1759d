//! Inbound adapters (driving side).
//!
//! - [`cli`] - operator command line over the lifecycle service

pub mod cli;
