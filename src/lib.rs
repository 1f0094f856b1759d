//! Server Manager - lifecycle management for VPN, DPI, gateway and
//! analytics servers.
//!
//! One lifecycle service drives a pluggable orchestration backend (a single
//! Docker host or a Kubernetes namespace) and keeps server records in a
//! repository (in memory or SQLite).
//!
//! # Architecture
//!
//! - [`domain`] - Server entity, lifecycle state machine, observations, policies
//! - [`port`] - Orchestrator and repository contracts, request shapes
//! - [`adapter`] - Docker, Kubernetes, memory and SQLite adapters; the CLI
//! - [`application`] - [`ServerService`](application::server::ServerService)
//! - [`infrastructure`] - Configuration, logging, factories, bootstrap
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `testkit` - Fake container engine, fake cluster API and a scripted
//!   orchestrator for tests
//!
//! # Example
//!
//! ```no_run
//! use server_manager::infrastructure::bootstrap;
//! use server_manager::infrastructure::config::settings::Config;
//! use server_manager::domain::server::ServerType;
//! use server_manager::port::CreateServerRequest;
//!
//! # async fn run() -> server_manager::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let service = bootstrap::build_service(&config).await?;
//! let server = service
//!     .create_server(CreateServerRequest::new("vpn-1", ServerType::Vpn, "eu-west-1"))
//!     .await?;
//! println!("{} is {}", server.name, server.status());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
