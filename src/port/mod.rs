//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the seams between the lifecycle service and the systems it
//! drives. Adapters implement the outbound ports; transports consume the
//! inbound request shapes.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!     ┌──────────────┤  ServerService          ├──────────────┐
//!     │              └─────────────────────────┘              │
//!     ▼                                                       ▼
//! ┌──────────────┐                                   ┌────────────────┐
//! │ Orchestrator │  docker | kubernetes              │  Repositories  │  memory | sqlite
//! └──────────────┘                                   └────────────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`Orchestrator`] - infrastructure effects on the active backend
//! - [`ServerRepository`] - source of truth for server entities
//! - [`StatsRepository`], [`HealthRepository`] - observation history
//! - [`ScalingRepository`], [`BackupRepository`], [`UpdateRepository`] - policy records

pub mod inbound;
pub mod outbound;

pub use inbound::server::{CreateServerRequest, UpdateServerRequest};
pub use outbound::orchestrator::{Orchestrator, ProvisionOptions};
pub use outbound::repository::{
    BackupRepository, HealthRepository, ScalingRepository, ServerFilter, ServerRepository,
    StatsRepository, UpdateRepository,
};
