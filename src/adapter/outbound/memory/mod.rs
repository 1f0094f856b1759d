//! In-memory repositories.
//!
//! Used when no database is configured and throughout the tests. State lives
//! for the life of the process.

mod observation;
mod policy;
mod server;

pub use observation::{MemoryHealthRepository, MemoryStatsRepository};
pub use policy::{MemoryBackupRepository, MemoryScalingRepository, MemoryUpdateRepository};
pub use server::MemoryServerRepository;
