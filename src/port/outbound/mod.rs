//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe infrastructure dependencies: the orchestration
//! backend and the persistence of servers and their secondary records.

pub mod orchestrator;
pub mod repository;
