//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`orchestrator`] - `ScriptedOrchestrator`, an [`Orchestrator`](crate::port::Orchestrator)
//!   that records call order and injects latency and failures.
//! - [`journal`] - the shared call and write log, plus
//!   `RecordingServerRepository`.
//! - [`engine`] - `FakeContainerEngine`, an in-memory container engine.
//! - [`cluster`] - `FakeClusterApi`, an in-memory namespace.
//! - [`domain`] - builders for servers and requests.

pub mod cluster;
pub mod domain;
pub mod engine;
pub mod journal;
pub mod orchestrator;
