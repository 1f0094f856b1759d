//! Application services (use cases).
//!
//! - [`server`] - the server lifecycle service and its policy hooks

pub mod server;
