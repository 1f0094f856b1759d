//! Inbound ports (driving side): request shapes accepted by the lifecycle
//! service.

pub mod server;
