//! Builders for domain values used across tests.

use crate::domain::server::{Server, ServerType};
use crate::port::inbound::server::CreateServerRequest;

/// A live server in `creating`.
///
/// # Panics
///
/// Panics if `name` is not a valid server name.
#[must_use]
pub fn server(name: &str, server_type: ServerType) -> Server {
    Server::new(name, server_type, "us-east-1").expect("test server name should be valid")
}

/// A create request in region `us-east-1`.
#[must_use]
pub fn create_request(name: &str, server_type: ServerType) -> CreateServerRequest {
    CreateServerRequest::new(name, server_type, "us-east-1")
}
