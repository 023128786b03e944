//! The external API client capability, one instance per managed identity.
//!
//! The concrete client (request construction, endpoint semantics, wire
//! payloads) lives outside this crate; the manager only needs the three
//! operations below. Alternate client types (e.g. for integration tests)
//! are substituted wholesale through [`ClientFactory`].

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::Auth;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The API endpoint could not be reached. Logout de-authentication
    /// retries indefinitely on this variant and only this variant.
    #[error("API endpoint is not reachable")]
    EndpointUnreachable,
    #[error("API error: {0}")]
    Api(String),
}

/// Operations the manager consumes from a client.
#[async_trait]
pub trait Client: Send + Sync {
    /// Revoke the client's auth on the remote end.
    async fn delete_auth(&self) -> Result<(), ClientError>;

    /// Clear the client's local sensitive data.
    async fn clear_data(&self);

    /// Refresh the given token, returning the new auth.
    async fn auth_refresh(&self, token: &str) -> Result<Auth, ClientError>;
}

/// Constructs a client for a user id. Replaceable at any time via
/// `ClientManager::set_client_constructor`.
pub type ClientFactory = Box<dyn Fn(&str) -> Arc<dyn Client> + Send + Sync>;
