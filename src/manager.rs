//! The `ClientManager` facade composing the registry, token cache,
//! failover controller, and auth relay.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

use crate::auth::{self, ClientAuth};
use crate::client::{Client, ClientError, ClientFactory};
use crate::config::Config;
use crate::failover::{EndpointProber, FailoverController, FailoverError};
use crate::registry::ClientRegistry;
use crate::relay;
use crate::tokens::TokenCache;

/// Manager of per-user API clients, their credentials, and the active
/// endpoint. The single shared object everything else interacts through.
pub struct ClientManager {
    registry: Arc<ClientRegistry>,
    tokens: TokenCache,
    failover: FailoverController,
    client_auths: mpsc::Sender<ClientAuth>,
    bridge_auths: Mutex<Option<mpsc::Receiver<ClientAuth>>>,
}

impl ClientManager {
    /// Create a manager and start its auth relay loop.
    ///
    /// Must be called from within a Tokio runtime. The relay loop runs for
    /// the lifetime of the manager's channels.
    pub fn new(
        config: &Config,
        new_client: ClientFactory,
        prober: Arc<dyn EndpointProber>,
    ) -> Self {
        let registry = Arc::new(ClientRegistry::new(new_client));
        let tokens = TokenCache::new(Arc::clone(&registry));
        let failover = FailoverController::new(&config.endpoint, prober);

        let (client_tx, client_rx) = mpsc::channel(config.relay.channel_capacity);
        let (bridge_tx, bridge_rx) = mpsc::channel(config.relay.channel_capacity);

        tokio::spawn(relay::run(
            Arc::clone(&registry),
            tokens.clone(),
            client_rx,
            bridge_tx,
        ));

        Self {
            registry,
            tokens,
            failover,
            client_auths: client_tx,
            bridge_auths: Mutex::new(Some(bridge_rx)),
        }
    }

    /// Return the client for the given user id, creating it if it does not
    /// exist already.
    pub fn get_client(&self, user_id: &str) -> Arc<dyn Client> {
        self.registry.get_or_create(user_id)
    }

    /// Create a client under a fresh anonymous identity.
    ///
    /// Anonymous identities are never reused; every call yields a distinct
    /// session.
    pub fn get_anonymous_client(&self) -> (String, Arc<dyn Client>) {
        let user_id = self.registry.next_anonymous_id();
        let client = self.registry.get_or_create(&user_id);
        (user_id, client)
    }

    /// Log out the client with the given user id and ensure its sensitive
    /// data is successfully cleared.
    ///
    /// The registry entry is removed synchronously, so a subsequent
    /// `get_client` creates a fresh instance. Remote de-authentication and
    /// local data clearing complete in a background task the caller never
    /// waits on; de-authentication retries for as long as the endpoint is
    /// unreachable and is skipped entirely for anonymous identities.
    pub fn logout_client(&self, user_id: &str) {
        let Some(client) = self.registry.remove(user_id) else {
            return;
        };

        let tokens = self.tokens.clone();
        let user_id = user_id.to_string();

        tokio::spawn(async move {
            if !auth::is_anonymous(&user_id) {
                while let Err(ClientError::EndpointUnreachable) = client.delete_auth().await {
                    warn!(
                        user_id = %user_id,
                        "Logging out client failed because API was not reachable, retrying..."
                    );
                }
            }

            client.clear_data().await;
            tokens.clear_token(&user_id);
        });
    }

    /// Replace the client construction hook (e.g. to substitute a client
    /// type for integration tests).
    pub fn set_client_constructor(&self, new_client: ClientFactory) {
        self.registry.set_client_constructor(new_client);
    }

    pub fn get_token(&self, user_id: &str) -> Option<String> {
        self.tokens.get_token(user_id)
    }

    /// Set the token for the given user id if it wasn't already set.
    /// The token does not expire.
    pub fn set_token_if_unset(&self, user_id: &str, token: &str) {
        self.tokens.set_token_if_unset(user_id, token);
    }

    /// A sender on which clients publish their auth events.
    pub fn client_auth_sender(&self) -> mpsc::Sender<ClientAuth> {
        self.client_auths.clone()
    }

    /// Take the receiving end of the bridge auth channel.
    ///
    /// Auth events are delivered strictly in the order clients sent them.
    /// There is a single receiver; every call after the first returns
    /// `None`.
    pub fn take_auth_updates(&self) -> Option<mpsc::Receiver<ClientAuth>> {
        self.bridge_auths.lock().take()
    }

    /// The full root URL (scheme + host) requests should be built against.
    pub async fn get_root_url(&self) -> String {
        self.failover.get_root_url().await
    }

    pub async fn is_proxy_allowed(&self) -> bool {
        self.failover.is_proxy_allowed().await
    }

    pub async fn is_proxy_enabled(&self) -> bool {
        self.failover.is_proxy_enabled().await
    }

    pub async fn allow_proxy(&self) {
        self.failover.allow_proxy().await;
    }

    pub async fn disallow_proxy(&self) {
        self.failover.disallow_proxy().await;
    }

    /// Switch to a reachable server (a proxy, or the primary once it is
    /// reachable again).
    pub async fn switch_to_reachable_server(&self) -> Result<String, FailoverError> {
        self.failover.switch_to_reachable_server().await
    }
}
