//! The auth relay: a single forwarding loop between clients and the
//! external bridge consumer.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::auth::ClientAuth;
use crate::registry::ClientRegistry;
use crate::tokens::TokenCache;

/// Forward every client auth event to the bridge, applying it to the token
/// cache on the way through.
///
/// Events are handled strictly in arrival order. Forwarding blocks until
/// the consumer accepts, so a slow consumer backpressures producers once
/// the channels fill. The loop ends when every client sender or the bridge
/// receiver is dropped.
pub(crate) async fn run(
    registry: Arc<ClientRegistry>,
    tokens: TokenCache,
    mut client_auths: mpsc::Receiver<ClientAuth>,
    bridge_auths: mpsc::Sender<ClientAuth>,
) {
    while let Some(event) = client_auths.recv().await {
        debug!(user_id = %event.user_id, "Received auth from client");
        apply(&registry, &tokens, &event);

        debug!(user_id = %event.user_id, "Forwarding auth to bridge");
        if bridge_auths.send(event).await.is_err() {
            break;
        }
    }
}

/// Update or clear the cached token based on the received event.
fn apply(registry: &ClientRegistry, tokens: &TokenCache, event: &ClientAuth) {
    // Events for identities we are not managing are forwarded but never
    // applied to the cache.
    if !registry.contains(&event.user_id) {
        info!(user_id = %event.user_id, "Not handling auth for unmanaged client");
        return;
    }

    match &event.auth {
        None => tokens.clear_token(&event.user_id),
        Some(auth) => tokens.set_token(&event.user_id, auth.gen_token(), auth.ttl()),
    }
}
