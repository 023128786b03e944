//! Identity→token cache, coordinated with the per-token expiration watchers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::info;

use super::expiration::{self, TokenExpiration};
use crate::registry::ClientRegistry;

/// Owns the token map and the expiration table.
///
/// Cheaply cloneable; clones share the same state. Exactly one expiration
/// watcher is live per identity: installing a new token retires the
/// previous generation's watcher before the new one is spawned.
#[derive(Clone)]
pub struct TokenCache {
    shared: Arc<Shared>,
}

pub(super) struct Shared {
    tokens: Mutex<HashMap<String, String>>,
    expirations: Mutex<HashMap<String, TokenExpiration>>,
    registry: Arc<ClientRegistry>,
}

impl TokenCache {
    pub fn new(registry: Arc<ClientRegistry>) -> Self {
        Self {
            shared: Arc::new(Shared {
                tokens: Mutex::new(HashMap::new()),
                expirations: Mutex::new(HashMap::new()),
                registry,
            }),
        }
    }

    pub fn get_token(&self, user_id: &str) -> Option<String> {
        self.shared.get_token(user_id)
    }

    /// Set the token for the given user if it wasn't already set.
    /// The token does not expire.
    pub fn set_token_if_unset(&self, user_id: &str, token: &str) {
        let mut tokens = self.shared.tokens.lock();

        if tokens.contains_key(user_id) {
            return;
        }

        info!(user_id = %user_id, "Setting token because it is currently unset");
        tokens.insert(user_id.to_string(), token.to_string());
    }

    /// Install a token and (re)arm its expiration.
    ///
    /// The token lock is held across both the token write and the
    /// expiration swap: a concurrent `set_token` for the same user cannot
    /// interleave and leave two live watchers.
    pub fn set_token(&self, user_id: &str, token: String, ttl: Duration) {
        let mut tokens = self.shared.tokens.lock();

        info!(user_id = %user_id, "Updating token");
        tokens.insert(user_id.to_string(), token);

        let cancel = self.arm_expiration(user_id);
        tokio::spawn(expiration::watch(
            Arc::clone(&self.shared),
            user_id.to_string(),
            ttl,
            cancel,
        ));
    }

    /// Remove the token entry.
    ///
    /// Deliberately leaves any pending watcher armed: on firing it finds no
    /// token and exits without refreshing.
    pub fn clear_token(&self, user_id: &str) {
        let mut tokens = self.shared.tokens.lock();

        info!(user_id = %user_id, "Clearing token");
        tokens.remove(user_id);
    }

    /// Replace the expiration record for the user. Dropping the previous
    /// record signals its watcher to exit without refreshing.
    fn arm_expiration(&self, user_id: &str) -> tokio::sync::oneshot::Receiver<()> {
        let mut expirations = self.shared.expirations.lock();

        let (record, cancel) = TokenExpiration::new();
        expirations.insert(user_id.to_string(), record);

        cancel
    }
}

impl Shared {
    pub(super) fn get_token(&self, user_id: &str) -> Option<String> {
        self.tokens.lock().get(user_id).cloned()
    }

    pub(super) fn registry(&self) -> &ClientRegistry {
        &self.registry
    }
}
