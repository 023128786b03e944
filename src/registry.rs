//! Identity→client registry with lazy construction.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::auth::anonymous_user_id;
use crate::client::{Client, ClientFactory};

/// Owns the mapping from user id to client instance.
///
/// Clients are created on first access through the configured factory and
/// removed on logout. A client is never shared across identities.
pub struct ClientRegistry {
    inner: Mutex<Inner>,
    anonymous_ids: AtomicU64,
}

struct Inner {
    clients: HashMap<String, Arc<dyn Client>>,
    new_client: ClientFactory,
}

impl ClientRegistry {
    pub fn new(new_client: ClientFactory) -> Self {
        Self {
            inner: Mutex::new(Inner {
                clients: HashMap::new(),
                new_client,
            }),
            anonymous_ids: AtomicU64::new(0),
        }
    }

    /// Return the client for the given user id, constructing it if needed.
    ///
    /// Lookup and construction happen under one lock, so concurrent calls
    /// for the same unseen id construct exactly one client.
    pub fn get_or_create(&self, user_id: &str) -> Arc<dyn Client> {
        let mut inner = self.inner.lock();

        if let Some(client) = inner.clients.get(user_id) {
            return Arc::clone(client);
        }

        debug!(user_id = %user_id, "Creating new client");
        let client = (inner.new_client)(user_id);
        inner
            .clients
            .insert(user_id.to_string(), Arc::clone(&client));

        client
    }

    /// Return the client for the given user id if one exists.
    pub fn get(&self, user_id: &str) -> Option<Arc<dyn Client>> {
        self.inner.lock().clients.get(user_id).map(Arc::clone)
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.inner.lock().clients.contains_key(user_id)
    }

    /// Remove and return the client for the given user id. A subsequent
    /// `get_or_create` constructs a fresh instance.
    pub fn remove(&self, user_id: &str) -> Option<Arc<dyn Client>> {
        self.inner.lock().clients.remove(user_id)
    }

    /// Replace the client construction hook. All subsequent constructions
    /// use the new factory; existing clients are unaffected.
    pub fn set_client_constructor(&self, new_client: ClientFactory) {
        self.inner.lock().new_client = new_client;
    }

    /// Allocate a fresh, globally unique anonymous user id. Prior ids are
    /// never reused, so anonymous sessions are always distinct.
    pub fn next_anonymous_id(&self) -> String {
        anonymous_user_id(self.anonymous_ids.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
