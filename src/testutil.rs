//! Shared test helpers — available to all `#[cfg(test)]` modules in the crate.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::auth::Auth;
use crate::client::{Client, ClientError, ClientFactory};
use crate::config::{Config, EndpointConfig, RelayConfig};
use crate::failover::EndpointProber;

/// A `Config` suitable for unit tests: three proxy candidates and a short
/// (100 second) proxy use window for paused-clock tests.
pub fn test_config() -> Config {
    Config {
        endpoint: EndpointConfig {
            scheme: "https".to_string(),
            primary_host: "api.test.example.com".to_string(),
            proxy_candidates: vec![
                "proxy1.test".to_string(),
                "proxy2.test".to_string(),
                "proxy3.test".to_string(),
            ],
            proxy_use_duration_secs: 100,
        },
        relay: RelayConfig {
            channel_capacity: 8,
        },
    }
}

/// Poll until the condition holds, yielding between attempts. Panics if it
/// does not hold within the retry budget (virtual time under a paused
/// clock, ~2 wall-clock seconds otherwise).
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

/// An in-memory client that records every call.
///
/// `delete_auth` outcomes are scriptable per call; once the script drains,
/// further calls succeed.
#[derive(Default)]
pub struct MockClient {
    refresh_calls: Mutex<Vec<String>>,
    refresh_fails: AtomicBool,
    delete_auth_script: Mutex<VecDeque<Result<(), ClientError>>>,
    delete_auth_calls: AtomicUsize,
    data_cleared: AtomicBool,
}

impl MockClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue outcomes for upcoming `delete_auth` calls.
    pub fn script_delete_auth(
        &self,
        outcomes: impl IntoIterator<Item = Result<(), ClientError>>,
    ) {
        self.delete_auth_script.lock().extend(outcomes);
    }

    /// Make every subsequent `auth_refresh` fail.
    pub fn fail_refreshes(&self) {
        self.refresh_fails.store(true, Ordering::SeqCst);
    }

    /// Tokens passed to `auth_refresh`, in call order.
    pub fn refresh_calls(&self) -> Vec<String> {
        self.refresh_calls.lock().clone()
    }

    pub fn delete_auth_calls(&self) -> usize {
        self.delete_auth_calls.load(Ordering::SeqCst)
    }

    pub fn data_cleared(&self) -> bool {
        self.data_cleared.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Client for MockClient {
    async fn delete_auth(&self) -> Result<(), ClientError> {
        self.delete_auth_calls.fetch_add(1, Ordering::SeqCst);
        self.delete_auth_script.lock().pop_front().unwrap_or(Ok(()))
    }

    async fn clear_data(&self) {
        self.data_cleared.store(true, Ordering::SeqCst);
    }

    async fn auth_refresh(&self, token: &str) -> Result<Auth, ClientError> {
        self.refresh_calls.lock().push(token.to_string());

        if self.refresh_fails.load(Ordering::SeqCst) {
            return Err(ClientError::Api("refresh rejected".to_string()));
        }

        Ok(Auth {
            uid: "uid-refreshed".to_string(),
            access_token: "acc-refreshed".to_string(),
            expires_in: 3600,
        })
    }
}

/// A client factory that hands out one [`MockClient`] per construction and
/// keeps a handle to every client it built.
#[derive(Default)]
pub struct MockClientPool {
    clients: Mutex<HashMap<String, Arc<MockClient>>>,
    constructions: AtomicUsize,
}

impl MockClientPool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A [`ClientFactory`] that records its constructions in this pool.
    pub fn factory(pool: &Arc<Self>) -> ClientFactory {
        let pool = Arc::clone(pool);
        Box::new(move |user_id| pool.construct(user_id))
    }

    fn construct(&self, user_id: &str) -> Arc<dyn Client> {
        self.constructions.fetch_add(1, Ordering::SeqCst);
        let client = MockClient::new();
        self.clients
            .lock()
            .insert(user_id.to_string(), Arc::clone(&client));
        client
    }

    /// The most recently constructed client for the given user id.
    pub fn get(&self, user_id: &str) -> Option<Arc<MockClient>> {
        self.clients.lock().get(user_id).map(Arc::clone)
    }

    pub fn construction_count(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }
}

/// A prober whose set of reachable hosts is controlled by the test.
pub struct MockProber {
    reachable: Mutex<Vec<String>>,
}

impl MockProber {
    pub fn new(reachable: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            reachable: Mutex::new(reachable.iter().map(|h| h.to_string()).collect()),
        })
    }

    pub fn set_reachable(&self, reachable: &[&str]) {
        *self.reachable.lock() = reachable.iter().map(|h| h.to_string()).collect();
    }
}

#[async_trait]
impl EndpointProber for MockProber {
    async fn find_reachable_host(&self, candidates: &[String]) -> anyhow::Result<String> {
        let reachable = self.reachable.lock();
        candidates
            .iter()
            .find(|c| reachable.contains(c))
            .cloned()
            .ok_or_else(|| {
                anyhow::anyhow!("none of the {} candidates responded", candidates.len())
            })
    }
}
