//! Endpoint failover: the active scheme/host pair, the proxy gate, and the
//! switch-over / revert state machine.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::EndpointConfig;

/// Discovers one currently reachable host among the given candidates.
///
/// The production implementation (DNS-over-HTTPS probing) lives outside
/// this crate; tests substitute their own.
#[async_trait]
pub trait EndpointProber: Send + Sync {
    async fn find_reachable_host(&self, candidates: &[String]) -> anyhow::Result<String>;
}

#[derive(Debug, Error)]
pub enum FailoverError {
    #[error("proxying is not allowed")]
    ProxyNotAllowed,
    #[error("failed to find a usable proxy: {0}")]
    NoReachableHost(anyhow::Error),
}

/// Owns the endpoint state consulted by every request-building path.
///
/// `host == primary_host` is the canonical "not proxying" state. The
/// scheme, host, and proxy gate are guarded as one unit so reads observe
/// them consistently.
pub struct FailoverController {
    endpoint: Arc<EndpointState>,
    proxy_candidates: Vec<String>,
    prober: Arc<dyn EndpointProber>,
}

struct EndpointState {
    inner: RwLock<EndpointInner>,
    primary_host: String,
    proxy_use_duration: Duration,
}

struct EndpointInner {
    scheme: String,
    host: String,
    allow_proxy: bool,
}

impl FailoverController {
    pub fn new(config: &EndpointConfig, prober: Arc<dyn EndpointProber>) -> Self {
        Self {
            endpoint: Arc::new(EndpointState {
                inner: RwLock::new(EndpointInner {
                    scheme: config.scheme.clone(),
                    host: config.primary_host.clone(),
                    allow_proxy: false,
                }),
                primary_host: config.primary_host.clone(),
                proxy_use_duration: Duration::from_secs(config.proxy_use_duration_secs),
            }),
            proxy_candidates: config.proxy_candidates.clone(),
            prober,
        }
    }

    /// The full root URL (scheme + host) requests should be built against.
    pub async fn get_root_url(&self) -> String {
        let inner = self.endpoint.inner.read().await;
        format!("{}://{}", inner.scheme, inner.host)
    }

    /// Whether the consumer has allowed switching to a proxy if need be.
    pub async fn is_proxy_allowed(&self) -> bool {
        self.endpoint.inner.read().await.allow_proxy
    }

    /// Whether requests are currently being proxied.
    pub async fn is_proxy_enabled(&self) -> bool {
        self.endpoint.inner.read().await.host != self.endpoint.primary_host
    }

    /// Allow switching over to a proxy if need be.
    pub async fn allow_proxy(&self) {
        self.endpoint.inner.write().await.allow_proxy = true;
    }

    /// Prevent proxying and immediately revert to the primary host.
    pub async fn disallow_proxy(&self) {
        let mut inner = self.endpoint.inner.write().await;
        inner.allow_proxy = false;
        inner.host = self.endpoint.primary_host.clone();
    }

    /// Switch to a currently reachable alternate host.
    ///
    /// The write lock is held across the probe so switch-over serializes
    /// with every other endpoint-state mutation. On probe failure the state
    /// is left unchanged.
    pub async fn switch_to_reachable_server(&self) -> Result<String, FailoverError> {
        let mut inner = self.endpoint.inner.write().await;

        info!("Attempting to switch to a proxy");

        if !inner.allow_proxy {
            return Err(FailoverError::ProxyNotAllowed);
        }

        let proxy = self
            .prober
            .find_reachable_host(&self.proxy_candidates)
            .await
            .map_err(FailoverError::NoReachableHost)?;

        info!(proxy = %proxy, "Switching to a proxy");

        // If the host is currently the primary, this is the first time we
        // are enabling a proxy, so the revert is armed now. The window is
        // anchored to this switch: a later switch while the revert is
        // pending does not reset it, and the late write is idempotent.
        if inner.host == self.endpoint.primary_host {
            let endpoint = Arc::clone(&self.endpoint);
            tokio::spawn(async move {
                tokio::time::sleep(endpoint.proxy_use_duration).await;
                endpoint.inner.write().await.host = endpoint.primary_host.clone();
            });
        }

        inner.host = proxy.clone();

        Ok(proxy)
    }
}
