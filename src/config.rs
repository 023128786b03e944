use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub relay: RelayConfig,
}

#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Scheme used for every request (normally "https").
    pub scheme: String,
    /// Canonical API host. `host == primary_host` means "not proxying".
    pub primary_host: String,
    /// Candidate alternate hosts handed to the prober on switch-over.
    pub proxy_candidates: Vec<String>,
    /// How long a switched-over proxy stays active before the automatic
    /// revert to the primary host.
    pub proxy_use_duration_secs: u64,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Capacity of the client-auth and bridge channels. Once the bridge
    /// consumer falls this far behind, producers block.
    pub channel_capacity: usize,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            primary_host: "api.example.com".to_string(),
            proxy_candidates: Vec::new(),
            proxy_use_duration_secs: 86400, // 24 hours
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 16,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let scheme =
            std::env::var("CLIENT_MANAGER_SCHEME").unwrap_or_else(|_| "https".to_string());

        let primary_host = std::env::var("CLIENT_MANAGER_PRIMARY_HOST")
            .unwrap_or_else(|_| EndpointConfig::default().primary_host);

        let proxy_candidates = std::env::var("CLIENT_MANAGER_PROXY_CANDIDATES")
            .map(|v| parse_host_list(&v))
            .unwrap_or_default();

        let proxy_use_duration_secs = std::env::var("CLIENT_MANAGER_PROXY_USE_DURATION_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86400);

        let channel_capacity = std::env::var("CLIENT_MANAGER_RELAY_CAPACITY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(16);

        let config = Config {
            endpoint: EndpointConfig {
                scheme,
                primary_host,
                proxy_candidates,
                proxy_use_duration_secs,
            },
            relay: RelayConfig { channel_capacity },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.primary_host.is_empty() {
            return Err(ConfigError::ValidationError(
                "primary host cannot be empty".to_string(),
            ));
        }

        if self.endpoint.scheme != "https" && self.endpoint.scheme != "http" {
            return Err(ConfigError::ValidationError(format!(
                "unsupported scheme: {}",
                self.endpoint.scheme
            )));
        }

        if self.relay.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "relay channel capacity must be at least 1".to_string(),
            ));
        }

        if self.endpoint.proxy_candidates.is_empty() {
            tracing::warn!(
                "No proxy candidates configured. Failover switch-over will \
                 have nothing to probe."
            );
        }

        Ok(())
    }
}

/// Parse a comma-separated host list, trimming whitespace and dropping
/// empty entries.
fn parse_host_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
