//! Runtime configuration for the health monitor and the resolution core.

use std::time::Duration;

use helix_transport::grpc::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};
use helix_transport::{DEFAULT_CACHE_ENDPOINT, DEFAULT_HEALTH_ENDPOINT};
use helix_types::env_utils::{env_string_or, env_var_or};

/// Worker-pool label stamped onto job rows created by this resolver.
pub const DEFAULT_NODE_LABEL: &str = "gpu-worker-pool";

/// Configuration for the background health probe loop.
#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Health endpoint of the remote worker pool.
    pub endpoint: String,
    /// Time between probes. Default: 5s
    pub probe_interval: Duration,
    /// Deadline for a single probe, connect included. Default: 2s
    pub probe_timeout: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_HEALTH_ENDPOINT.to_string(),
            probe_interval: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(2),
        }
    }
}

impl HealthConfig {
    /// Read overrides from `HELIX_HEALTH_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            endpoint: env_string_or("HELIX_HEALTH_ENDPOINT", DEFAULT_HEALTH_ENDPOINT),
            probe_interval: Duration::from_millis(env_var_or(
                "HELIX_HEALTH_PROBE_INTERVAL_MS",
                5000,
            )),
            probe_timeout: Duration::from_millis(env_var_or("HELIX_HEALTH_PROBE_TIMEOUT_MS", 2000)),
        }
    }
}

/// Configuration for the tiered resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Cache/queue endpoint of the remote gateway.
    pub cache_endpoint: String,
    /// Per-request deadline for cache RPCs.
    pub request_timeout: Duration,
    /// TCP connect deadline for the cache channel.
    pub connect_timeout: Duration,
    /// Compute-node label recorded on jobs this resolver dispatches.
    pub node_label: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_endpoint: DEFAULT_CACHE_ENDPOINT.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            node_label: DEFAULT_NODE_LABEL.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Read overrides from `HELIX_CACHE_*` / `HELIX_NODE_LABEL` environment
    /// variables.
    pub fn from_env() -> Self {
        Self {
            cache_endpoint: env_string_or("HELIX_CACHE_ENDPOINT", DEFAULT_CACHE_ENDPOINT),
            request_timeout: Duration::from_millis(env_var_or(
                "HELIX_CACHE_REQUEST_TIMEOUT_MS",
                DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
            )),
            connect_timeout: Duration::from_millis(env_var_or(
                "HELIX_CACHE_CONNECT_TIMEOUT_MS",
                DEFAULT_CONNECT_TIMEOUT.as_millis() as u64,
            )),
            node_label: env_string_or("HELIX_NODE_LABEL", DEFAULT_NODE_LABEL),
        }
    }

    /// Same config pointed at a different cache endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.cache_endpoint = endpoint.into();
        self
    }
}
