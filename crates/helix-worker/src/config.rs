//! Worker runtime configuration.

use std::net::SocketAddr;
use std::time::Duration;

use helix_transport::DEFAULT_CACHE_ENDPOINT;
use helix_types::env_utils::{env_string_or, env_var, env_var_or};
use helix_types::ESM2_LARGE;

/// Default listener for the liveness endpoint the monitor probes.
pub const DEFAULT_HEALTH_LISTEN: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 50051);

/// Configuration for one worker process.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Cache/queue endpoint of the remote gateway.
    pub cache_endpoint: String,
    /// Model identity this worker computes for.
    pub model_id: String,
    /// Upper bound on tasks leased per poll cycle.
    pub max_batch_size: u32,
    /// Sleep between poll cycles. Sensible range 500ms-1s.
    pub backoff: Duration,
    /// Listener address for the liveness endpoint.
    pub health_listen_addr: SocketAddr,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_endpoint: DEFAULT_CACHE_ENDPOINT.to_string(),
            model_id: ESM2_LARGE.to_string(),
            max_batch_size: 4,
            backoff: Duration::from_millis(500),
            health_listen_addr: DEFAULT_HEALTH_LISTEN,
        }
    }
}

impl WorkerConfig {
    /// Read overrides from `HELIX_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            cache_endpoint: env_string_or("HELIX_CACHE_ENDPOINT", DEFAULT_CACHE_ENDPOINT),
            model_id: env_string_or("HELIX_MODEL_ID", ESM2_LARGE),
            max_batch_size: env_var_or("HELIX_MAX_BATCH_SIZE", 4),
            backoff: Duration::from_millis(env_var_or("HELIX_WORKER_BACKOFF_MS", 500)),
            health_listen_addr: env_var::<SocketAddr>("HELIX_HEALTH_LISTEN_ADDR")
                .unwrap_or(DEFAULT_HEALTH_LISTEN),
        }
    }
}
