//! Remote compute-tier health monitor.
//!
//! A single background loop probes the worker pool's `Health.Check`
//! endpoint and publishes a boolean verdict that every resolution reads
//! synchronously. The monitor starts UNHEALTHY so a fresh process never
//! trusts the remote tier before it has proven reachable.
//!
//! The probe loop is the only writer. Readers see a value at most one
//! probe interval old, which is acceptable: a stale HEALTHY costs one
//! degraded RPC, a stale UNHEALTHY costs one fallback answer.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use helix_transport::HealthClient;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::HealthConfig;

/// Point-in-time view of the monitor.
#[derive(Debug, Clone, Serialize)]
pub struct HealthState {
    pub is_healthy: bool,
    /// When the verdict last flipped; `None` until the first edge.
    pub last_transition_at: Option<DateTime<Utc>>,
}

struct Shared {
    healthy: AtomicBool,
    transitions: AtomicU64,
    last_transition: RwLock<Option<DateTime<Utc>>>,
}

/// Published health verdict. Clones share one underlying state.
#[derive(Clone)]
pub struct HealthMonitor {
    shared: Arc<Shared>,
}

impl HealthMonitor {
    /// New monitor in the fail-safe UNHEALTHY state.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                healthy: AtomicBool::new(false),
                transitions: AtomicU64::new(0),
                last_transition: RwLock::new(None),
            }),
        }
    }

    /// Current verdict. Lock-free, safe on every request path.
    pub fn is_healthy(&self) -> bool {
        self.shared.healthy.load(Ordering::Acquire)
    }

    /// Number of edges observed since startup.
    pub fn transition_count(&self) -> u64 {
        self.shared.transitions.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> HealthState {
        HealthState {
            is_healthy: self.is_healthy(),
            last_transition_at: *self.shared.last_transition.read(),
        }
    }

    /// Publish one probe verdict. The probe loop is the sole caller in
    /// production; tests drive it directly. Logs only on edges.
    pub fn apply(&self, healthy: bool) {
        let previous = self.shared.healthy.swap(healthy, Ordering::AcqRel);
        if previous == healthy {
            return;
        }
        self.shared.transitions.fetch_add(1, Ordering::Relaxed);
        *self.shared.last_transition.write() = Some(Utc::now());
        if healthy {
            info!("Remote compute tier is healthy, resuming remote resolution");
        } else {
            warn!("Remote compute tier is unhealthy, routing to local fallback");
        }
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Reconnecting probe driver.
///
/// The client is rebuilt after any failure so a worker restart does not
/// leave the prober pinned to a dead channel.
struct HealthProber {
    config: HealthConfig,
    client: Option<HealthClient>,
}

impl HealthProber {
    fn new(config: HealthConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    async fn probe_once(&mut self) -> bool {
        if self.client.is_none() {
            match HealthClient::connect(&self.config.endpoint, self.config.probe_timeout).await {
                Ok(client) => self.client = Some(client),
                Err(e) => {
                    debug!("Health probe connect to {} failed: {}", self.config.endpoint, e);
                    return false;
                }
            }
        }
        let Some(client) = self.client.as_ref() else {
            return false;
        };
        match client.check("").await {
            Ok(serving) => serving,
            Err(e) => {
                debug!("Health probe failed: {}", e);
                self.client = None;
                false
            }
        }
    }
}

/// Drive the probe loop until the owning task is aborted.
pub async fn run_probe_loop(monitor: HealthMonitor, config: HealthConfig) {
    let probe_interval = config.probe_interval;
    let mut prober = HealthProber::new(config);
    loop {
        let verdict = prober.probe_once().await;
        monitor.apply(verdict);
        tokio::time::sleep(probe_interval).await;
    }
}

/// Spawn the probe loop on the current runtime.
pub fn spawn_probe_loop(monitor: &HealthMonitor, config: HealthConfig) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run_probe_loop(monitor.clone(), config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use helix_transport::grpc::test_utils::StubServer;
    use std::time::Duration;

    async fn wait_until(deadline: Duration, check: impl Fn() -> bool) -> bool {
        let start = std::time::Instant::now();
        while start.elapsed() < deadline {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        check()
    }

    #[test]
    fn test_starts_unhealthy() {
        let monitor = HealthMonitor::new();
        assert!(!monitor.is_healthy());
        assert_eq!(monitor.transition_count(), 0);
        assert!(monitor.state().last_transition_at.is_none());
    }

    #[test]
    fn test_repeated_failures_do_not_transition() {
        let monitor = HealthMonitor::new();
        for _ in 0..3 {
            monitor.apply(false);
        }
        assert!(!monitor.is_healthy());
        assert_eq!(monitor.transition_count(), 0);
        assert!(monitor.state().last_transition_at.is_none());
    }

    #[test]
    fn test_single_success_recovers_with_one_edge() {
        let monitor = HealthMonitor::new();
        monitor.apply(false);
        monitor.apply(false);
        monitor.apply(false);
        monitor.apply(true);
        assert!(monitor.is_healthy());
        assert_eq!(monitor.transition_count(), 1);
        assert!(monitor.state().last_transition_at.is_some());

        // Steady state adds no edges
        monitor.apply(true);
        assert_eq!(monitor.transition_count(), 1);
    }

    #[test]
    fn test_loss_edge_updates_timestamp() {
        let monitor = HealthMonitor::new();
        monitor.apply(true);
        let recovered_at = monitor.state().last_transition_at;
        monitor.apply(false);
        assert!(!monitor.is_healthy());
        assert_eq!(monitor.transition_count(), 2);
        assert!(monitor.state().last_transition_at >= recovered_at);
    }

    #[tokio::test]
    async fn test_probe_loop_tracks_stub_serving_state() {
        let stub = StubServer::start().await.unwrap();
        let monitor = HealthMonitor::new();
        let handle = spawn_probe_loop(
            &monitor,
            HealthConfig {
                endpoint: stub.endpoint().to_string(),
                probe_interval: Duration::from_millis(25),
                probe_timeout: Duration::from_millis(500),
            },
        );

        let m = monitor.clone();
        assert!(wait_until(Duration::from_secs(2), move || m.is_healthy()).await);

        stub.set_serving(false);
        let m = monitor.clone();
        assert!(wait_until(Duration::from_secs(2), move || !m.is_healthy()).await);

        handle.abort();
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_stays_unhealthy() {
        let monitor = HealthMonitor::new();
        let handle = spawn_probe_loop(
            &monitor,
            HealthConfig {
                endpoint: "http://127.0.0.1:9".to_string(),
                probe_interval: Duration::from_millis(20),
                probe_timeout: Duration::from_millis(100),
            },
        );

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!monitor.is_healthy());
        assert_eq!(monitor.transition_count(), 0);

        handle.abort();
    }
}
