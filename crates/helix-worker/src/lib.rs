//! Task-leasing compute worker.
//!
//! A worker process runs two concerns side by side:
//!
//! - [`LeaseWorker`](worker::LeaseWorker) - the lease/compute/submit poll loop
//! - [`serve_health`](health_service::serve_health) - the liveness endpoint the
//!   resolution side's health monitor probes
//!
//! Both are driven by one [`WorkerConfig`](config::WorkerConfig).

pub mod config;
pub mod health_service;
pub mod metrics;
pub mod worker;

// Re-export main types for convenience
pub use config::{WorkerConfig, DEFAULT_HEALTH_LISTEN};
pub use health_service::{serve_health, spawn_health_listener, WorkerHealthService};
pub use metrics::{WorkerMetrics, WorkerMetricsSnapshot};
pub use worker::LeaseWorker;
