//! Health-gated tiered resolution core.
//!
//! This crate turns the workspace's building blocks into the resolution
//! protocol itself:
//!
//! - [`HealthMonitor`](health::HealthMonitor) - fail-safe circuit breaker fed by a background probe loop
//! - [`TieredResolver`](resolver::TieredResolver) - remote cache, durable store, job registry, dispatch
//! - [`ResolverMetrics`](metrics::ResolverMetrics) - per-outcome counters
//! - [`StructureManifest`](manifest::StructureManifest) - viewer payload derived from stored records

pub mod config;
pub mod health;
pub mod manifest;
pub mod metrics;
pub mod resolver;

// Re-export main types for convenience
pub use config::{HealthConfig, ResolverConfig, DEFAULT_NODE_LABEL};
pub use health::{run_probe_loop, spawn_probe_loop, HealthMonitor, HealthState};
pub use manifest::{StructureManifest, StructureRef, StructureSource};
pub use metrics::{ResolverMetrics, ResolverMetricsSnapshot};
pub use resolver::TieredResolver;
