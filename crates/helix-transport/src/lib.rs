//! Helix Transport Layer
//!
//! Network transport for the remote compute tier via gRPC.
//!
//! This crate provides:
//! - [`grpc`]: typed clients for the remote cache/task-queue service and the
//!   standard health checking protocol, plus the committed generated proto
//!   code and an in-process stub server for tests
//!
//! # Example
//!
//! ```ignore
//! use helix_transport::grpc::{CacheClient, HealthClient};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = CacheClient::connect("http://127.0.0.1:50052").await?;
//!     let hit = cache.get("ab12..", "esm2_t6_8M_UR50D").await?;
//!
//!     let health = HealthClient::connect("http://127.0.0.1:50051", Duration::from_secs(2)).await?;
//!     let serving = health.check("").await?;
//!     Ok(())
//! }
//! ```

pub mod grpc;

// Re-export main types for convenience
pub use grpc::{CacheClient, CachedEmbedding, ComputeTask, ComputedEmbedding, HealthClient};

/// Default endpoint of the remote cache/task-queue service.
pub const DEFAULT_CACHE_ENDPOINT: &str = "http://127.0.0.1:50052";

/// Default endpoint of the worker liveness service.
pub const DEFAULT_HEALTH_ENDPOINT: &str = "http://127.0.0.1:50051";

/// Connect to the remote cache service using environment configuration.
///
/// - `HELIX_CACHE_ENDPOINT` - cache endpoint (default: `http://127.0.0.1:50052`)
pub async fn connect_cache_from_env() -> anyhow::Result<CacheClient> {
    let endpoint = std::env::var("HELIX_CACHE_ENDPOINT")
        .unwrap_or_else(|_| DEFAULT_CACHE_ENDPOINT.to_string());
    CacheClient::connect(&endpoint).await
}
