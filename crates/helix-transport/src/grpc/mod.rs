//! gRPC surface of the remote compute tier.
//!
//! The remote tier exposes two services on separate listeners:
//!
//! - `CacheService` - embedding lookups, task submission, task leasing and
//!   batch result reporting
//! - `Health` - liveness probes, answered by every worker process
//!
//! ## Usage
//!
//! ```ignore
//! use helix_transport::grpc::CacheClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut client = CacheClient::connect("http://127.0.0.1:50052").await?;
//!     let hit = client.get("ab12..", "esm2_t6_8M_UR50D").await?;
//!     Ok(())
//! }
//! ```

// Generated proto modules
pub mod generated {
    pub mod helix_cache_v1 {
        include!("generated/helix.cache.v1.rs");
    }
}

mod client;
pub mod test_utils;

pub use client::*;
