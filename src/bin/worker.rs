//! Embedding worker process.
//!
//! Leases pending tasks from the gateway, computes embeddings locally, and
//! submits results in batches. A gRPC liveness listener runs alongside the
//! lease loop so resolvers can gate remote dispatch on worker availability.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use helix_embed::ProjectionEmbedder;
use helix_transport::grpc::CacheClient;
use helix_types::ModelCatalog;
use helix_worker::{serve_health, LeaseWorker, WorkerConfig};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Lease embedding tasks from the gateway and submit computed batches"
)]
struct WorkerArgs {
    /// Gateway cache endpoint, e.g. http://127.0.0.1:50055
    #[arg(long)]
    cache_endpoint: Option<String>,

    /// Model identity this worker serves
    #[arg(long)]
    model: Option<String>,

    /// Maximum tasks leased per poll cycle
    #[arg(long)]
    max_batch_size: Option<u32>,

    /// Delay between poll cycles, in milliseconds
    #[arg(long)]
    backoff_ms: Option<u64>,

    /// Liveness listener address, e.g. 0.0.0.0:50051
    #[arg(long)]
    health_listen: Option<SocketAddr>,
}

impl WorkerArgs {
    /// Environment variables first, flags override.
    fn into_config(self) -> WorkerConfig {
        let mut config = WorkerConfig::from_env();
        if let Some(endpoint) = self.cache_endpoint {
            config.cache_endpoint = endpoint;
        }
        if let Some(model) = self.model {
            config.model_id = model;
        }
        if let Some(batch) = self.max_batch_size {
            config.max_batch_size = batch;
        }
        if let Some(ms) = self.backoff_ms {
            config.backoff = Duration::from_millis(ms);
        }
        if let Some(addr) = self.health_listen {
            config.health_listen_addr = addr;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = WorkerArgs::parse().into_config();

    let catalog = ModelCatalog::standard();
    let profile = catalog.profile(&config.model_id)?.clone();

    // The liveness listener comes up before the gateway connection so probes
    // start answering as soon as the process is alive.
    let health_addr = config.health_listen_addr;
    tokio::spawn(async move {
        if let Err(e) = serve_health(health_addr).await {
            error!("Liveness listener exited: {}", e);
        }
    });

    info!(
        "Worker starting (model {}, {} dims, gateway {})",
        profile.id, profile.dimensions, config.cache_endpoint
    );

    let client = CacheClient::connect(&config.cache_endpoint)
        .await
        .with_context(|| format!("connect to gateway at {}", config.cache_endpoint))?;

    let worker = LeaseWorker::new(
        client,
        Arc::new(ProjectionEmbedder::new()),
        profile,
        config.max_batch_size,
        config.backoff,
    );
    worker.run().await;

    Ok(())
}
