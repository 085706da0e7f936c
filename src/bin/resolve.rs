//! One-shot resolution from the command line.
//!
//! Walks the full tier order when a health endpoint is supplied and the
//! remote side answers its probe; without one the remote tier is treated
//! as unavailable and the answer comes from the local fallback profile.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use helix_embed::ProjectionEmbedder;
use helix_resolver::{
    spawn_probe_loop, HealthConfig, HealthMonitor, ResolverConfig, TieredResolver,
};
use helix_store::FsMetadataStore;
use helix_types::{ModelCatalog, ResolutionResult, ResolutionStatus, ESM2_LARGE};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Resolve one protein sequence to an embedding through the tiered pipeline"
)]
struct ResolveArgs {
    /// Amino-acid sequence or FASTA text
    sequence: Option<String>,

    /// Read the sequence from a FASTA or plain-text file instead
    #[arg(long)]
    file: Option<PathBuf>,

    /// Model identity to resolve against
    #[arg(long, default_value = ESM2_LARGE)]
    model: String,

    /// Durable store root directory
    #[arg(long, default_value = "helix-store")]
    store_root: PathBuf,

    /// Gateway cache endpoint
    #[arg(long)]
    cache_endpoint: Option<String>,

    /// Remote health endpoint to probe; omit to resolve locally
    #[arg(long)]
    health_endpoint: Option<String>,

    /// How long to wait for the first successful probe, in milliseconds
    #[arg(long, default_value_t = 3000)]
    health_wait_ms: u64,

    /// Print the full result as JSON, vector included
    #[arg(long)]
    json: bool,
}

fn print_result(result: &ResolutionResult, requested_model: &str) {
    println!("helix-resolve");
    println!("  Fingerprint: {}", result.fingerprint);
    println!("  Status:      {}", result.status);
    println!("  Source:      {}", result.source);
    println!("  Model:       {}", result.model_id);
    if result.is_substitution(requested_model) {
        println!("  Substituted: yes (requested {})", requested_model);
    }
    if let Some(vector) = &result.vector {
        println!("  Dimensions:  {}", vector.len());
        println!("  Confidence:  {:.3}", result.confidence);
    }
}

async fn wait_for_health(monitor: &HealthMonitor, deadline: Duration) {
    let started = Instant::now();
    while !monitor.is_healthy() && started.elapsed() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays parseable under --json.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = ResolveArgs::parse();

    let raw = match (&args.sequence, &args.file) {
        (Some(sequence), None) => sequence.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("read sequence from {}", path.display()))?,
        (Some(_), Some(_)) => {
            return Err(anyhow!("pass a sequence argument or --file, not both"))
        }
        (None, None) => return Err(anyhow!("pass a sequence argument or --file")),
    };

    let store = Arc::new(
        FsMetadataStore::new(&args.store_root)
            .with_context(|| format!("open store at {}", args.store_root.display()))?,
    );

    let mut config = ResolverConfig::from_env();
    if let Some(endpoint) = args.cache_endpoint.clone() {
        config = config.with_endpoint(endpoint);
    }

    let monitor = HealthMonitor::new();
    if let Some(endpoint) = args.health_endpoint.clone() {
        let mut health = HealthConfig::from_env();
        health.endpoint = endpoint;
        spawn_probe_loop(&monitor, health);
        wait_for_health(&monitor, Duration::from_millis(args.health_wait_ms)).await;
    }

    let resolver = TieredResolver::new(
        store,
        Arc::new(ProjectionEmbedder::new()),
        ModelCatalog::standard(),
        monitor,
        config,
    );

    let result = resolver.resolve(&raw, &args.model).await?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("serialize resolution result")?
        );
    } else {
        print_result(&result, &args.model);
    }

    if result.status == ResolutionStatus::Error {
        return Err(anyhow!("resolution failed for {}", result.fingerprint));
    }
    Ok(())
}
