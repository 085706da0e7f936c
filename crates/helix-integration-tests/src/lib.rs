//! Cross-crate test harness for the tiered resolution pipeline.
//!
//! Assembles an in-process remote tier (stub gateway), a durable store, and
//! a resolver wired the way the production binaries wire them. The tests in
//! `tests/` drive resolution walks, dispatch races, worker cycles, and
//! health probing against this assembly.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

use helix_embed::{Embedder, Embedding, ProjectionEmbedder, MAX_SEQUENCE_RESIDUES};
use helix_resolver::{HealthMonitor, ResolverConfig, TieredResolver};
use helix_store::{MemoryMetadataStore, MetadataStore};
use helix_transport::grpc::test_utils::StubServer;
use helix_transport::grpc::CacheClient;
use helix_types::{normalize, ModelCatalog};
use helix_worker::LeaseWorker;

/// One resolver, one stub gateway, one in-memory store.
pub struct TierHarness {
    pub stub: StubServer,
    pub store: Arc<MemoryMetadataStore>,
    pub monitor: HealthMonitor,
    pub resolver: Arc<TieredResolver>,
}

impl TierHarness {
    /// Assembly with the monitor left in its fail-safe initial state.
    pub async fn unprobed() -> Result<Self> {
        let stub = StubServer::start().await?;
        let store = Arc::new(MemoryMetadataStore::new());
        let monitor = HealthMonitor::new();
        let resolver = Arc::new(TieredResolver::new(
            Arc::clone(&store) as Arc<dyn MetadataStore>,
            Arc::new(ProjectionEmbedder::new()),
            ModelCatalog::standard(),
            monitor.clone(),
            ResolverConfig::default().with_endpoint(stub.endpoint()),
        ));
        Ok(Self {
            stub,
            store,
            monitor,
            resolver,
        })
    }

    /// Same assembly with the remote tier already marked healthy.
    pub async fn healthy() -> Result<Self> {
        let harness = Self::unprobed().await?;
        harness.monitor.apply(true);
        Ok(harness)
    }

    /// Worker serving `model_id` against the same stub gateway.
    pub async fn worker(&self, model_id: &str, max_batch_size: u32) -> Result<LeaseWorker> {
        let client = CacheClient::connect(self.stub.endpoint()).await?;
        let profile = ModelCatalog::standard().profile(model_id)?.clone();
        Ok(LeaseWorker::new(
            client,
            Arc::new(ProjectionEmbedder::new()),
            profile,
            max_batch_size,
            Duration::from_millis(10),
        ))
    }

    /// Direct client handle, for seeding or inspecting the stub gateway.
    pub async fn client(&self) -> Result<CacheClient> {
        CacheClient::connect(self.stub.endpoint()).await
    }
}

/// Poll `check` every 10ms until it holds or `deadline` elapses.
pub async fn wait_until(deadline: Duration, check: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

/// Reference embedding for a raw sequence, computed the way workers do.
pub fn reference_embedding(raw: &str, model_id: &str) -> Result<Embedding> {
    let catalog = ModelCatalog::standard();
    let profile = catalog.profile(model_id)?;
    let clean = normalize(raw, MAX_SEQUENCE_RESIDUES);
    ProjectionEmbedder::new().embed(&clean, profile)
}
