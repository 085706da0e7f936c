//! Helix Gateway
//!
//! Tiered resolution and task leasing for protein embeddings:
//!
//! - **Resolution**: answer (sequence, model) requests from the remote cache,
//!   the durable store, or the job queue, in that order
//! - **Health gating**: a background probe loop decides whether the remote
//!   tier is consulted at all; while it is unhealthy every request computes a
//!   fallback embedding locally
//! - **Task leasing**: workers drain the gateway queue, compute embeddings,
//!   and submit results in batches
//! - **Durable store**: records, vectors, and job bookkeeping live in a
//!   sharded filesystem layout
//!
//! The `helix-worker` and `helix-resolve` binaries wire these together. See
//! [`TieredResolver`] for the resolution walk and [`LeaseWorker`] for the
//! worker loop.

// Re-export the workspace surface for embedding callers
pub use helix_embed::{Embedder, Embedding, ProjectionEmbedder, MAX_SEQUENCE_RESIDUES};
pub use helix_resolver::{
    run_probe_loop, spawn_probe_loop, HealthConfig, HealthMonitor, HealthState, ResolverConfig,
    ResolverMetrics, ResolverMetricsSnapshot, StructureManifest, StructureRef, StructureSource,
    TieredResolver, DEFAULT_NODE_LABEL,
};
pub use helix_store::{
    EmbeddingRecord, FsMetadataStore, MemoryMetadataStore, MetadataStore, SimilarMatch,
    StoredEmbedding,
};
pub use helix_transport::{
    CacheClient, CachedEmbedding, ComputeTask, ComputedEmbedding, HealthClient,
    DEFAULT_CACHE_ENDPOINT, DEFAULT_HEALTH_ENDPOINT,
};
pub use helix_types::{
    fingerprint, normalize, JobRecord, JobStatus, ModelCatalog, ModelProfile, ResidueAnnotation,
    ResolutionResult, ResolutionSource, ResolutionStatus, SequenceFingerprint, SequenceMetadata,
    ESM2_LARGE, ESM2_SMALL,
};
pub use helix_worker::{
    serve_health, spawn_health_listener, LeaseWorker, WorkerConfig, WorkerMetrics,
    WorkerMetricsSnapshot,
};
