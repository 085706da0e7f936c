//! Tiered resolution core.
//!
//! `resolve` walks a strict tier order for each request: remote cache,
//! durable store, job registry, job dispatch. The walk short-circuits on
//! the first definitive answer, and an unhealthy remote tier skips it
//! entirely in favor of local computation under the designated fallback
//! model. The remote tier is never contacted while known unhealthy.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use helix_embed::{Embedder, MAX_SEQUENCE_RESIDUES};
use helix_store::{MetadataStore, StoredEmbedding};
use helix_transport::{CacheClient, CachedEmbedding, ComputedEmbedding};
use helix_types::{
    fingerprint, normalize, JobStatus, ModelCatalog, ModelProfile, ResolutionResult,
    ResolutionSource, SequenceFingerprint, SequenceMetadata,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::ResolverConfig;
use crate::health::HealthMonitor;
use crate::metrics::ResolverMetrics;

/// Lazily-connected handle to the remote cache.
///
/// The channel is built on first use and dropped after any RPC failure,
/// so an endpoint that is unreachable at startup or restarts mid-flight
/// does not pin the resolver offline.
struct RemoteCache {
    endpoint: String,
    request_timeout: Duration,
    connect_timeout: Duration,
    client: Mutex<Option<Arc<CacheClient>>>,
}

impl RemoteCache {
    fn new(config: &ResolverConfig) -> Self {
        Self {
            endpoint: config.cache_endpoint.clone(),
            request_timeout: config.request_timeout,
            connect_timeout: config.connect_timeout,
            client: Mutex::new(None),
        }
    }

    async fn client(&self) -> Result<Arc<CacheClient>> {
        {
            let guard = self.client.lock();
            if let Some(client) = guard.as_ref() {
                return Ok(Arc::clone(client));
            }
        }
        let client = Arc::new(
            CacheClient::connect_with_timeouts(
                &self.endpoint,
                self.request_timeout,
                self.connect_timeout,
            )
            .await?,
        );
        *self.client.lock() = Some(Arc::clone(&client));
        Ok(client)
    }

    fn reset(&self) {
        *self.client.lock() = None;
    }
}

/// Health-gated resolution over the remote cache, the durable store and
/// the job queue.
pub struct TieredResolver {
    remote: RemoteCache,
    store: Arc<dyn MetadataStore>,
    embedder: Arc<dyn Embedder>,
    catalog: ModelCatalog,
    monitor: HealthMonitor,
    node_label: String,
    metrics: ResolverMetrics,
}

impl TieredResolver {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        embedder: Arc<dyn Embedder>,
        catalog: ModelCatalog,
        monitor: HealthMonitor,
        config: ResolverConfig,
    ) -> Self {
        Self {
            remote: RemoteCache::new(&config),
            store,
            embedder,
            catalog,
            monitor,
            node_label: config.node_label,
            metrics: ResolverMetrics::default(),
        }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn monitor(&self) -> &HealthMonitor {
        &self.monitor
    }

    pub fn metrics(&self) -> &ResolverMetrics {
        &self.metrics
    }

    /// Resolve one raw sequence under one model identity.
    ///
    /// Always produces a definitive `ResolutionResult`; malformed input
    /// and unknown model identities answer with ERROR status. An `Err`
    /// return is reserved for durable-store failures on the read path.
    pub async fn resolve(&self, raw_sequence: &str, model_id: &str) -> Result<ResolutionResult> {
        let clean = normalize(raw_sequence, MAX_SEQUENCE_RESIDUES);
        let fp = fingerprint(&clean);

        if clean.is_empty() {
            warn!("Rejecting resolution of empty normalized sequence");
            self.metrics.record_resolution_error();
            return Ok(ResolutionResult::error(fp, model_id));
        }
        let profile = match self.catalog.profile(model_id) {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Rejecting resolution: {}", e);
                self.metrics.record_resolution_error();
                return Ok(ResolutionResult::error(fp, model_id));
            }
        };

        if !self.monitor.is_healthy() {
            return self.resolve_local_fallback(fp, &clean).await;
        }

        // Tier 1: remote cache
        match self.remote_get(&fp, model_id).await {
            Ok(Some(hit)) => {
                self.backfill_store(&fp, profile, &clean, &hit).await;
                self.metrics.record_remote_cache_hit();
                return Ok(ResolutionResult::completed(
                    fp,
                    ResolutionSource::RemoteCache,
                    model_id,
                    hit.vector,
                    hit.confidence,
                ));
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    "Remote cache lookup failed, degrading to durable store: {}",
                    e
                );
                self.metrics.record_remote_degradation();
                self.remote.reset();
            }
        }

        // Tier 2: durable store
        if let Some(stored) = self.store.get_record(&fp, profile).await? {
            self.repopulate_cache(&fp, profile, &stored).await;
            self.metrics.record_durable_store_hit();
            return Ok(ResolutionResult::completed(
                fp,
                ResolutionSource::DurableStore,
                model_id,
                stored.vector,
                stored.record.confidence,
            ));
        }

        // Tier 3: job registry
        if let Some(JobStatus::Pending) = self.store.get_job_status(&fp, profile).await? {
            self.metrics.record_job_queue_answer();
            return Ok(ResolutionResult::pending(
                fp,
                ResolutionSource::JobQueue,
                model_id,
            ));
        }

        // Tier 4: dispatch. Exactly one creator wins per (fingerprint,
        // model) pair; losers report the existing job.
        let created = self
            .store
            .create_job_if_absent(&fp, profile, &self.node_label)
            .await?;
        if !created {
            self.metrics.record_job_queue_answer();
            return Ok(ResolutionResult::pending(
                fp,
                ResolutionSource::JobQueue,
                model_id,
            ));
        }

        self.submit_task(&fp, &clean, model_id).await;
        self.metrics.record_job_dispatched();
        info!("Dispatched computation job {} (model {})", fp, model_id);
        Ok(ResolutionResult::pending(
            fp,
            ResolutionSource::NewJob,
            model_id,
        ))
    }

    async fn remote_get(
        &self,
        fp: &SequenceFingerprint,
        model_id: &str,
    ) -> Result<Option<CachedEmbedding>> {
        let client = self.remote.client().await?;
        client.get(&fp.to_hex(), model_id).await
    }

    /// Write-through after a cache hit. Failures are logged and
    /// swallowed: the read path does not depend on this write.
    async fn backfill_store(
        &self,
        fp: &SequenceFingerprint,
        profile: &ModelProfile,
        clean: &str,
        hit: &CachedEmbedding,
    ) {
        match self.store.get_record(fp, profile).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                let metadata = SequenceMetadata::from_sequence(clean);
                if let Err(e) = self
                    .store
                    .upsert_record(fp, profile, &hit.vector, hit.confidence, &metadata, false)
                    .await
                {
                    warn!("Durable back-fill write failed: {}", e);
                }
            }
            Err(e) => warn!("Durable back-fill lookup failed: {}", e),
        }
        if let Err(e) = self.store.mark_job_complete(fp, profile).await {
            warn!("Job completion after cache hit failed: {}", e);
        }
    }

    /// One-entry batch submission after a durable hit. Failures are
    /// logged and swallowed.
    async fn repopulate_cache(
        &self,
        fp: &SequenceFingerprint,
        profile: &ModelProfile,
        stored: &StoredEmbedding,
    ) {
        let entry = ComputedEmbedding {
            fingerprint_hex: fp.to_hex(),
            vector: stored.vector.clone(),
            confidence: stored.record.confidence,
        };
        let outcome = match self.remote.client().await {
            Ok(client) => {
                client
                    .submit_batch(&profile.id, std::slice::from_ref(&entry))
                    .await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            debug!("Remote cache re-population skipped: {}", e);
            self.remote.reset();
        }
    }

    /// Task submission after winning job creation. A transport failure
    /// leaves the job pending for a later re-dispatch; the caller still
    /// owns the NEW_JOB answer.
    async fn submit_task(&self, fp: &SequenceFingerprint, clean: &str, model_id: &str) {
        let outcome = match self.remote.client().await {
            Ok(client) => client.submit_task(&fp.to_hex(), clean, model_id).await,
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            warn!("Task submission for job {} failed: {}", fp, e);
            self.remote.reset();
        }
    }

    /// Local computation under the fallback model while the remote tier
    /// is unavailable. The durable write is best-effort; the computed
    /// vector is the answer either way.
    async fn resolve_local_fallback(
        &self,
        fp: SequenceFingerprint,
        clean: &str,
    ) -> Result<ResolutionResult> {
        let profile = self.catalog.fallback()?;
        let embedding = match self.embedder.embed(clean, profile) {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Local fallback computation failed: {}", e);
                self.metrics.record_resolution_error();
                return Ok(ResolutionResult::error(fp, profile.id.clone()));
            }
        };

        let metadata = SequenceMetadata::from_sequence(clean);
        if let Err(e) = self
            .store
            .upsert_record(
                &fp,
                profile,
                &embedding.vector,
                embedding.confidence,
                &metadata,
                true,
            )
            .await
        {
            warn!("Durable write of fallback embedding failed: {}", e);
        }

        self.metrics.record_local_fallback();
        Ok(ResolutionResult::completed(
            fp,
            ResolutionSource::LocalFallback,
            profile.id.clone(),
            embedding.vector,
            embedding.confidence,
        ))
    }
}
