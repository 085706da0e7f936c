//! Lease/compute/submit poll loop.
//!
//! One long-lived loop per worker process: lease up to `max_batch_size`
//! tasks for the configured model, compute each, and report everything
//! that succeeded in a single batch submission. A failing task never
//! takes the cycle down with it; it is skipped and re-leased later
//! because nothing ever marks it complete.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use helix_embed::{Embedder, MAX_SEQUENCE_RESIDUES};
use helix_transport::{CacheClient, ComputeTask, ComputedEmbedding};
use helix_types::{normalize, ModelProfile};
use tracing::{debug, info, warn};

use crate::metrics::WorkerMetrics;

/// Task-leasing worker bound to one model identity.
pub struct LeaseWorker {
    client: CacheClient,
    embedder: Arc<dyn Embedder>,
    profile: ModelProfile,
    max_batch_size: u32,
    backoff: Duration,
    metrics: WorkerMetrics,
}

impl LeaseWorker {
    pub fn new(
        client: CacheClient,
        embedder: Arc<dyn Embedder>,
        profile: ModelProfile,
        max_batch_size: u32,
        backoff: Duration,
    ) -> Self {
        Self {
            client,
            embedder,
            profile,
            max_batch_size,
            backoff,
            metrics: WorkerMetrics::default(),
        }
    }

    pub fn metrics(&self) -> &WorkerMetrics {
        &self.metrics
    }

    /// One lease/compute/submit cycle. Returns the number of embeddings
    /// submitted. Zero leased tasks is a normal idle cycle, not an error.
    pub async fn poll_once(&self) -> Result<usize> {
        let tasks = self
            .client
            .lease_tasks(&self.profile.id, self.max_batch_size)
            .await?;
        self.metrics.record_tasks_leased(tasks.len() as u64);
        if tasks.is_empty() {
            return Ok(0);
        }
        debug!("Leased {} tasks (model {})", tasks.len(), self.profile.id);

        let mut results = Vec::with_capacity(tasks.len());
        for task in &tasks {
            match self.compute(task) {
                Ok(result) => {
                    self.metrics.record_embedding_computed();
                    results.push(result);
                }
                Err(e) => {
                    self.metrics.record_task_failure();
                    warn!(
                        "Task {} failed, leaving it for re-lease: {}",
                        task.fingerprint_hex, e
                    );
                }
            }
        }

        if results.is_empty() {
            return Ok(0);
        }
        self.client
            .submit_batch(&self.profile.id, &results)
            .await?;
        self.metrics.record_batch_submitted();
        info!(
            "Submitted batch of {} embeddings (model {})",
            results.len(),
            self.profile.id
        );
        Ok(results.len())
    }

    fn compute(&self, task: &ComputeTask) -> Result<ComputedEmbedding> {
        let clean = normalize(&task.sequence, MAX_SEQUENCE_RESIDUES);
        let embedding = self.embedder.embed(&clean, &self.profile)?;
        Ok(ComputedEmbedding {
            fingerprint_hex: task.fingerprint_hex.clone(),
            vector: embedding.vector,
            confidence: embedding.confidence,
        })
    }

    /// Drive the poll loop until the owning task is aborted. Transport
    /// failures cost one cycle, never the loop.
    pub async fn run(&self) {
        info!(
            "Worker polling for model {} (batch size {}, backoff {:?})",
            self.profile.id, self.max_batch_size, self.backoff
        );
        loop {
            match self.poll_once().await {
                Ok(_) => {}
                Err(e) => {
                    self.metrics.record_poll_failure();
                    warn!("Poll cycle failed: {}", e);
                }
            }
            self.metrics.record_cycle();
            tokio::time::sleep(self.backoff).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helix_embed::ProjectionEmbedder;
    use helix_transport::grpc::test_utils::StubServer;

    const MODEL: &str = "tiny_test_model";

    fn tiny_profile() -> ModelProfile {
        ModelProfile::new(MODEL, 8, "tiny")
    }

    async fn worker_against(stub: &StubServer) -> LeaseWorker {
        let client = CacheClient::connect(stub.endpoint()).await.unwrap();
        LeaseWorker::new(
            client,
            Arc::new(ProjectionEmbedder::new()),
            tiny_profile(),
            4,
            Duration::from_millis(10),
        )
    }

    async fn queue_task(stub: &StubServer, hash: &str, sequence: &str) {
        let client = CacheClient::connect(stub.endpoint()).await.unwrap();
        client.submit_task(hash, sequence, MODEL).await.unwrap();
    }

    #[tokio::test]
    async fn test_poll_computes_and_submits_batch() {
        let stub = StubServer::start().await.unwrap();
        queue_task(&stub, "aa01", "MVLSPADKTN").await;
        queue_task(&stub, "aa02", "GKVGAHAGEY").await;

        let worker = worker_against(&stub).await;
        let submitted = worker.poll_once().await.unwrap();
        assert_eq!(submitted, 2);

        let state = stub.state();
        let state = state.lock();
        assert_eq!(state.queued_for(MODEL), 0);

        let expected = ProjectionEmbedder::new()
            .embed("MVLSPADKTN", &tiny_profile())
            .unwrap();
        let entry = state
            .entries
            .get(&("aa01".to_string(), MODEL.to_string()))
            .unwrap();
        assert_eq!(entry.0, expected.vector);
        assert_eq!(entry.1, expected.confidence);
        assert!(state
            .entries
            .contains_key(&("aa02".to_string(), MODEL.to_string())));
    }

    #[tokio::test]
    async fn test_empty_queue_is_an_idle_cycle() {
        let stub = StubServer::start().await.unwrap();
        let worker = worker_against(&stub).await;

        assert_eq!(worker.poll_once().await.unwrap(), 0);
        assert_eq!(stub.counters().lease_calls, 1);
        assert_eq!(stub.counters().submit_batch_calls, 0);
    }

    #[tokio::test]
    async fn test_failed_task_yields_partial_batch() {
        let stub = StubServer::start().await.unwrap();
        queue_task(&stub, "aa01", "MVLSPADKTN").await;
        // Normalizes to nothing, so computation fails
        queue_task(&stub, "aa02", ">header only\n").await;
        queue_task(&stub, "aa03", "GKVGAHAGEY").await;

        let worker = worker_against(&stub).await;
        let submitted = worker.poll_once().await.unwrap();
        assert_eq!(submitted, 2);

        let state = stub.state();
        let state = state.lock();
        assert!(state
            .entries
            .contains_key(&("aa01".to_string(), MODEL.to_string())));
        assert!(!state
            .entries
            .contains_key(&("aa02".to_string(), MODEL.to_string())));
        assert!(state
            .entries
            .contains_key(&("aa03".to_string(), MODEL.to_string())));

        let snap = worker.metrics().snapshot();
        assert_eq!(snap.tasks_leased, 3);
        assert_eq!(snap.embeddings_computed, 2);
        assert_eq!(snap.task_failures, 1);
    }

    #[tokio::test]
    async fn test_one_batch_rpc_per_cycle() {
        let stub = StubServer::start().await.unwrap();
        for i in 0..3 {
            queue_task(&stub, &format!("aa{:02}", i), "MVLSPADKTN").await;
        }

        let worker = worker_against(&stub).await;
        worker.poll_once().await.unwrap();

        assert_eq!(stub.counters().lease_calls, 1);
        assert_eq!(stub.counters().submit_batch_calls, 1);
    }

    #[tokio::test]
    async fn test_lease_respects_batch_size() {
        let stub = StubServer::start().await.unwrap();
        for i in 0..6 {
            queue_task(&stub, &format!("aa{:02}", i), "MVLSPADKTN").await;
        }

        let client = CacheClient::connect(stub.endpoint()).await.unwrap();
        let worker = LeaseWorker::new(
            client,
            Arc::new(ProjectionEmbedder::new()),
            tiny_profile(),
            4,
            Duration::from_millis(10),
        );

        assert_eq!(worker.poll_once().await.unwrap(), 4);
        assert_eq!(worker.poll_once().await.unwrap(), 2);
        assert_eq!(stub.counters().submit_batch_calls, 2);
    }
}
