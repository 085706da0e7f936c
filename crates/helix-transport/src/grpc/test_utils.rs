//! Test utilities for the remote compute tier.
//!
//! Provides an in-process stub of the `CacheService` and `Health` services
//! so resolution and worker logic can be exercised without a live
//! deployment. The stub mirrors the production queue semantics: task
//! submission deduplicates on (hash, model identity), leasing drains the
//! queue in submission order, and batch reporting back-fills the cache.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

use super::generated::helix_cache_v1::{
    self as proto,
    cache_service_server::{CacheService, CacheServiceServer},
    health_check_response::ServingStatus,
    health_server::{Health, HealthServer},
};

/// Call counters for asserting interaction patterns.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubCounters {
    pub get_calls: u64,
    pub submit_task_calls: u64,
    pub lease_calls: u64,
    pub submit_batch_calls: u64,
    pub clear_calls: u64,
    pub health_checks: u64,
}

/// Shared mutable state behind the stub services.
#[derive(Debug, Default)]
pub struct StubState {
    /// Cached embeddings keyed by (fingerprint hex, model identity).
    /// Values are (vector, confidence).
    pub entries: HashMap<(String, String), (Vec<f32>, f32)>,
    /// Queued tasks in submission order.
    pub tasks: Vec<proto::TaskRequest>,
    /// Whether the health service answers SERVING.
    pub serving: bool,
    /// Force `Get` to fail with UNAVAILABLE.
    pub fail_get: bool,
    /// Force `SubmitTask` to fail with UNAVAILABLE.
    pub fail_submit_task: bool,
    /// Force `Check` to fail with UNAVAILABLE.
    pub fail_health: bool,
    pub counters: StubCounters,
}

impl StubState {
    /// Pre-load a cache entry.
    pub fn insert_entry(
        &mut self,
        fingerprint_hex: &str,
        model_id: &str,
        vector: Vec<f32>,
        confidence: f32,
    ) {
        self.entries.insert(
            (fingerprint_hex.to_string(), model_id.to_string()),
            (vector, confidence),
        );
    }

    /// Number of queued tasks targeting one model identity.
    pub fn queued_for(&self, model_id: &str) -> usize {
        self.tasks.iter().filter(|t| t.model_id == model_id).count()
    }
}

/// Stub implementation of both remote services over shared state.
#[derive(Debug, Clone)]
pub struct StubCacheService {
    state: Arc<Mutex<StubState>>,
}

impl StubCacheService {
    /// Create a stub that starts out SERVING with an empty cache.
    pub fn new() -> Self {
        let state = StubState {
            serving: true,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn state(&self) -> Arc<Mutex<StubState>> {
        Arc::clone(&self.state)
    }
}

impl Default for StubCacheService {
    fn default() -> Self {
        Self::new()
    }
}

#[tonic::async_trait]
impl CacheService for StubCacheService {
    async fn get(
        &self,
        request: Request<proto::KeyRequest>,
    ) -> Result<Response<proto::ValueResponse>, Status> {
        let req = request.into_inner();
        let mut state = self.state.lock();
        state.counters.get_calls += 1;
        if state.fail_get {
            return Err(Status::unavailable("stub cache outage"));
        }
        let resp = match state.entries.get(&(req.key.clone(), req.model_id.clone())) {
            Some((vector, confidence)) => proto::ValueResponse {
                found: true,
                value: serde_json::to_vec(vector)
                    .map_err(|e| Status::internal(e.to_string()))?,
                confidence_score: *confidence,
                model_id: req.model_id,
            },
            None => proto::ValueResponse::default(),
        };
        Ok(Response::new(resp))
    }

    async fn submit_task(
        &self,
        request: Request<proto::TaskRequest>,
    ) -> Result<Response<proto::Ack>, Status> {
        let req = request.into_inner();
        let mut state = self.state.lock();
        state.counters.submit_task_calls += 1;
        if state.fail_submit_task {
            return Err(Status::unavailable("stub queue outage"));
        }
        let duplicate = state
            .tasks
            .iter()
            .any(|t| t.hash == req.hash && t.model_id == req.model_id);
        if !duplicate {
            state.tasks.push(req);
        }
        Ok(Response::new(proto::Ack {
            message: "queued".to_string(),
        }))
    }

    async fn lease_tasks(
        &self,
        request: Request<proto::LeaseRequest>,
    ) -> Result<Response<proto::LeaseResponse>, Status> {
        let req = request.into_inner();
        let mut state = self.state.lock();
        state.counters.lease_calls += 1;

        let max = req.max_batch_size as usize;
        let mut leased = Vec::new();
        let mut remaining = Vec::new();
        for task in std::mem::take(&mut state.tasks) {
            if task.model_id == req.target_model_id && leased.len() < max {
                leased.push(proto::LeasedTask {
                    hash: task.hash,
                    sequence: task.sequence,
                });
            } else {
                remaining.push(task);
            }
        }
        state.tasks = remaining;

        Ok(Response::new(proto::LeaseResponse { tasks: leased }))
    }

    async fn submit_batch(
        &self,
        request: Request<proto::BatchResult>,
    ) -> Result<Response<proto::Ack>, Status> {
        let req = request.into_inner();
        let mut state = self.state.lock();
        state.counters.submit_batch_calls += 1;

        let mut stored = 0_usize;
        for entry in req.results {
            let vector: Vec<f32> = serde_json::from_slice(&entry.embedding_payload)
                .map_err(|e| Status::invalid_argument(e.to_string()))?;
            state.entries.insert(
                (entry.key, req.model_id.clone()),
                (vector, entry.confidence_score),
            );
            stored += 1;
        }

        Ok(Response::new(proto::Ack {
            message: format!("stored {} embeddings", stored),
        }))
    }

    async fn clear(
        &self,
        _request: Request<proto::ClearRequest>,
    ) -> Result<Response<proto::Ack>, Status> {
        let mut state = self.state.lock();
        state.counters.clear_calls += 1;
        state.entries.clear();
        state.tasks.clear();
        Ok(Response::new(proto::Ack {
            message: "cleared".to_string(),
        }))
    }
}

#[tonic::async_trait]
impl Health for StubCacheService {
    async fn check(
        &self,
        _request: Request<proto::HealthCheckRequest>,
    ) -> Result<Response<proto::HealthCheckResponse>, Status> {
        let mut state = self.state.lock();
        state.counters.health_checks += 1;
        if state.fail_health {
            return Err(Status::unavailable("stub health outage"));
        }
        let mut resp = proto::HealthCheckResponse::default();
        resp.set_status(if state.serving {
            ServingStatus::Serving
        } else {
            ServingStatus::NotServing
        });
        Ok(Response::new(resp))
    }
}

/// Handle to a running stub server. The server task is aborted on drop.
pub struct StubServer {
    endpoint: String,
    state: Arc<Mutex<StubState>>,
    handle: JoinHandle<()>,
}

impl StubServer {
    /// Start a stub serving both `CacheService` and `Health` on an
    /// ephemeral local port.
    pub async fn start() -> Result<Self> {
        Self::start_service(StubCacheService::new()).await
    }

    /// Start a stub over a caller-prepared service, handy when the state
    /// must be seeded before any RPC lands.
    pub async fn start_service(service: StubCacheService) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let bound_addr = listener.local_addr()?;
        let state = service.state();

        let cache = CacheServiceServer::new(service.clone());
        let health = HealthServer::new(service);
        let handle = tokio::spawn(async move {
            let _ = Server::builder()
                .add_service(cache)
                .add_service(health)
                .serve_with_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
                .await;
        });

        Ok(Self {
            endpoint: format!("http://{}", bound_addr),
            state,
            handle,
        })
    }

    /// Endpoint URL to pass to clients, e.g. `http://127.0.0.1:41523`.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn state(&self) -> Arc<Mutex<StubState>> {
        Arc::clone(&self.state)
    }

    /// Flip the health answer.
    pub fn set_serving(&self, serving: bool) {
        self.state.lock().serving = serving;
    }

    /// Snapshot of the call counters.
    pub fn counters(&self) -> StubCounters {
        self.state.lock().counters
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grpc::{CacheClient, ComputedEmbedding, HealthClient};
    use std::time::Duration;

    #[tokio::test]
    async fn test_stub_roundtrip() {
        let server = StubServer::start().await.unwrap();
        let client = CacheClient::connect(server.endpoint()).await.unwrap();

        assert!(client.get("abcd", "model-a").await.unwrap().is_none());

        client.submit_task("abcd", "MKVL", "model-a").await.unwrap();
        client.submit_task("abcd", "MKVL", "model-a").await.unwrap();
        assert_eq!(server.state().lock().queued_for("model-a"), 1);

        let tasks = client.lease_tasks("model-a", 8).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].fingerprint_hex, "abcd");
        assert_eq!(server.state().lock().queued_for("model-a"), 0);

        let batch = vec![ComputedEmbedding {
            fingerprint_hex: "abcd".to_string(),
            vector: vec![0.6, 0.8],
            confidence: 1.0,
        }];
        client.submit_batch("model-a", &batch).await.unwrap();

        let hit = client.get("abcd", "model-a").await.unwrap().unwrap();
        assert_eq!(hit.vector, vec![0.6, 0.8]);
        assert_eq!(hit.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_lease_respects_model_and_batch_size() {
        let server = StubServer::start().await.unwrap();
        let client = CacheClient::connect(server.endpoint()).await.unwrap();

        for i in 0..3 {
            let hash = format!("aa{:02}", i);
            client.submit_task(&hash, "SEQ", "model-a").await.unwrap();
        }
        client.submit_task("bb00", "SEQ", "model-b").await.unwrap();

        let tasks = client.lease_tasks("model-a", 2).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].fingerprint_hex, "aa00");
        assert_eq!(tasks[1].fingerprint_hex, "aa01");

        let state = server.state();
        let state = state.lock();
        assert_eq!(state.queued_for("model-a"), 1);
        assert_eq!(state.queued_for("model-b"), 1);
    }

    #[tokio::test]
    async fn test_health_flip() {
        let server = StubServer::start().await.unwrap();
        let health = HealthClient::connect(server.endpoint(), Duration::from_secs(2))
            .await
            .unwrap();

        assert!(health.check("").await.unwrap());
        server.set_serving(false);
        assert!(!health.check("").await.unwrap());

        server.state().lock().fail_health = true;
        assert!(health.check("").await.is_err());
    }

    #[tokio::test]
    async fn test_get_outage_is_an_error_not_a_miss() {
        let server = StubServer::start().await.unwrap();
        let client = CacheClient::connect(server.endpoint()).await.unwrap();

        server.state().lock().fail_get = true;
        assert!(client.get("abcd", "model-a").await.is_err());
    }

    #[tokio::test]
    async fn test_clear_empties_cache_and_queue() {
        let server = StubServer::start().await.unwrap();
        let client = CacheClient::connect(server.endpoint()).await.unwrap();

        client.submit_task("abcd", "SEQ", "model-a").await.unwrap();
        server
            .state()
            .lock()
            .insert_entry("abcd", "model-a", vec![1.0], 1.0);

        client.clear().await.unwrap();

        let state = server.state();
        let state = state.lock();
        assert!(state.entries.is_empty());
        assert!(state.tasks.is_empty());
    }
}
