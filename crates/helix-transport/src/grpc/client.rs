//! gRPC client implementation for the remote compute tier.
//!
//! The remote tier runs two services:
//! - **CacheService** - embedding cache + task queue, served by the gateway
//! - **Health** - standard health checking protocol, served by each worker
//!
//! Set the `HELIX_CACHE_ENDPOINT` / `HELIX_HEALTH_ENDPOINT` environment
//! variables or pass endpoints explicitly via `connect()`.

use std::time::Duration;

use anyhow::{anyhow, Result};
use tonic::transport::Channel;

use super::generated::helix_cache_v1::{
    self as proto, cache_service_client::CacheServiceClient,
    health_check_response::ServingStatus, health_client::HealthClient as HealthServiceClient,
};

/// Default per-request deadline for cache RPCs.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default TCP connect deadline.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Encode an embedding vector as the wire payload (JSON array of floats).
///
/// The payload format is shared with the non-Rust halves of the system, so
/// it stays architecture-neutral text rather than raw little-endian bytes.
pub fn encode_vector(vector: &[f32]) -> Result<Vec<u8>> {
    serde_json::to_vec(vector).map_err(|e| anyhow!("Failed to encode embedding payload: {}", e))
}

/// Decode a wire payload back into an embedding vector.
pub fn decode_vector(payload: &[u8]) -> Result<Vec<f32>> {
    serde_json::from_slice(payload)
        .map_err(|e| anyhow!("Failed to decode embedding payload: {}", e))
}

/// A cache hit returned by `CacheService/Get`.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEmbedding {
    pub vector: Vec<f32>,
    pub confidence: f32,
    pub model_id: String,
}

impl CachedEmbedding {
    /// Convert a raw `ValueResponse` into an optional hit.
    ///
    /// `found == false` maps to `None`; a found response with an
    /// undecodable payload is an error, not a miss.
    pub fn from_response(resp: proto::ValueResponse) -> Result<Option<Self>> {
        if !resp.found {
            return Ok(None);
        }
        let vector = decode_vector(&resp.value)?;
        Ok(Some(Self {
            vector,
            confidence: resp.confidence_score,
            model_id: resp.model_id,
        }))
    }
}

/// One unit of work leased from the task queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeTask {
    /// Hex fingerprint of the normalized sequence.
    pub fingerprint_hex: String,
    /// Raw sequence text as submitted by the resolver.
    pub sequence: String,
}

impl From<proto::LeasedTask> for ComputeTask {
    fn from(task: proto::LeasedTask) -> Self {
        Self {
            fingerprint_hex: task.hash,
            sequence: task.sequence,
        }
    }
}

/// One computed embedding reported back via `SubmitBatch`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedEmbedding {
    pub fingerprint_hex: String,
    pub vector: Vec<f32>,
    pub confidence: f32,
}

impl ComputedEmbedding {
    fn to_entry(&self) -> Result<proto::BatchEntry> {
        Ok(proto::BatchEntry {
            key: self.fingerprint_hex.clone(),
            embedding_payload: encode_vector(&self.vector)?,
            confidence_score: self.confidence,
        })
    }
}

async fn connect_channel(
    endpoint: &str,
    request_timeout: Duration,
    connect_timeout: Duration,
) -> Result<Channel> {
    // Configure TLS for HTTPS endpoints; plaintext for in-cluster addresses
    let channel = if endpoint.starts_with("https://") {
        Channel::from_shared(endpoint.to_string())?
            .tls_config(tonic::transport::ClientTlsConfig::new().with_webpki_roots())?
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .connect()
            .await
            .map_err(|e| anyhow!("Failed to connect to gRPC endpoint {}: {}", endpoint, e))?
    } else {
        Channel::from_shared(endpoint.to_string())?
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .connect()
            .await
            .map_err(|e| anyhow!("Failed to connect to gRPC endpoint {}: {}", endpoint, e))?
    };
    Ok(channel)
}

/// Client for the remote cache and task queue.
///
/// Cheap to clone per call: each method opens a fresh generated client over
/// the shared channel, so methods only need `&self`.
pub struct CacheClient {
    endpoint: String,
    channel: Channel,
}

impl CacheClient {
    /// Connect with default timeouts.
    pub async fn connect(endpoint: &str) -> Result<Self> {
        Self::connect_with_timeouts(endpoint, DEFAULT_REQUEST_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
            .await
    }

    /// Connect with explicit request and connect deadlines.
    pub async fn connect_with_timeouts(
        endpoint: &str,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let channel = connect_channel(endpoint, request_timeout, connect_timeout).await?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            channel,
        })
    }

    /// Get the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Look up a cached embedding by (fingerprint, model identity).
    ///
    /// Returns `Ok(None)` on a clean miss. Transport or server failures
    /// surface as errors so callers can degrade instead of treating an
    /// outage as a miss.
    pub async fn get(&self, fingerprint_hex: &str, model_id: &str) -> Result<Option<CachedEmbedding>> {
        let mut client = CacheServiceClient::new(self.channel.clone());

        let response = client
            .get(proto::KeyRequest {
                key: fingerprint_hex.to_string(),
                model_id: model_id.to_string(),
            })
            .await
            .map_err(|e| anyhow!("gRPC error: {}", e))?;

        CachedEmbedding::from_response(response.into_inner())
    }

    /// Enqueue one computation task for the worker pool.
    pub async fn submit_task(
        &self,
        fingerprint_hex: &str,
        sequence: &str,
        model_id: &str,
    ) -> Result<()> {
        let mut client = CacheServiceClient::new(self.channel.clone());

        client
            .submit_task(proto::TaskRequest {
                hash: fingerprint_hex.to_string(),
                sequence: sequence.to_string(),
                model_id: model_id.to_string(),
            })
            .await
            .map_err(|e| anyhow!("gRPC error: {}", e))?;

        Ok(())
    }

    /// Lease up to `max_batch_size` queued tasks for one model identity.
    ///
    /// Leased tasks are removed from the queue; the worker is expected to
    /// report their results in a following `submit_batch` call.
    pub async fn lease_tasks(
        &self,
        target_model_id: &str,
        max_batch_size: u32,
    ) -> Result<Vec<ComputeTask>> {
        let mut client = CacheServiceClient::new(self.channel.clone());

        let response = client
            .lease_tasks(proto::LeaseRequest {
                target_model_id: target_model_id.to_string(),
                max_batch_size,
            })
            .await
            .map_err(|e| anyhow!("gRPC error: {}", e))?;

        Ok(response
            .into_inner()
            .tasks
            .into_iter()
            .map(ComputeTask::from)
            .collect())
    }

    /// Report a batch of computed embeddings in a single RPC.
    pub async fn submit_batch(&self, model_id: &str, results: &[ComputedEmbedding]) -> Result<()> {
        let mut client = CacheServiceClient::new(self.channel.clone());

        let entries = results
            .iter()
            .map(ComputedEmbedding::to_entry)
            .collect::<Result<Vec<_>>>()?;

        client
            .submit_batch(proto::BatchResult {
                model_id: model_id.to_string(),
                results: entries,
            })
            .await
            .map_err(|e| anyhow!("gRPC error: {}", e))?;

        Ok(())
    }

    /// Drop all cached values and queued tasks.
    pub async fn clear(&self) -> Result<()> {
        let mut client = CacheServiceClient::new(self.channel.clone());

        client
            .clear(proto::ClearRequest {})
            .await
            .map_err(|e| anyhow!("gRPC error: {}", e))?;

        Ok(())
    }
}

/// Client for the standard health checking protocol.
///
/// Channels are built with the probe deadline as both the request and the
/// connect timeout, so a hung endpoint cannot stall the probe loop.
pub struct HealthClient {
    endpoint: String,
    channel: Channel,
}

impl HealthClient {
    /// Connect to a health endpoint with a single probe deadline.
    pub async fn connect(endpoint: &str, probe_timeout: Duration) -> Result<Self> {
        let channel = connect_channel(endpoint, probe_timeout, probe_timeout).await?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            channel,
        })
    }

    /// Get the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Probe the endpoint once.
    ///
    /// Returns `Ok(true)` only for an explicit `SERVING` answer within the
    /// deadline. `Ok(false)` means the endpoint answered with any other
    /// status; transport failures and deadline misses surface as errors.
    pub async fn check(&self, service: &str) -> Result<bool> {
        let mut client = HealthServiceClient::new(self.channel.clone());

        let response = client
            .check(proto::HealthCheckRequest {
                service: service.to_string(),
            })
            .await
            .map_err(|e| anyhow!("gRPC error: {}", e))?;

        Ok(response.into_inner().status() == ServingStatus::Serving)
    }
}
