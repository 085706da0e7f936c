//! Durable store contract and record types.
//!
//! The resolution core consumes six operations, each a single logical
//! transaction: record lookup, job lookup, conflict-safe job creation,
//! job completion, idempotent record upsert, and similarity search. No
//! cross-call transaction state is held by callers.

use anyhow::Result;
use chrono::{DateTime, Utc};
use helix_types::{JobStatus, ModelProfile, SequenceFingerprint, SequenceMetadata};
use serde::{Deserialize, Serialize};

/// Metadata record keyed by (fingerprint, model identity).
///
/// The vector itself lives in the model's partition; this record carries
/// provenance and biological enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub fingerprint: SequenceFingerprint,
    pub model_id: String,
    pub confidence: f32,
    /// True when the vector was produced by the local fallback path.
    pub is_fallback: bool,
    pub metadata: SequenceMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmbeddingRecord {
    /// Fresh record stamped with the current time.
    pub fn new(
        fingerprint: SequenceFingerprint,
        model_id: impl Into<String>,
        confidence: f32,
        is_fallback: bool,
        metadata: SequenceMetadata,
    ) -> Self {
        let now = Utc::now();
        Self {
            fingerprint,
            model_id: model_id.into(),
            confidence,
            is_fallback,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge an upsert into an existing record.
    ///
    /// Last writer wins on confidence, the fallback flag, protein name,
    /// PDB cross-references and residue annotations. Sequence text,
    /// accession, organism, function text and `created_at` keep their
    /// first-written values.
    pub fn apply_update(&mut self, confidence: f32, is_fallback: bool, metadata: &SequenceMetadata) {
        self.confidence = confidence;
        self.is_fallback = is_fallback;
        self.metadata.protein_name = metadata.protein_name.clone();
        self.metadata.pdb_ids = metadata.pdb_ids.clone();
        self.metadata.binding_sites = metadata.binding_sites.clone();
        self.updated_at = Utc::now();
    }
}

/// A stored embedding: the partition vector plus its metadata record.
#[derive(Debug, Clone)]
pub struct StoredEmbedding {
    pub vector: Vec<f32>,
    pub record: EmbeddingRecord,
}

/// One similarity-search match (summary row).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarMatch {
    pub fingerprint: SequenceFingerprint,
    /// Cosine distance to the query vector; results are ordered ascending.
    pub distance: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_accession: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organism: Option<String>,
    pub is_fallback: bool,
}

/// Durable store operations consumed by the resolution core.
///
/// Implementations must make `create_job_if_absent` conflict-safe under
/// arbitrary cross-process concurrency: for N racing creators of one
/// (fingerprint, model) pair, exactly one receives `true`.
#[async_trait::async_trait]
pub trait MetadataStore: Send + Sync {
    /// Look up a stored embedding. `Ok(None)` is a valid miss, not an error.
    async fn get_record(
        &self,
        fingerprint: &SequenceFingerprint,
        profile: &ModelProfile,
    ) -> Result<Option<StoredEmbedding>>;

    /// Current job status for the pair, if a job row exists.
    async fn get_job_status(
        &self,
        fingerprint: &SequenceFingerprint,
        profile: &ModelProfile,
    ) -> Result<Option<JobStatus>>;

    /// Create a PENDING job row unless one already exists.
    ///
    /// Returns `true` iff this call created the row. A `false` return is
    /// the dedup signal, not an error.
    async fn create_job_if_absent(
        &self,
        fingerprint: &SequenceFingerprint,
        profile: &ModelProfile,
        node_label: &str,
    ) -> Result<bool>;

    /// Transition an existing job to COMPLETED. A missing job row is a
    /// no-op: completion may be observed via the cache before the job is
    /// ever locally visible.
    async fn mark_job_complete(
        &self,
        fingerprint: &SequenceFingerprint,
        profile: &ModelProfile,
    ) -> Result<()>;

    /// Idempotent upsert of vector + record (see
    /// [`EmbeddingRecord::apply_update`] for the merge rules).
    async fn upsert_record(
        &self,
        fingerprint: &SequenceFingerprint,
        profile: &ModelProfile,
        vector: &[f32],
        confidence: f32,
        metadata: &SequenceMetadata,
        is_fallback: bool,
    ) -> Result<()>;

    /// Nearest stored vectors in the model's partition, ascending cosine
    /// distance, at most `limit` rows.
    async fn find_similar(
        &self,
        vector: &[f32],
        profile: &ModelProfile,
        limit: usize,
    ) -> Result<Vec<SimilarMatch>>;
}
