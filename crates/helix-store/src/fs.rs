//! Filesystem-backed durable store with sharded directory layout.

use anyhow::{anyhow, Result};
use helix_embed::cosine_distance;
use helix_types::{JobRecord, JobStatus, ModelProfile, SequenceFingerprint, SequenceMetadata};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::metrics::StoreMetrics;
use crate::paths::{
    atomic_write, atomic_write_json, create_new_with_contents, job_path, partition_root,
    record_path, vector_path,
};
use crate::records::{EmbeddingRecord, MetadataStore, SimilarMatch, StoredEmbedding};

/// Filesystem adapter for the durable store contract.
///
/// Records and jobs are JSON files keyed by model identity; vectors are
/// bincode files inside the model's partition. Job creation stays
/// conflict-safe across processes because it is backed by an atomic
/// link-into-place, not an in-process lock.
pub struct FsMetadataStore {
    store_root: Arc<Path>,
    metrics: StoreMetrics,
}

impl FsMetadataStore {
    /// Create a new filesystem store rooted at `store_root`.
    pub fn new<P: AsRef<Path>>(store_root: P) -> Result<Self> {
        let store_root = store_root.as_ref().to_path_buf();
        std::fs::create_dir_all(&store_root)
            .map_err(|e| anyhow!("Failed to create store root {}: {}", store_root.display(), e))?;
        Ok(Self {
            store_root: Arc::from(store_root),
            metrics: StoreMetrics::default(),
        })
    }

    /// Get the store root path.
    pub fn store_root(&self) -> &Path {
        &self.store_root
    }

    /// Operation counters for this store instance.
    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    /// Load a stored embedding. Requires both the record and the vector
    /// file; a half-written pair reads as a miss.
    pub fn load_record(
        &self,
        fingerprint: &SequenceFingerprint,
        profile: &ModelProfile,
    ) -> Result<Option<StoredEmbedding>> {
        let record_path = record_path(&self.store_root, &profile.id, fingerprint);
        let vector_path = vector_path(&self.store_root, &profile.partition, fingerprint);

        if !record_path.exists() || !vector_path.exists() {
            self.metrics.record_lookup_miss();
            return Ok(None);
        }

        let record = read_record_file(&record_path)?;
        let vector = read_vector_file(&vector_path)?;

        self.metrics.record_lookup_hit();
        Ok(Some(StoredEmbedding { vector, record }))
    }

    /// Current job status, if a job row exists.
    pub fn job_status(
        &self,
        fingerprint: &SequenceFingerprint,
        profile: &ModelProfile,
    ) -> Result<Option<JobStatus>> {
        let path = job_path(&self.store_root, &profile.id, fingerprint);
        if !path.exists() {
            return Ok(None);
        }
        let job = read_job_file(&path)?;
        Ok(Some(job.status))
    }

    /// Conflict-safe job creation; `true` iff this call created the row.
    pub fn create_job(
        &self,
        fingerprint: &SequenceFingerprint,
        profile: &ModelProfile,
        node_label: &str,
    ) -> Result<bool> {
        let path = job_path(&self.store_root, &profile.id, fingerprint);
        let job = JobRecord::pending(*fingerprint, profile.id.clone(), node_label);
        let json = serde_json::to_vec(&job)
            .map_err(|e| anyhow!("Failed to serialize job record: {}", e))?;
        let created = create_new_with_contents(&path, &json)?;
        if created {
            self.metrics.record_job_created();
        } else {
            self.metrics.record_job_conflict();
        }
        Ok(created)
    }

    /// Transition a job to COMPLETED; no-op when no row exists.
    pub fn complete_job(
        &self,
        fingerprint: &SequenceFingerprint,
        profile: &ModelProfile,
    ) -> Result<()> {
        let path = job_path(&self.store_root, &profile.id, fingerprint);
        if !path.exists() {
            return Ok(());
        }
        let mut job = read_job_file(&path)?;
        job.complete();
        atomic_write_json(&path, &job)?;
        self.metrics.record_job_completed();
        Ok(())
    }

    /// Idempotent upsert: the vector is always overwritten, the record is
    /// merged per [`EmbeddingRecord::apply_update`].
    pub fn write_record(
        &self,
        fingerprint: &SequenceFingerprint,
        profile: &ModelProfile,
        vector: &[f32],
        confidence: f32,
        metadata: &SequenceMetadata,
        is_fallback: bool,
    ) -> Result<()> {
        let record_path = record_path(&self.store_root, &profile.id, fingerprint);
        let vector_path = vector_path(&self.store_root, &profile.partition, fingerprint);

        let record = if record_path.exists() {
            let mut existing = read_record_file(&record_path)?;
            existing.apply_update(confidence, is_fallback, metadata);
            existing
        } else {
            EmbeddingRecord::new(
                *fingerprint,
                profile.id.clone(),
                confidence,
                is_fallback,
                metadata.clone(),
            )
        };

        let encoded = bincode::serialize(&vector.to_vec())
            .map_err(|e| anyhow!("Failed to serialize vector: {}", e))?;

        // Vector first: the record file is the commit point for readers
        atomic_write(&vector_path, &encoded)?;
        atomic_write_json(&record_path, &record)?;

        self.metrics.record_upsert();
        Ok(())
    }

    /// Scan the model's partition for the nearest vectors.
    pub fn similar(
        &self,
        vector: &[f32],
        profile: &ModelProfile,
        limit: usize,
    ) -> Result<Vec<SimilarMatch>> {
        self.metrics.record_similarity_query();

        let mut ranked: Vec<(SequenceFingerprint, f32)> = Vec::new();
        for (fp, path) in self.partition_vector_files(&profile.partition)? {
            let stored = read_vector_file(&path)?;
            ranked.push((fp, cosine_distance(vector, &stored)));
        }
        ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(limit);

        let mut matches = Vec::with_capacity(ranked.len());
        for (fp, distance) in ranked {
            let record_path = record_path(&self.store_root, &profile.id, &fp);
            if !record_path.exists() {
                continue;
            }
            let record = read_record_file(&record_path)?;
            matches.push(SimilarMatch {
                fingerprint: fp,
                distance,
                primary_accession: record.metadata.primary_accession,
                protein_name: record.metadata.protein_name,
                organism: record.metadata.organism,
                is_fallback: record.is_fallback,
            });
        }
        Ok(matches)
    }

    fn partition_vector_files(
        &self,
        partition: &str,
    ) -> Result<Vec<(SequenceFingerprint, PathBuf)>> {
        let root = partition_root(&self.store_root, partition);
        let mut files = Vec::new();
        if !root.exists() {
            return Ok(files);
        }
        for aa in read_dir(&root)? {
            let aa = aa?;
            if !aa.file_type()?.is_dir() {
                continue;
            }
            for bb in read_dir(&aa.path())? {
                let bb = bb?;
                if !bb.file_type()?.is_dir() {
                    continue;
                }
                for file in read_dir(&bb.path())? {
                    let path = file?.path();
                    if path.extension().and_then(|s| s.to_str()) != Some("bin") {
                        continue;
                    }
                    let stem = match path.file_stem().and_then(|s| s.to_str()) {
                        Some(s) => s,
                        None => continue,
                    };
                    let fp = match stem.parse::<SequenceFingerprint>() {
                        Ok(fp) => fp,
                        Err(_) => continue,
                    };
                    files.push((fp, path));
                }
            }
        }
        Ok(files)
    }
}

fn read_dir(path: &Path) -> Result<std::fs::ReadDir> {
    std::fs::read_dir(path)
        .map_err(|e| anyhow!("Failed to read directory {}: {}", path.display(), e))
}

fn read_record_file(path: &Path) -> Result<EmbeddingRecord> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read record file {}: {}", path.display(), e))?;
    serde_json::from_str(&json).map_err(|e| anyhow!("Failed to parse record JSON: {}", e))
}

fn read_job_file(path: &Path) -> Result<JobRecord> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read job file {}: {}", path.display(), e))?;
    serde_json::from_str(&json).map_err(|e| anyhow!("Failed to parse job JSON: {}", e))
}

fn read_vector_file(path: &Path) -> Result<Vec<f32>> {
    let bytes = std::fs::read(path)
        .map_err(|e| anyhow!("Failed to read vector file {}: {}", path.display(), e))?;
    bincode::deserialize(&bytes).map_err(|e| anyhow!("Failed to decode vector file: {}", e))
}

#[async_trait::async_trait]
impl MetadataStore for FsMetadataStore {
    async fn get_record(
        &self,
        fingerprint: &SequenceFingerprint,
        profile: &ModelProfile,
    ) -> Result<Option<StoredEmbedding>> {
        self.load_record(fingerprint, profile)
    }

    async fn get_job_status(
        &self,
        fingerprint: &SequenceFingerprint,
        profile: &ModelProfile,
    ) -> Result<Option<JobStatus>> {
        self.job_status(fingerprint, profile)
    }

    async fn create_job_if_absent(
        &self,
        fingerprint: &SequenceFingerprint,
        profile: &ModelProfile,
        node_label: &str,
    ) -> Result<bool> {
        self.create_job(fingerprint, profile, node_label)
    }

    async fn mark_job_complete(
        &self,
        fingerprint: &SequenceFingerprint,
        profile: &ModelProfile,
    ) -> Result<()> {
        self.complete_job(fingerprint, profile)
    }

    async fn upsert_record(
        &self,
        fingerprint: &SequenceFingerprint,
        profile: &ModelProfile,
        vector: &[f32],
        confidence: f32,
        metadata: &SequenceMetadata,
        is_fallback: bool,
    ) -> Result<()> {
        self.write_record(fingerprint, profile, vector, confidence, metadata, is_fallback)
    }

    async fn find_similar(
        &self,
        vector: &[f32],
        profile: &ModelProfile,
        limit: usize,
    ) -> Result<Vec<SimilarMatch>> {
        self.similar(vector, profile, limit)
    }
}
