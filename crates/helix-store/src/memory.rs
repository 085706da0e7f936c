//! In-memory durable-store adapter for tests and single-process setups.

use anyhow::Result;
use helix_embed::cosine_distance;
use helix_types::{JobRecord, JobStatus, ModelProfile, SequenceFingerprint, SequenceMetadata};
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::metrics::StoreMetrics;
use crate::records::{EmbeddingRecord, MetadataStore, SimilarMatch, StoredEmbedding};

type PairKey = (SequenceFingerprint, String);

#[derive(Default)]
struct MemoryState {
    records: HashMap<PairKey, StoredEmbedding>,
    jobs: HashMap<PairKey, JobRecord>,
}

/// Mutex-backed store with the same contract as the filesystem adapter.
///
/// Job creation is conflict-safe within the process; cross-process setups
/// need the filesystem adapter (or a real database) instead.
#[derive(Default)]
pub struct MemoryMetadataStore {
    state: Mutex<MemoryState>,
    metrics: StoreMetrics,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operation counters for this store instance.
    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    /// Number of stored records across all models.
    pub fn record_count(&self) -> usize {
        self.state.lock().records.len()
    }

    /// Number of job rows across all models.
    pub fn job_count(&self) -> usize {
        self.state.lock().jobs.len()
    }
}

#[async_trait::async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn get_record(
        &self,
        fingerprint: &SequenceFingerprint,
        profile: &ModelProfile,
    ) -> Result<Option<StoredEmbedding>> {
        let state = self.state.lock();
        let found = state
            .records
            .get(&(*fingerprint, profile.id.clone()))
            .cloned();
        if found.is_some() {
            self.metrics.record_lookup_hit();
        } else {
            self.metrics.record_lookup_miss();
        }
        Ok(found)
    }

    async fn get_job_status(
        &self,
        fingerprint: &SequenceFingerprint,
        profile: &ModelProfile,
    ) -> Result<Option<JobStatus>> {
        let state = self.state.lock();
        Ok(state
            .jobs
            .get(&(*fingerprint, profile.id.clone()))
            .map(|job| job.status))
    }

    async fn create_job_if_absent(
        &self,
        fingerprint: &SequenceFingerprint,
        profile: &ModelProfile,
        node_label: &str,
    ) -> Result<bool> {
        let mut state = self.state.lock();
        match state.jobs.entry((*fingerprint, profile.id.clone())) {
            Entry::Occupied(_) => {
                self.metrics.record_job_conflict();
                Ok(false)
            }
            Entry::Vacant(slot) => {
                slot.insert(JobRecord::pending(
                    *fingerprint,
                    profile.id.clone(),
                    node_label,
                ));
                self.metrics.record_job_created();
                Ok(true)
            }
        }
    }

    async fn mark_job_complete(
        &self,
        fingerprint: &SequenceFingerprint,
        profile: &ModelProfile,
    ) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(job) = state.jobs.get_mut(&(*fingerprint, profile.id.clone())) {
            job.complete();
            self.metrics.record_job_completed();
        }
        Ok(())
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
        let mut state = self.state.lock();
        match state.records.entry((*fingerprint, profile.id.clone())) {
            Entry::Occupied(mut slot) => {
                let stored = slot.get_mut();
                stored.vector = vector.to_vec();
                stored.record.apply_update(confidence, is_fallback, metadata);
            }
            Entry::Vacant(slot) => {
                slot.insert(StoredEmbedding {
                    vector: vector.to_vec(),
                    record: EmbeddingRecord::new(
                        *fingerprint,
                        profile.id.clone(),
                        confidence,
                        is_fallback,
                        metadata.clone(),
                    ),
                });
            }
        }
        self.metrics.record_upsert();
        Ok(())
    }

    async fn find_similar(
        &self,
        vector: &[f32],
        profile: &ModelProfile,
        limit: usize,
    ) -> Result<Vec<SimilarMatch>> {
        self.metrics.record_similarity_query();
        let state = self.state.lock();
        let mut matches: Vec<SimilarMatch> = state
            .records
            .iter()
            .filter(|((_, model_id), _)| model_id == &profile.id)
            .map(|((fp, _), stored)| SimilarMatch {
                fingerprint: *fp,
                distance: cosine_distance(vector, &stored.vector),
                primary_accession: stored.record.metadata.primary_accession.clone(),
                protein_name: stored.record.metadata.protein_name.clone(),
                organism: stored.record.metadata.organism.clone(),
                is_fallback: stored.record.is_fallback,
            })
            .collect();
        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helix_types::fingerprint;

    fn tiny_profile() -> ModelProfile {
        ModelProfile::new("tiny", 2, "tiny_part")
    }

    #[tokio::test]
    async fn test_upsert_and_get() -> Result<()> {
        let store = MemoryMetadataStore::new();
        let profile = tiny_profile();
        let fp = fingerprint("MVLSPADKTN");

        assert!(store.get_record(&fp, &profile).await?.is_none());

        store
            .upsert_record(
                &fp,
                &profile,
                &[0.6, 0.8],
                1.0,
                &SequenceMetadata::from_sequence("MVLSPADKTN"),
                false,
            )
            .await?;

        let stored = store.get_record(&fp, &profile).await?.expect("stored");
        assert_eq!(stored.vector, vec![0.6, 0.8]);
        assert_eq!(stored.record.confidence, 1.0);
        assert_eq!(store.record_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() -> Result<()> {
        let store = MemoryMetadataStore::new();
        let profile = tiny_profile();
        let fp = fingerprint("MVLSPADKTN");
        let meta = SequenceMetadata::default();

        store.upsert_record(&fp, &profile, &[1.0, 0.0], 0.5, &meta, true).await?;
        store.upsert_record(&fp, &profile, &[0.0, 1.0], 1.0, &meta, false).await?;

        assert_eq!(store.record_count(), 1);
        let stored = store.get_record(&fp, &profile).await?.expect("stored");
        assert_eq!(stored.vector, vec![0.0, 1.0]);
        assert!(!stored.record.is_fallback);
        Ok(())
    }

    #[tokio::test]
    async fn test_job_create_conflict() -> Result<()> {
        let store = MemoryMetadataStore::new();
        let profile = tiny_profile();
        let fp = fingerprint("MVLSPADKTN");

        assert!(store.create_job_if_absent(&fp, &profile, "node-1").await?);
        assert!(!store.create_job_if_absent(&fp, &profile, "node-2").await?);
        assert_eq!(
            store.get_job_status(&fp, &profile).await?,
            Some(JobStatus::Pending)
        );

        store.mark_job_complete(&fp, &profile).await?;
        assert_eq!(
            store.get_job_status(&fp, &profile).await?,
            Some(JobStatus::Completed)
        );
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_job_creation_single_winner() -> Result<()> {
        let store = std::sync::Arc::new(MemoryMetadataStore::new());
        let profile = tiny_profile();
        let fp = fingerprint("MVLSPADKTN");

        let mut handles = Vec::new();
        for i in 0..64 {
            let store = std::sync::Arc::clone(&store);
            let profile = profile.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create_job_if_absent(&fp, &profile, &format!("node-{}", i))
                    .await
            }));
        }
        let mut created = 0;
        for handle in handles {
            if handle.await?? {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.job_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_find_similar_scoped_to_model() -> Result<()> {
        let store = MemoryMetadataStore::new();
        let tiny = tiny_profile();
        let other = ModelProfile::new("other", 2, "other_part");
        let meta = SequenceMetadata::default();

        store.upsert_record(&fingerprint("AAA"), &tiny, &[1.0, 0.0], 1.0, &meta, false).await?;
        store.upsert_record(&fingerprint("CCC"), &tiny, &[0.0, 1.0], 1.0, &meta, false).await?;
        store.upsert_record(&fingerprint("DDD"), &other, &[1.0, 0.0], 1.0, &meta, false).await?;

        let matches = store.find_similar(&[1.0, 0.0], &tiny, 10).await?;
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].fingerprint, fingerprint("AAA"));
        assert!(matches[0].distance < matches[1].distance);
        Ok(())
    }
}
