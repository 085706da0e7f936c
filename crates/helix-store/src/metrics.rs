//! Metrics and reporting for durable-store operations.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Store operation metrics (thread-safe counters).
#[derive(Debug, Clone)]
pub struct StoreMetrics {
    /// Record lookups that found a stored embedding
    pub lookup_hits: Arc<AtomicU64>,
    /// Record lookups that missed
    pub lookup_misses: Arc<AtomicU64>,
    /// Record upserts (create or merge)
    pub upserts: Arc<AtomicU64>,
    /// Job rows created by this process
    pub jobs_created: Arc<AtomicU64>,
    /// Job creations that lost the race to an existing row
    pub job_conflicts: Arc<AtomicU64>,
    /// Jobs transitioned to COMPLETED
    pub jobs_completed: Arc<AtomicU64>,
    /// Similarity queries served
    pub similarity_queries: Arc<AtomicU64>,
}

impl Default for StoreMetrics {
    fn default() -> Self {
        Self {
            lookup_hits: Arc::new(AtomicU64::new(0)),
            lookup_misses: Arc::new(AtomicU64::new(0)),
            upserts: Arc::new(AtomicU64::new(0)),
            jobs_created: Arc::new(AtomicU64::new(0)),
            job_conflicts: Arc::new(AtomicU64::new(0)),
            jobs_completed: Arc::new(AtomicU64::new(0)),
            similarity_queries: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl StoreMetrics {
    /// Record a lookup hit.
    pub fn record_lookup_hit(&self) {
        self.lookup_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lookup miss.
    pub fn record_lookup_miss(&self) {
        self.lookup_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an upsert.
    pub fn record_upsert(&self) {
        self.upserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a job creation that won the race.
    pub fn record_job_created(&self) {
        self.jobs_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a job creation that found an existing row.
    pub fn record_job_conflict(&self) {
        self.job_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a job completion.
    pub fn record_job_completed(&self) {
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a similarity query.
    pub fn record_similarity_query(&self) {
        self.similarity_queries.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current metrics.
    pub fn snapshot(&self) -> StoreMetricsSnapshot {
        StoreMetricsSnapshot {
            lookup_hits: self.lookup_hits.load(Ordering::Relaxed),
            lookup_misses: self.lookup_misses.load(Ordering::Relaxed),
            upserts: self.upserts.load(Ordering::Relaxed),
            jobs_created: self.jobs_created.load(Ordering::Relaxed),
            job_conflicts: self.job_conflicts.load(Ordering::Relaxed),
            jobs_completed: self.jobs_completed.load(Ordering::Relaxed),
            similarity_queries: self.similarity_queries.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.lookup_hits.store(0, Ordering::Relaxed);
        self.lookup_misses.store(0, Ordering::Relaxed);
        self.upserts.store(0, Ordering::Relaxed);
        self.jobs_created.store(0, Ordering::Relaxed);
        self.job_conflicts.store(0, Ordering::Relaxed);
        self.jobs_completed.store(0, Ordering::Relaxed);
        self.similarity_queries.store(0, Ordering::Relaxed);
    }
}

/// Snapshot of metrics (for reporting).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMetricsSnapshot {
    pub lookup_hits: u64,
    pub lookup_misses: u64,
    pub upserts: u64,
    pub jobs_created: u64,
    pub job_conflicts: u64,
    pub jobs_completed: u64,
    pub similarity_queries: u64,
}

impl StoreMetricsSnapshot {
    /// Total record lookups.
    pub fn total_lookups(&self) -> u64 {
        self.lookup_hits + self.lookup_misses
    }

    /// Record lookup hit rate.
    pub fn lookup_hit_rate(&self) -> f64 {
        let total = self.total_lookups();
        if total == 0 {
            return 0.0;
        }
        self.lookup_hits as f64 / total as f64
    }

    /// Format a human-readable report.
    pub fn format_report(&self) -> String {
        let mut lines = Vec::new();
        lines.push("Store Metrics Report".to_string());
        lines.push("=".repeat(50));
        lines.push("Record Lookups:".to_string());
        lines.push(format!("  Hits:            {}", self.lookup_hits));
        lines.push(format!("  Misses:          {}", self.lookup_misses));
        lines.push(format!(
            "  Hit Rate:        {:.1}%",
            self.lookup_hit_rate() * 100.0
        ));
        lines.push(format!("  Upserts:         {}", self.upserts));
        lines.push(String::new());
        lines.push("Jobs:".to_string());
        lines.push(format!("  Created:         {}", self.jobs_created));
        lines.push(format!("  Conflicts:       {}", self.job_conflicts));
        lines.push(format!("  Completed:       {}", self.jobs_completed));
        lines.push(String::new());
        lines.push(format!("Similarity Queries: {}", self.similarity_queries));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_and_hit_rate() {
        let metrics = StoreMetrics::default();
        metrics.record_lookup_hit();
        metrics.record_lookup_hit();
        metrics.record_lookup_hit();
        metrics.record_lookup_miss();

        let snap = metrics.snapshot();
        assert_eq!(snap.total_lookups(), 4);
        assert_eq!(snap.lookup_hit_rate(), 0.75);
    }

    #[test]
    fn test_empty_hit_rate_is_zero() {
        let snap = StoreMetrics::default().snapshot();
        assert_eq!(snap.lookup_hit_rate(), 0.0);
    }

    #[test]
    fn test_reset() {
        let metrics = StoreMetrics::default();
        metrics.record_job_created();
        metrics.record_job_conflict();
        metrics.reset();
        let snap = metrics.snapshot();
        assert_eq!(snap.jobs_created, 0);
        assert_eq!(snap.job_conflicts, 0);
    }

    #[test]
    fn test_format_report_mentions_sections() {
        let metrics = StoreMetrics::default();
        metrics.record_upsert();
        let report = metrics.snapshot().format_report();
        assert!(report.contains("Record Lookups:"));
        assert!(report.contains("Jobs:"));
    }
}
