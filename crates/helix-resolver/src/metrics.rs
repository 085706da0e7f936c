//! Metrics and reporting for the resolution core.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Resolution outcome metrics (thread-safe counters).
#[derive(Debug, Clone)]
pub struct ResolverMetrics {
    /// Resolutions answered by the remote cache
    pub remote_cache_hits: Arc<AtomicU64>,
    /// Resolutions answered by the durable store
    pub durable_store_hits: Arc<AtomicU64>,
    /// Resolutions that found an already-pending job
    pub job_queue_answers: Arc<AtomicU64>,
    /// Resolutions that created a job and dispatched a task
    pub jobs_dispatched: Arc<AtomicU64>,
    /// Resolutions served by the local fallback path
    pub local_fallbacks: Arc<AtomicU64>,
    /// Resolutions ending in ERROR status
    pub resolution_errors: Arc<AtomicU64>,
    /// Remote cache RPC failures degraded to the next tier
    pub remote_degradations: Arc<AtomicU64>,
}

impl Default for ResolverMetrics {
    fn default() -> Self {
        Self {
            remote_cache_hits: Arc::new(AtomicU64::new(0)),
            durable_store_hits: Arc::new(AtomicU64::new(0)),
            job_queue_answers: Arc::new(AtomicU64::new(0)),
            jobs_dispatched: Arc::new(AtomicU64::new(0)),
            local_fallbacks: Arc::new(AtomicU64::new(0)),
            resolution_errors: Arc::new(AtomicU64::new(0)),
            remote_degradations: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl ResolverMetrics {
    /// Record a remote cache hit.
    pub fn record_remote_cache_hit(&self) {
        self.remote_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a durable store hit.
    pub fn record_durable_store_hit(&self) {
        self.durable_store_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a pending answer from the job registry.
    pub fn record_job_queue_answer(&self) {
        self.job_queue_answers.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a freshly dispatched job.
    pub fn record_job_dispatched(&self) {
        self.jobs_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a local fallback answer.
    pub fn record_local_fallback(&self) {
        self.local_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an ERROR-status answer.
    pub fn record_resolution_error(&self) {
        self.resolution_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache RPC failure degraded to the next tier.
    pub fn record_remote_degradation(&self) {
        self.remote_degradations.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current metrics.
    pub fn snapshot(&self) -> ResolverMetricsSnapshot {
        ResolverMetricsSnapshot {
            remote_cache_hits: self.remote_cache_hits.load(Ordering::Relaxed),
            durable_store_hits: self.durable_store_hits.load(Ordering::Relaxed),
            job_queue_answers: self.job_queue_answers.load(Ordering::Relaxed),
            jobs_dispatched: self.jobs_dispatched.load(Ordering::Relaxed),
            local_fallbacks: self.local_fallbacks.load(Ordering::Relaxed),
            resolution_errors: self.resolution_errors.load(Ordering::Relaxed),
            remote_degradations: self.remote_degradations.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.remote_cache_hits.store(0, Ordering::Relaxed);
        self.durable_store_hits.store(0, Ordering::Relaxed);
        self.job_queue_answers.store(0, Ordering::Relaxed);
        self.jobs_dispatched.store(0, Ordering::Relaxed);
        self.local_fallbacks.store(0, Ordering::Relaxed);
        self.resolution_errors.store(0, Ordering::Relaxed);
        self.remote_degradations.store(0, Ordering::Relaxed);
    }
}

/// Snapshot of metrics (for reporting).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverMetricsSnapshot {
    pub remote_cache_hits: u64,
    pub durable_store_hits: u64,
    pub job_queue_answers: u64,
    pub jobs_dispatched: u64,
    pub local_fallbacks: u64,
    pub resolution_errors: u64,
    pub remote_degradations: u64,
}

impl ResolverMetricsSnapshot {
    /// Total resolutions answered.
    pub fn total_resolutions(&self) -> u64 {
        self.remote_cache_hits
            + self.durable_store_hits
            + self.job_queue_answers
            + self.jobs_dispatched
            + self.local_fallbacks
            + self.resolution_errors
    }

    /// Share of resolutions that returned a vector immediately.
    pub fn completion_rate(&self) -> f64 {
        let total = self.total_resolutions();
        if total == 0 {
            return 0.0;
        }
        let completed = self.remote_cache_hits + self.durable_store_hits + self.local_fallbacks;
        completed as f64 / total as f64
    }

    /// Format a human-readable report.
    pub fn format_report(&self) -> String {
        let mut lines = Vec::new();
        lines.push("Resolver Metrics Report".to_string());
        lines.push("=".repeat(50));
        lines.push("Answers by Source:".to_string());
        lines.push(format!("  Remote Cache:    {}", self.remote_cache_hits));
        lines.push(format!("  Durable Store:   {}", self.durable_store_hits));
        lines.push(format!("  Job Queue:       {}", self.job_queue_answers));
        lines.push(format!("  New Jobs:        {}", self.jobs_dispatched));
        lines.push(format!("  Local Fallback:  {}", self.local_fallbacks));
        lines.push(format!("  Errors:          {}", self.resolution_errors));
        lines.push(String::new());
        lines.push(format!(
            "Completion Rate:   {:.1}%",
            self.completion_rate() * 100.0
        ));
        lines.push(format!("Cache Degradations: {}", self.remote_degradations));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_totals() {
        let metrics = ResolverMetrics::default();
        metrics.record_remote_cache_hit();
        metrics.record_remote_cache_hit();
        metrics.record_durable_store_hit();
        metrics.record_job_dispatched();

        let snap = metrics.snapshot();
        assert_eq!(snap.total_resolutions(), 4);
        assert_eq!(snap.completion_rate(), 0.75);
    }

    #[test]
    fn test_degradations_not_counted_as_answers() {
        let metrics = ResolverMetrics::default();
        metrics.record_remote_degradation();
        metrics.record_durable_store_hit();

        let snap = metrics.snapshot();
        assert_eq!(snap.total_resolutions(), 1);
        assert_eq!(snap.remote_degradations, 1);
    }

    #[test]
    fn test_empty_completion_rate_is_zero() {
        let snap = ResolverMetrics::default().snapshot();
        assert_eq!(snap.completion_rate(), 0.0);
    }

    #[test]
    fn test_reset() {
        let metrics = ResolverMetrics::default();
        metrics.record_local_fallback();
        metrics.record_resolution_error();
        metrics.reset();
        let snap = metrics.snapshot();
        assert_eq!(snap.total_resolutions(), 0);
    }

    #[test]
    fn test_format_report_mentions_sections() {
        let metrics = ResolverMetrics::default();
        metrics.record_job_queue_answer();
        let report = metrics.snapshot().format_report();
        assert!(report.contains("Answers by Source:"));
        assert!(report.contains("Completion Rate:"));
    }
}
