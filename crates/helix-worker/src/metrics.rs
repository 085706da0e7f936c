//! Metrics and reporting for the worker poll loop.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Poll-loop metrics (thread-safe counters).
#[derive(Debug, Clone)]
pub struct WorkerMetrics {
    /// Poll cycles completed, empty or not
    pub cycles: Arc<AtomicU64>,
    /// Tasks received from lease calls
    pub tasks_leased: Arc<AtomicU64>,
    /// Embeddings computed successfully
    pub embeddings_computed: Arc<AtomicU64>,
    /// Single-task computation failures (task left for re-lease)
    pub task_failures: Arc<AtomicU64>,
    /// Batches submitted
    pub batches_submitted: Arc<AtomicU64>,
    /// Whole poll cycles lost to transport failures
    pub poll_failures: Arc<AtomicU64>,
}

impl Default for WorkerMetrics {
    fn default() -> Self {
        Self {
            cycles: Arc::new(AtomicU64::new(0)),
            tasks_leased: Arc::new(AtomicU64::new(0)),
            embeddings_computed: Arc::new(AtomicU64::new(0)),
            task_failures: Arc::new(AtomicU64::new(0)),
            batches_submitted: Arc::new(AtomicU64::new(0)),
            poll_failures: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl WorkerMetrics {
    /// Record a completed poll cycle.
    pub fn record_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    /// Record leased tasks.
    pub fn record_tasks_leased(&self, count: u64) {
        self.tasks_leased.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a computed embedding.
    pub fn record_embedding_computed(&self) {
        self.embeddings_computed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a single-task failure.
    pub fn record_task_failure(&self) {
        self.task_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a submitted batch.
    pub fn record_batch_submitted(&self) {
        self.batches_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a poll cycle lost to a transport failure.
    pub fn record_poll_failure(&self) {
        self.poll_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current metrics.
    pub fn snapshot(&self) -> WorkerMetricsSnapshot {
        WorkerMetricsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            tasks_leased: self.tasks_leased.load(Ordering::Relaxed),
            embeddings_computed: self.embeddings_computed.load(Ordering::Relaxed),
            task_failures: self.task_failures.load(Ordering::Relaxed),
            batches_submitted: self.batches_submitted.load(Ordering::Relaxed),
            poll_failures: self.poll_failures.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.cycles.store(0, Ordering::Relaxed);
        self.tasks_leased.store(0, Ordering::Relaxed);
        self.embeddings_computed.store(0, Ordering::Relaxed);
        self.task_failures.store(0, Ordering::Relaxed);
        self.batches_submitted.store(0, Ordering::Relaxed);
        self.poll_failures.store(0, Ordering::Relaxed);
    }
}

/// Snapshot of metrics (for reporting).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerMetricsSnapshot {
    pub cycles: u64,
    pub tasks_leased: u64,
    pub embeddings_computed: u64,
    pub task_failures: u64,
    pub batches_submitted: u64,
    pub poll_failures: u64,
}

impl WorkerMetricsSnapshot {
    /// Share of leased tasks that produced an embedding.
    pub fn compute_success_rate(&self) -> f64 {
        if self.tasks_leased == 0 {
            return 0.0;
        }
        self.embeddings_computed as f64 / self.tasks_leased as f64
    }

    /// Format a human-readable report.
    pub fn format_report(&self) -> String {
        let mut lines = Vec::new();
        lines.push("Worker Metrics Report".to_string());
        lines.push("=".repeat(50));
        lines.push(format!("Poll Cycles:       {}", self.cycles));
        lines.push(format!("  Lost to Errors:  {}", self.poll_failures));
        lines.push(String::new());
        lines.push("Tasks:".to_string());
        lines.push(format!("  Leased:          {}", self.tasks_leased));
        lines.push(format!("  Computed:        {}", self.embeddings_computed));
        lines.push(format!("  Failed:          {}", self.task_failures));
        lines.push(format!(
            "  Success Rate:    {:.1}%",
            self.compute_success_rate() * 100.0
        ));
        lines.push(String::new());
        lines.push(format!("Batches Submitted: {}", self.batches_submitted));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate() {
        let metrics = WorkerMetrics::default();
        metrics.record_tasks_leased(4);
        metrics.record_embedding_computed();
        metrics.record_embedding_computed();
        metrics.record_embedding_computed();
        metrics.record_task_failure();

        let snap = metrics.snapshot();
        assert_eq!(snap.compute_success_rate(), 0.75);
    }

    #[test]
    fn test_idle_success_rate_is_zero() {
        let snap = WorkerMetrics::default().snapshot();
        assert_eq!(snap.compute_success_rate(), 0.0);
    }

    #[test]
    fn test_reset() {
        let metrics = WorkerMetrics::default();
        metrics.record_cycle();
        metrics.record_batch_submitted();
        metrics.reset();
        let snap = metrics.snapshot();
        assert_eq!(snap.cycles, 0);
        assert_eq!(snap.batches_submitted, 0);
    }

    #[test]
    fn test_format_report_mentions_sections() {
        let report = WorkerMetrics::default().snapshot().format_report();
        assert!(report.contains("Poll Cycles:"));
        assert!(report.contains("Batches Submitted:"));
    }
}
