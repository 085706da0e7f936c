//! Job registry types.
//!
//! A job row exists at most once per (fingerprint, model identity) pair; it
//! is the dedup anchor for task dispatch and is never deleted by this core.

use crate::sequence::SequenceFingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Completed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => f.write_str("PENDING"),
            JobStatus::Completed => f.write_str("COMPLETED"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub fingerprint: SequenceFingerprint,
    pub model_id: String,
    pub status: JobStatus,
    /// Label of the process that created the job (worker pool routing hint).
    pub node_label: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Fresh pending job stamped with the current time.
    pub fn pending(
        fingerprint: SequenceFingerprint,
        model_id: impl Into<String>,
        node_label: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            fingerprint,
            model_id: model_id.into(),
            status: JobStatus::Pending,
            node_label: node_label.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn complete(&mut self) {
        self.status = JobStatus::Completed;
        self.updated_at = Utc::now();
    }
}
