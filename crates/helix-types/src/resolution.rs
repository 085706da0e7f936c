//! Resolution outcome types.

use crate::sequence::SequenceFingerprint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal status of one resolution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionStatus {
    Completed,
    Pending,
    Error,
}

/// Which tier produced the answer.
///
/// `NewJob` is reported by the caller that won the dispatch race; racers that
/// found the job already created report `JobQueue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionSource {
    RemoteCache,
    DurableStore,
    JobQueue,
    NewJob,
    LocalFallback,
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResolutionStatus::Completed => "COMPLETED",
            ResolutionStatus::Pending => "PENDING",
            ResolutionStatus::Error => "ERROR",
        };
        f.write_str(s)
    }
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResolutionSource::RemoteCache => "REMOTE_CACHE",
            ResolutionSource::DurableStore => "DURABLE_STORE",
            ResolutionSource::JobQueue => "JOB_QUEUE",
            ResolutionSource::NewJob => "NEW_JOB",
            ResolutionSource::LocalFallback => "LOCAL_FALLBACK",
        };
        f.write_str(s)
    }
}

/// Definitive answer for one (sequence, model) resolution.
///
/// `model_id` is the identity actually used; it differs from the requested
/// one only under fallback substitution, which callers detect by comparing
/// identities (or checking `source == LocalFallback`), never from the status
/// alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub fingerprint: SequenceFingerprint,
    pub status: ResolutionStatus,
    pub source: ResolutionSource,
    /// Model identity actually used.
    pub model_id: String,
    /// Present iff `status == Completed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    /// In `[0, 1]`; zero when no vector is present.
    pub confidence: f32,
}

impl ResolutionResult {
    pub fn completed(
        fingerprint: SequenceFingerprint,
        source: ResolutionSource,
        model_id: impl Into<String>,
        vector: Vec<f32>,
        confidence: f32,
    ) -> Self {
        Self {
            fingerprint,
            status: ResolutionStatus::Completed,
            source,
            model_id: model_id.into(),
            vector: Some(vector),
            confidence,
        }
    }

    pub fn pending(
        fingerprint: SequenceFingerprint,
        source: ResolutionSource,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            fingerprint,
            status: ResolutionStatus::Pending,
            source,
            model_id: model_id.into(),
            vector: None,
            confidence: 0.0,
        }
    }

    pub fn error(fingerprint: SequenceFingerprint, model_id: impl Into<String>) -> Self {
        Self {
            fingerprint,
            status: ResolutionStatus::Error,
            source: ResolutionSource::LocalFallback,
            model_id: model_id.into(),
            vector: None,
            confidence: 0.0,
        }
    }

    /// True when the answer came from a different model than the caller asked for.
    pub fn is_substitution(&self, requested_model_id: &str) -> bool {
        self.model_id != requested_model_id
    }
}
