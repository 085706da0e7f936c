//! Shared types for the helix-gateway workspace.
//!
//! This crate provides foundational types used across multiple crates in the
//! workspace, breaking circular dependency chains.
//!
//! ## Core Types
//!
//! - [`SequenceFingerprint`](sequence::SequenceFingerprint) - Content hash of a normalized sequence
//! - [`ModelCatalog`](model::ModelCatalog) - Model identity to dimensionality/partition mapping
//! - [`ResolutionResult`](resolution::ResolutionResult) - Outcome of a tiered resolution
//! - [`JobRecord`](job::JobRecord) - Dispatch bookkeeping for pending computations

pub mod env_utils;
pub mod job;
pub mod metadata;
pub mod model;
pub mod resolution;
pub mod sequence;

// Re-export commonly used types at crate root
pub use job::{JobRecord, JobStatus};
pub use metadata::{ResidueAnnotation, SequenceMetadata};
pub use model::{ModelCatalog, ModelProfile, ESM2_LARGE, ESM2_SMALL};
pub use resolution::{ResolutionResult, ResolutionSource, ResolutionStatus};
pub use sequence::{fingerprint, normalize, SequenceFingerprint};
