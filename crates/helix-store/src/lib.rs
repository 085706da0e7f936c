//! Durable store adapters for embeddings, jobs, and biological metadata.
//!
//! This crate provides:
//! - `MetadataStore`: the store contract the resolution core consumes
//! - `FsMetadataStore`: sharded filesystem adapter with atomic writes and
//!   conflict-safe job creation
//! - `MemoryMetadataStore`: in-process adapter backing tests

pub mod fs;
pub mod memory;
pub mod metrics;
pub mod paths;
pub mod records;

pub use fs::FsMetadataStore;
pub use memory::MemoryMetadataStore;
pub use metrics::{StoreMetrics, StoreMetricsSnapshot};
pub use records::{EmbeddingRecord, MetadataStore, SimilarMatch, StoredEmbedding};
