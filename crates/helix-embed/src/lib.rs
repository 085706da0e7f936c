//! Embedding capability seam.
//!
//! The resolver and workers only ever see the [`Embedder`] trait: cleaned
//! sequence in, fixed-length vector plus confidence out. The shipped
//! [`ProjectionEmbedder`] is deterministic and dependency-free; a real model
//! backend plugs in behind the same trait.

pub mod projection;
pub mod vector;

pub use projection::ProjectionEmbedder;
pub use vector::{cosine_distance, l2_normalize};

use anyhow::Result;
use helix_types::ModelProfile;

/// Maximum residues an embedder accepts; normalization truncates to this.
pub const MAX_SEQUENCE_RESIDUES: usize = 1022;

/// One computed embedding.
#[derive(Debug, Clone)]
pub struct Embedding {
    /// Unit-norm vector of the profile's dimensionality.
    pub vector: Vec<f32>,
    /// Confidence scalar in `[0, 1]`.
    pub confidence: f32,
}

/// Converts a cleaned sequence into a fixed-length vector plus confidence.
///
/// Implementations must be pure with respect to their inputs: the same
/// (sequence, profile) pair always yields the same vector.
pub trait Embedder: Send + Sync {
    fn embed(&self, clean_sequence: &str, profile: &ModelProfile) -> Result<Embedding>;
}
