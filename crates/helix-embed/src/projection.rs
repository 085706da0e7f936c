//! Deterministic hash-projection embedder.
//!
//! Expands a SHA-256 seed of (model id, sequence) into a unit-norm vector of
//! the profile's dimensionality. Useful as the local fallback path and as a
//! stand-in worker backend: it honors the full embedder contract (fixed
//! dimensionality per model, determinism, confidence scalar) without any
//! model weights.

use anyhow::{anyhow, Result};
use helix_types::ModelProfile;
use sha2::{Digest, Sha256};

use crate::vector::l2_normalize;
use crate::{Embedder, Embedding};

/// Seeded projection embedder. Stateless and cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct ProjectionEmbedder;

impl ProjectionEmbedder {
    pub fn new() -> Self {
        Self
    }

    fn seed(clean_sequence: &str, model_id: &str) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(model_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(clean_sequence.as_bytes());
        let digest = hasher.finalize();
        let mut seed_bytes = [0u8; 8];
        seed_bytes.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(seed_bytes)
    }
}

impl Embedder for ProjectionEmbedder {
    fn embed(&self, clean_sequence: &str, profile: &ModelProfile) -> Result<Embedding> {
        if clean_sequence.is_empty() {
            return Err(anyhow!(
                "Cannot embed empty sequence (model {})",
                profile.id
            ));
        }
        if profile.dimensions == 0 {
            return Err(anyhow!("Model {} has zero dimensionality", profile.id));
        }

        let mut state = Self::seed(clean_sequence, &profile.id);
        let mut vector = Vec::with_capacity(profile.dimensions);
        for _ in 0..profile.dimensions {
            let raw = splitmix64(&mut state);
            // Map to [-1, 1)
            let unit = (raw as f64 / u64::MAX as f64) * 2.0 - 1.0;
            vector.push(unit as f32);
        }
        l2_normalize(&mut vector);

        Ok(Embedding {
            vector,
            confidence: 1.0,
        })
    }
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_profile() -> ModelProfile {
        ModelProfile::new("tiny_test_model", 16, "tiny")
    }

    #[test]
    fn test_deterministic_for_same_input() {
        let embedder = ProjectionEmbedder::new();
        let profile = tiny_profile();
        let a = embedder.embed("MVLSPADKTN", &profile).unwrap();
        let b = embedder.embed("MVLSPADKTN", &profile).unwrap();
        assert_eq!(a.vector, b.vector);
        assert_eq!(a.confidence, 1.0);
    }

    #[test]
    fn test_dimensionality_follows_profile() {
        let embedder = ProjectionEmbedder::new();
        let small = ModelProfile::new("a", 8, "a");
        let large = ModelProfile::new("b", 64, "b");
        assert_eq!(embedder.embed("MVLS", &small).unwrap().vector.len(), 8);
        assert_eq!(embedder.embed("MVLS", &large).unwrap().vector.len(), 64);
    }

    #[test]
    fn test_distinct_models_project_differently() {
        let embedder = ProjectionEmbedder::new();
        let a = ModelProfile::new("model_a", 16, "a");
        let b = ModelProfile::new("model_b", 16, "b");
        let va = embedder.embed("MVLSPADKTN", &a).unwrap().vector;
        let vb = embedder.embed("MVLSPADKTN", &b).unwrap().vector;
        assert_ne!(va, vb);
    }

    #[test]
    fn test_output_is_unit_norm() {
        let embedder = ProjectionEmbedder::new();
        let emb = embedder.embed("MVLSPADKTN", &tiny_profile()).unwrap();
        let norm: f32 = emb.vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_sequence_rejected() {
        let embedder = ProjectionEmbedder::new();
        assert!(embedder.embed("", &tiny_profile()).is_err());
    }
}
