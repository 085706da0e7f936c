//! Model identity registry.
//!
//! A model identity is an opaque string; everything derived from it
//! (vector dimensionality, durable-store partition) comes from the catalog,
//! never from inspecting vector payloads.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Small profile, local-capable; the designated fallback identity.
pub const ESM2_SMALL: &str = "esm2_t6_8M_UR50D";

/// Large profile served by the remote worker pool.
pub const ESM2_LARGE: &str = "esm2_t33_650M_UR50D";

/// Computation profile selected by a model identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelProfile {
    /// Opaque model identity string.
    pub id: String,
    /// Fixed output vector dimensionality.
    pub dimensions: usize,
    /// Durable-store partition name for this model's vectors.
    pub partition: String,
}

impl ModelProfile {
    pub fn new(id: impl Into<String>, dimensions: usize, partition: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            dimensions,
            partition: partition.into(),
        }
    }
}

/// Registry of known computation profiles.
///
/// Unknown identities are rejected rather than guessed at; a vector's
/// dimensionality is a property of the profile, not of any payload.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    profiles: Vec<ModelProfile>,
    fallback_id: String,
}

impl ModelCatalog {
    /// Catalog with the two standard profiles, small one as fallback.
    pub fn standard() -> Self {
        Self {
            profiles: vec![
                ModelProfile::new(ESM2_SMALL, 320, "esm2_8m"),
                ModelProfile::new(ESM2_LARGE, 1280, "esm2_650m"),
            ],
            fallback_id: ESM2_SMALL.to_string(),
        }
    }

    /// Empty catalog; callers register profiles explicitly.
    pub fn with_fallback(fallback_id: impl Into<String>) -> Self {
        Self {
            profiles: Vec::new(),
            fallback_id: fallback_id.into(),
        }
    }

    /// Add a profile. Replaces any existing profile with the same id.
    pub fn register(&mut self, profile: ModelProfile) {
        self.profiles.retain(|p| p.id != profile.id);
        self.profiles.push(profile);
    }

    /// Look up a profile by model identity.
    pub fn profile(&self, model_id: &str) -> Result<&ModelProfile> {
        self.profiles
            .iter()
            .find(|p| p.id == model_id)
            .ok_or_else(|| anyhow!("Unknown model identity: {}", model_id))
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.profiles.iter().any(|p| p.id == model_id)
    }

    /// The designated fallback profile used when the remote tier is down.
    pub fn fallback(&self) -> Result<&ModelProfile> {
        self.profile(&self.fallback_id)
    }

    pub fn fallback_id(&self) -> &str {
        &self.fallback_id
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
