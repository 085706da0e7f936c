//! Structure-viewer manifest assembly.
//!
//! Joins a stored record's cross-references into the payload a 3D
//! structure viewer consumes: one resolvable structure file URL plus the
//! residue ranges to highlight.

use helix_store::EmbeddingRecord;
use helix_types::ResidueAnnotation;
use serde::{Deserialize, Serialize};

/// Experimental structure files (RCSB PDB).
const PDB_BASE_URL: &str = "https://files.rcsb.org/view";

/// Predicted structure files (AlphaFold DB), keyed by UniProt accession.
const ALPHAFOLD_BASE_URL: &str = "https://alphafold.ebi.ac.uk/files";

/// Provenance of the structure file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructureSource {
    #[serde(rename = "RCSB_PDB")]
    RcsbPdb,
    #[serde(rename = "ALPHAFOLD_DB")]
    AlphafoldDb,
}

/// One resolvable structure file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureRef {
    pub id: String,
    pub source: StructureSource,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestAnnotations {
    pub residue_highlights: Vec<ResidueAnnotation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organism: Option<String>,
}

/// Viewer payload for one stored record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureManifest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accession: Option<String>,
    /// Absent when the record has neither a PDB id nor an accession.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<StructureRef>,
    pub annotations: ManifestAnnotations,
    pub metadata: ManifestMetadata,
}

impl StructureManifest {
    /// Build the manifest for a stored record.
    ///
    /// An experimental PDB entry wins over the AlphaFold prediction; the
    /// prediction needs a primary accession to form its URL.
    pub fn for_record(record: &EmbeddingRecord) -> Self {
        let meta = &record.metadata;
        let structure = if let Some(pdb_id) = meta.pdb_ids.first() {
            Some(StructureRef {
                id: pdb_id.clone(),
                source: StructureSource::RcsbPdb,
                url: format!("{}/{}.pdb", PDB_BASE_URL, pdb_id),
            })
        } else {
            meta.primary_accession.as_deref().map(|accession| StructureRef {
                id: accession.to_string(),
                source: StructureSource::AlphafoldDb,
                url: format!("{}/AF-{}-F1-model_v4.pdb", ALPHAFOLD_BASE_URL, accession),
            })
        };

        Self {
            accession: meta.primary_accession.clone(),
            structure,
            annotations: ManifestAnnotations {
                residue_highlights: meta.binding_sites.clone(),
            },
            metadata: ManifestMetadata {
                name: meta.protein_name.clone(),
                organism: meta.organism.clone(),
            },
        }
    }
}
