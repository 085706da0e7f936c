//! Biological metadata attached to stored embeddings.

use serde::{Deserialize, Serialize};

/// Annotated residue range (binding site, active site, etc).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidueAnnotation {
    /// 1-based start residue position.
    pub start: u32,
    /// 1-based end residue position (inclusive; equals `start` for single residues).
    pub end: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Descriptive record fields carried alongside a vector.
///
/// Everything here is optional enrichment from upstream curation; the
/// resolution protocol itself only needs the composite key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SequenceMetadata {
    /// Normalized sequence text as embedded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_text: Option<String>,
    /// UniProt primary accession, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_accession: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organism: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_text: Option<String>,
    /// Annotated residue ranges (binding sites and similar).
    #[serde(default)]
    pub binding_sites: Vec<ResidueAnnotation>,
    /// Experimental structure cross-references.
    #[serde(default)]
    pub pdb_ids: Vec<String>,
}

impl SequenceMetadata {
    /// Minimal metadata carrying only the embedded sequence text.
    pub fn from_sequence(sequence_text: impl Into<String>) -> Self {
        Self {
            sequence_text: Some(sequence_text.into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let meta = SequenceMetadata::default();
        assert!(meta.primary_accession.is_none());
        assert!(meta.binding_sites.is_empty());
        assert!(meta.pdb_ids.is_empty());
    }

    #[test]
    fn test_absent_fields_skipped_in_json() {
        let meta = SequenceMetadata::from_sequence("MVLSPADKTN");
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("sequence_text"));
        assert!(!json.contains("organism"));
    }

    #[test]
    fn test_roundtrip_with_annotations() {
        let meta = SequenceMetadata {
            sequence_text: Some("MVLSPADKTN".to_string()),
            primary_accession: Some("P69905".to_string()),
            protein_name: Some("Hemoglobin subunit alpha".to_string()),
            organism: Some("Homo sapiens".to_string()),
            function_text: None,
            binding_sites: vec![ResidueAnnotation {
                start: 58,
                end: 62,
                description: Some("heme binding".to_string()),
            }],
            pdb_ids: vec!["1HHO".to_string()],
        };
        let json = serde_json::to_string(&meta).unwrap();
        let back: SequenceMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back.binding_sites, meta.binding_sites);
        assert_eq!(back.pdb_ids, meta.pdb_ids);
    }
}
