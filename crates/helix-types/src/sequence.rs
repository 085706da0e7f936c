//! Sequence normalization and content fingerprinting.
//!
//! Every tier keys on the fingerprint of the *normalized* sequence, so
//! normalization must be deterministic and idempotent: two equivalent raw
//! inputs (different casing, wrapped lines, FASTA headers) always reduce to
//! the same clean sequence and therefore the same fingerprint.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Line prefix marking a record header (FASTA-style) to be stripped entirely.
const HEADER_MARKER: char = '>';

/// Reduce raw sequence text to residue letters only.
///
/// Drops header lines, whitespace, digits, gap characters and anything else
/// that is not a letter; upper-cases the rest; truncates to `max_residues`.
/// Pure function, no I/O.
pub fn normalize(raw: &str, max_residues: usize) -> String {
    let mut clean = String::with_capacity(raw.len().min(max_residues));
    for line in raw.lines() {
        if line.trim_start().starts_with(HEADER_MARKER) {
            continue;
        }
        for ch in line.chars() {
            let upper = ch.to_ascii_uppercase();
            if upper.is_ascii_uppercase() {
                clean.push(upper);
                if clean.len() == max_residues {
                    return clean;
                }
            }
        }
    }
    clean
}

/// SHA-256 content hash over the normalized sequence bytes.
///
/// An equality oracle across cache/store/queue tiers, never a security
/// credential.
pub fn fingerprint(clean_sequence: &str) -> SequenceFingerprint {
    let digest = Sha256::digest(clean_sequence.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    SequenceFingerprint(bytes)
}

/// 256-bit content hash of a normalized sequence.
///
/// Rendered as 64-character lowercase hex everywhere it crosses a boundary
/// (wire, filesystem paths, logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SequenceFingerprint([u8; 32]);

impl SequenceFingerprint {
    /// Construct from raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// 64-character lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Shard path components (aa, bb) from the leading hex characters.
    ///
    /// Used by filesystem-backed stores to keep directory fan-out bounded.
    pub fn shard_prefix(&self) -> (String, String) {
        let hex = self.to_hex();
        (hex[0..2].to_string(), hex[2..4].to_string())
    }
}

impl fmt::Display for SequenceFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for SequenceFingerprint {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| anyhow!("Invalid fingerprint hex: {}", e))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| anyhow!("Fingerprint must be 32 bytes (64 hex chars)"))?;
        Ok(Self(bytes))
    }
}

impl Serialize for SequenceFingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SequenceFingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 1022;

    #[test]
    fn test_normalize_strips_headers_and_whitespace() {
        let raw = ">sp|P69905|HBA_HUMAN Hemoglobin\nMVLSPADKTN\n vkaaw gkv\n";
        assert_eq!(normalize(raw, MAX), "MVLSPADKTNVKAAWGKV");
    }

    #[test]
    fn test_normalize_discards_non_letters() {
        let raw = "mvl-spa*dk.tn2\n";
        assert_eq!(normalize(raw, MAX), "MVLSPADKTN");
    }

    #[test]
    fn test_normalize_truncates_to_limit() {
        let raw = "A".repeat(2000);
        let clean = normalize(&raw, MAX);
        assert_eq!(clean.len(), MAX);
    }

    #[test]
    fn test_normalize_idempotent() {
        let raw = ">header\nmvlSPadKTN vka\n";
        let once = normalize(raw, MAX);
        let twice = normalize(&once, MAX);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_equivalent_inputs_share_fingerprint() {
        let a = ">rec1 some description\nMVLSPADKTN\nVKAAWGKV";
        let b = "mvlspadktn vkaawgkv";
        let fp_a = fingerprint(&normalize(a, MAX));
        let fp_b = fingerprint(&normalize(b, MAX));
        assert_eq!(fp_a, fp_b);
    }

    #[test]
    fn test_distinct_inputs_differ() {
        let fp_a = fingerprint("MVLSPADKTN");
        let fp_b = fingerprint("MVLSPADKTM");
        assert_ne!(fp_a, fp_b);
    }

    #[test]
    fn test_fingerprint_hex_roundtrip() {
        let fp = fingerprint("MVLSPADKTN");
        let hex = fp.to_hex();
        assert_eq!(hex.len(), 64);
        let parsed: SequenceFingerprint = hex.parse().unwrap();
        assert_eq!(parsed, fp);
    }

    #[test]
    fn test_fingerprint_rejects_bad_hex() {
        assert!("not-hex".parse::<SequenceFingerprint>().is_err());
        assert!("abcd".parse::<SequenceFingerprint>().is_err());
    }

    #[test]
    fn test_shard_prefix() {
        let fp = fingerprint("MVLSPADKTN");
        let (aa, bb) = fp.shard_prefix();
        assert_eq!(aa.len(), 2);
        assert_eq!(bb.len(), 2);
        assert!(fp.to_hex().starts_with(&format!("{}{}", aa, bb)));
    }

    #[test]
    fn test_serde_as_hex_string() {
        let fp = fingerprint("MVLSPADKTN");
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{}\"", fp.to_hex()));
        let back: SequenceFingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
    }
}
