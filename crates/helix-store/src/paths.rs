//! Path utilities for the sharded durable-store layout.
//!
//! Layout under the store root:
//!
//! ```text
//! records/<model_id>/<aa>/<bb>/<fingerprint>.json   metadata records
//! vectors/<partition>/<aa>/<bb>/<fingerprint>.bin   bincode f32 vectors
//! jobs/<model_id>/<aa>/<bb>/<fingerprint>.json      job rows
//! ```
//!
//! `aa`/`bb` are the leading fingerprint hex bytes, keeping directory
//! fan-out bounded at 256 entries per level.

use anyhow::{anyhow, Result};
use helix_types::SequenceFingerprint;
use std::path::{Path, PathBuf};

fn sharded_path(
    store_root: &Path,
    namespace: &str,
    bucket: &str,
    fingerprint: &SequenceFingerprint,
    extension: &str,
) -> PathBuf {
    let (aa, bb) = fingerprint.shard_prefix();
    store_root
        .join(namespace)
        .join(bucket)
        .join(&aa)
        .join(&bb)
        .join(format!("{}.{}", fingerprint.to_hex(), extension))
}

/// Full path of a metadata record file.
pub fn record_path(store_root: &Path, model_id: &str, fingerprint: &SequenceFingerprint) -> PathBuf {
    sharded_path(store_root, "records", model_id, fingerprint, "json")
}

/// Full path of a vector file inside a model's partition.
pub fn vector_path(store_root: &Path, partition: &str, fingerprint: &SequenceFingerprint) -> PathBuf {
    sharded_path(store_root, "vectors", partition, fingerprint, "bin")
}

/// Full path of a job row file.
pub fn job_path(store_root: &Path, model_id: &str, fingerprint: &SequenceFingerprint) -> PathBuf {
    sharded_path(store_root, "jobs", model_id, fingerprint, "json")
}

/// Root directory of a model's vector partition.
pub fn partition_root(store_root: &Path, partition: &str) -> PathBuf {
    store_root.join("vectors").join(partition)
}

/// Ensure all parent directories exist for a path.
pub fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| anyhow!("Failed to create directory {}: {}", parent.display(), e))?;
    }
    Ok(())
}

/// Write a file atomically (write to .tmp, then rename).
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    ensure_parent_dirs(path)?;
    let tmp_path = path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|s| s.to_str()).unwrap_or("tmp")
    ));
    std::fs::write(&tmp_path, contents)
        .map_err(|e| anyhow!("Failed to write temp file {}: {}", tmp_path.display(), e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        anyhow!(
            "Failed to rename {} to {}: {}",
            tmp_path.display(),
            path.display(),
            e
        )
    })?;
    Ok(())
}

/// Write a JSON file atomically (compact format, no pretty printing).
pub fn atomic_write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec(value).map_err(|e| anyhow!("Failed to serialize JSON: {}", e))?;
    atomic_write(path, &json)
}

/// Create a file with its full contents, failing if the path already exists.
///
/// The contents are staged in a caller-unique temp file and hard-linked into
/// place, so a concurrent reader never observes a partially written file and
/// exactly one of N racing creators wins.
pub fn create_new_with_contents(path: &Path, contents: &[u8]) -> Result<bool> {
    use std::sync::atomic::{AtomicU64, Ordering};
    static STAGE_COUNTER: AtomicU64 = AtomicU64::new(0);

    ensure_parent_dirs(path)?;
    let tmp_path = path.with_extension(format!(
        "{}.new.{}.{}",
        path.extension().and_then(|s| s.to_str()).unwrap_or("new"),
        std::process::id(),
        STAGE_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::write(&tmp_path, contents)
        .map_err(|e| anyhow!("Failed to write temp file {}: {}", tmp_path.display(), e))?;
    let outcome = match std::fs::hard_link(&tmp_path, path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(anyhow!(
            "Failed to link {} to {}: {}",
            tmp_path.display(),
            path.display(),
            e
        )),
    };
    let _ = std::fs::remove_file(&tmp_path);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use helix_types::fingerprint;
    use tempfile::TempDir;

    #[test]
    fn test_record_path_is_sharded() {
        let fp = fingerprint("MVLSPADKTN");
        let path = record_path(Path::new("/data"), "esm2_t6_8M_UR50D", &fp);
        let rendered = path.to_string_lossy().into_owned();
        let (aa, bb) = fp.shard_prefix();
        assert!(rendered.contains(&format!("records/esm2_t6_8M_UR50D/{}/{}/", aa, bb)));
        assert!(rendered.ends_with(&format!("{}.json", fp.to_hex())));
    }

    #[test]
    fn test_vector_path_uses_partition() {
        let fp = fingerprint("MVLSPADKTN");
        let path = vector_path(Path::new("/data"), "esm2_8m", &fp);
        assert!(path.to_string_lossy().contains("vectors/esm2_8m/"));
        assert!(path.to_string_lossy().ends_with(".bin"));
    }

    #[test]
    fn test_atomic_write_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a/b/c.json");
        atomic_write(&path, b"{}").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"{}");
    }

    #[test]
    fn test_create_new_reports_existing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("jobs/x.json");
        assert!(create_new_with_contents(&path, b"first").unwrap());
        assert!(!create_new_with_contents(&path, b"second").unwrap());
        // First writer's contents survive
        assert_eq!(std::fs::read(&path).unwrap(), b"first");
    }
}
