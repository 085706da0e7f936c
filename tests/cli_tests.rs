//! End-to-end tests for the `helix-resolve` and `helix-worker` binaries.
//!
//! These run without any remote tier: no health endpoint is passed, so the
//! resolver treats the remote side as unavailable and answers locally.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const SEQ: &str = "MVLSPADKTNVKAAWGKVGAHAGEYGAEALERMFLSF";

/// Count regular files under `dir`, one shard level deep.
fn count_files(dir: &Path) -> usize {
    let mut count = 0;
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                count += count_files(&path);
            } else {
                count += 1;
            }
        }
    }
    count
}

#[test]
fn test_resolve_offline_answers_local_fallback() {
    let store = TempDir::new().unwrap();

    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("helix-resolve").unwrap();
    let assert = cmd
        .arg(SEQ)
        .arg("--store-root")
        .arg(store.path())
        .arg("--json")
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(json["status"], "COMPLETED");
    assert_eq!(json["source"], "LOCAL_FALLBACK");
    // Requested the large profile by default; the answer substitutes the
    // local-capable one.
    assert_eq!(json["model_id"], "esm2_t6_8M_UR50D");
    assert_eq!(json["vector"].as_array().unwrap().len(), 320);
    assert!(json["confidence"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_resolve_human_output_reports_substitution() {
    let store = TempDir::new().unwrap();

    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("helix-resolve").unwrap();
    cmd.arg(SEQ)
        .arg("--store-root")
        .arg(store.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("LOCAL_FALLBACK"))
        .stdout(predicate::str::contains("Substituted: yes"));
}

#[test]
fn test_resolve_persists_fallback_record() {
    let store = TempDir::new().unwrap();

    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("helix-resolve").unwrap();
    cmd.arg(SEQ)
        .arg("--store-root")
        .arg(store.path())
        .assert()
        .success();

    // The fallback answer is written through to the durable store: one record
    // under the fallback model, one vector under its partition.
    let records = store.path().join("records").join("esm2_t6_8M_UR50D");
    let vectors = store.path().join("vectors").join("esm2_8m");
    assert_eq!(count_files(&records), 1);
    assert_eq!(count_files(&vectors), 1);
}

#[test]
fn test_resolve_reads_fasta_file() {
    let store = TempDir::new().unwrap();
    let fasta = store.path().join("hba.fasta");
    std::fs::write(&fasta, format!(">sp|P69905|HBA_HUMAN\n{}\n", SEQ)).unwrap();

    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("helix-resolve").unwrap();
    let assert = cmd
        .arg("--file")
        .arg(&fasta)
        .arg("--store-root")
        .arg(store.path())
        .arg("--json")
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["status"], "COMPLETED");

    // Header stripping means the file resolves to the same fingerprint as the
    // bare sequence.
    #[allow(deprecated)]
    let mut bare = Command::cargo_bin("helix-resolve").unwrap();
    let bare_assert = bare
        .arg(SEQ)
        .arg("--store-root")
        .arg(store.path())
        .arg("--json")
        .assert()
        .success();
    let bare_stdout = String::from_utf8(bare_assert.get_output().stdout.clone()).unwrap();
    let bare_json: serde_json::Value = serde_json::from_str(&bare_stdout).unwrap();
    assert_eq!(json["fingerprint"], bare_json["fingerprint"]);
}

#[test]
fn test_resolve_unknown_model_fails_with_error_status() {
    let store = TempDir::new().unwrap();

    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("helix-resolve").unwrap();
    cmd.arg(SEQ)
        .arg("--store-root")
        .arg(store.path())
        .arg("--model")
        .arg("esm1b_t33_650M_UR50S")
        .assert()
        .failure()
        .stdout(predicate::str::contains("ERROR"))
        .stderr(predicate::str::contains("resolution failed"));
}

#[test]
fn test_resolve_requires_a_sequence() {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("helix-resolve").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("pass a sequence argument or --file"));
}

#[test]
fn test_worker_help_lists_flags() {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("helix-worker").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--cache-endpoint"))
        .stdout(predicate::str::contains("--max-batch-size"));
}

#[test]
fn test_worker_fails_fast_without_gateway() {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("helix-worker").unwrap();
    cmd.arg("--cache-endpoint")
        .arg("http://127.0.0.1:9")
        .arg("--health-listen")
        .arg("127.0.0.1:0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("connect to gateway"));
}
