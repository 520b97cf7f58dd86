//! End-to-end workflow tests for metasupply-cli.
//!
//! These tests verify complete user workflows involving multiple commands
//! sharing one local registry file.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

/// Command bound to a local store, acting as `principal`.
fn metasupply(store: &Path, principal: &str) -> Command {
    let mut cmd = Command::cargo_bin("metasupply").unwrap();
    for var in [
        "METASUPPLY_REGISTRY_URL",
        "METASUPPLY_PRINCIPAL",
        "METASUPPLY_FORK_POLICY",
        "METASUPPLY_LOCAL_STORE",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.args(["--local", store.to_str().unwrap(), "--principal", principal]);
    cmd
}

/// Run a command with `--json` and parse its stdout.
fn json(cmd: &mut Command) -> Value {
    let output = cmd.arg("--json").output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn upload(store: &Path, principal: &str, filename: &str, model: &str) -> String {
    let value = json(metasupply(store, principal).args([
        "upload",
        "--filename",
        filename,
        "--model",
        model,
        "--dataset",
        "COCO",
        "--prompt",
        "describe the scene",
    ]));
    value["id"].as_str().unwrap().to_string()
}

fn update(store: &Path, principal: &str, id: &str, model: &str) -> String {
    let value = json(metasupply(store, principal).args(["update", id, "--model", model]));
    assert_eq!(value["previous_hash"], id);
    value["id"].as_str().unwrap().to_string()
}

// ============================================================================
// Complete Workflow Tests: Upload → Update → List
// ============================================================================

#[test]
fn test_e2e_upload_update_list() {
    let temp = TempDir::new().unwrap();
    let store = temp.path().join("registry.json");

    // Step 1: upload the root version
    let a = upload(&store, "alice", "x.txt", "GPT-4");

    // Step 2: revise it
    let b = update(&store, "alice", &a, "GPT-4o");
    assert_ne!(a, b);

    // Step 3: one history, newest first
    let histories = json(metasupply(&store, "alice").arg("list"));
    let histories = histories.as_array().unwrap();
    assert_eq!(histories.len(), 1);
    let versions = histories[0]["versions"].as_array().unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0]["id"], b.as_str());
    assert_eq!(versions[0]["model"], "GPT-4o");
    assert_eq!(versions[0]["prompt"], "describe the scene");
    assert_eq!(versions[0]["previous_hash"], a.as_str());
    assert_eq!(versions[1]["id"], a.as_str());
    assert!(versions[1]["previous_hash"].is_null());

    // Step 4: text listing shows both
    metasupply(&store, "alice")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("x.txt (2 versions)"))
        .stdout(predicate::str::contains(&a[..10]))
        .stdout(predicate::str::contains(&b[..10]));
}

#[test]
fn test_e2e_verified_listing() {
    let temp = TempDir::new().unwrap();
    let store = temp.path().join("registry.json");

    let a = upload(&store, "alice", "x.txt", "m1");
    let b = update(&store, "alice", &a, "m2");
    update(&store, "alice", &b, "m3");

    let histories = json(metasupply(&store, "alice").args(["list", "--verified"]));
    assert_eq!(histories[0]["status"]["status"], "intact");
    assert_eq!(histories[0]["versions"].as_array().unwrap().len(), 3);

    metasupply(&store, "alice")
        .args(["list", "--verified"])
        .assert()
        .success()
        .stdout(predicate::str::contains("intact"));
}

#[test]
fn test_e2e_fork_policy() {
    let temp = TempDir::new().unwrap();
    let store = temp.path().join("registry.json");

    let a = upload(&store, "alice", "x.txt", "GPT-4");
    update(&store, "alice", &a, "first");

    // Forking is refused when asked to
    metasupply(&store, "alice")
        .args(["--fork-policy", "reject-superseded", "update", &a, "--model", "second"])
        .assert()
        .code(65)
        .stderr(predicate::str::contains("superseded"));

    // and allowed by default
    update(&store, "alice", &a, "second");
    let histories = json(metasupply(&store, "alice").args(["list", "--verified"]));
    assert_eq!(histories.as_array().unwrap().len(), 2);
}

// ============================================================================
// Search and Lookup Workflows
// ============================================================================

#[test]
fn test_e2e_search_by_field() {
    let temp = TempDir::new().unwrap();
    let store = temp.path().join("registry.json");

    upload(&store, "alice", "cat.png", "GPT-4");
    upload(&store, "alice", "dog.png", "Stable Diffusion");

    let found = json(metasupply(&store, "alice").args(["search", "gpt", "--by", "model"]));
    let found = found.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["filename"], "cat.png");

    let found = json(metasupply(&store, "alice").args(["search", "PNG"]));
    assert_eq!(found.as_array().unwrap().len(), 2);

    let found = json(metasupply(&store, "alice").args(["search", "", "--by", "dataset"]));
    assert_eq!(found.as_array().unwrap().len(), 2);
}

#[test]
fn test_e2e_records_are_per_principal() {
    let temp = TempDir::new().unwrap();
    let store = temp.path().join("registry.json");

    let id = upload(&store, "alice", "x.txt", "GPT-4");

    // Bob does not see Alice's files in his listing
    let histories = json(metasupply(&store, "bob").arg("list"));
    assert!(histories.as_array().unwrap().is_empty());

    // but can look the record up by id
    let record = json(metasupply(&store, "bob").args(["show", &id]));
    assert_eq!(record["creator"], "alice");
    assert_eq!(record["filename"], "x.txt");
}

#[test]
fn test_e2e_payload_is_record_json() {
    let temp = TempDir::new().unwrap();
    let store = temp.path().join("registry.json");

    let id = upload(&store, "alice", "x.txt", "GPT-4");

    let output = metasupply(&store, "alice")
        .args(["payload", &id])
        .output()
        .unwrap();
    assert!(output.status.success());

    let payload: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload["id"], id.as_str());
    assert_eq!(payload["model"], "GPT-4");
    assert!(payload["timestamp"].is_u64());
}

#[test]
fn test_e2e_show_text_output() {
    let temp = TempDir::new().unwrap();
    let store = temp.path().join("registry.json");

    let id = upload(&store, "alice", "x.txt", "GPT-4");

    metasupply(&store, "alice")
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains(id.as_str()))
        .stdout(predicate::str::contains("N/A"))
        .stdout(predicate::str::contains("UTC"));
}
