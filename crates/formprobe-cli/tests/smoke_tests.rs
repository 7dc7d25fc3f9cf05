//! Smoke tests for the formprobe CLI
//!
//! These tests verify basic CLI functionality works correctly.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the formprobe binary
fn formprobe() -> Command {
    let mut cmd = Command::cargo_bin("formprobe").expect("formprobe binary should exist");
    cmd.env_remove("FORMPROBE_CONFIG")
        .env_remove("FORMPROBE_TESTS_DIR")
        .env_remove("RUST_LOG");
    cmd
}

/// Workspace with `tests/data/numeprenume.csv`
fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("tests").join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(
        data.join("numeprenume.csv"),
        "# nume scenarios\n\
         nume_valid,Popescu\n\
         nume_valid,compus,Popescu-Ionescu\n\
         nume_invalid,digits,Pop3\n\
         nume_invalid,too long,${A31}\n\
         nume_invalid,space, \n\
         prenume_valid,Ana\n",
    )
    .unwrap();
    dir
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    formprobe()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    formprobe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("scenarios"))
        .stdout(predicate::str::contains("detect"));
}

#[test]
fn test_no_args_shows_help() {
    formprobe().assert().failure();
}

// ============================================================================
// verify
// ============================================================================

#[test]
fn test_verify_resolves_under_tests_dir() {
    let dir = data_dir();
    formprobe()
        .current_dir(dir.path())
        .args(["verify", "data/numeprenume.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--- data/numeprenume.csv ---"))
        .stdout(predicate::str::contains("\"Popescu-Ionescu\""))
        .stdout(predicate::str::contains("${A31}"));
}

#[test]
fn test_verify_truncates_fields() {
    let dir = data_dir();
    formprobe()
        .current_dir(dir.path())
        .args(["verify", "tests/data/numeprenume.csv", "--width", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Pope...\""));
}

#[test]
fn test_verify_missing_file_fails() {
    let dir = data_dir();
    formprobe()
        .current_dir(dir.path())
        .args(["verify", "data/numeprenume.csv", "data/absent.csv"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("numeprenume"))
        .stderr(predicate::str::contains("file not found: 'data/absent.csv'"))
        .stderr(predicate::str::contains("1 of 2 files"));
}

// ============================================================================
// scenarios
// ============================================================================

#[test]
fn test_scenarios_text() {
    let dir = data_dir();
    formprobe()
        .current_dir(dir.path())
        .args(["scenarios", "data/numeprenume.csv", "--prefix", "nume"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nume: 2 valid, 3 invalid"))
        .stdout(predicate::str::contains("nume invalid: too long"))
        .stdout(predicate::str::contains("[31 chars]"))
        .stdout(predicate::str::contains("Ana").not());
}

#[test]
fn test_scenarios_json() {
    let dir = data_dir();
    let output = formprobe()
        .current_dir(dir.path())
        .args(["scenarios", "data/numeprenume.csv", "-p", "prenume", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let cases: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(cases.as_array().unwrap().len(), 1);
    assert_eq!(cases[0]["title"], "prenume valid: \"Ana\"");
}

// ============================================================================
// detect
// ============================================================================

#[test]
fn test_detect_snapshot_file() {
    let dir = TempDir::new().unwrap();
    let page = dir.path().join("page.json");
    fs::write(
        &page,
        r#"{
  "nume": { "attributes": { "aria-invalid": "true" } },
  "telefon": { "computed_style": { "box-shadow": "rgb(220, 53, 69) 0px 0px 0px 1px" } },
  "email": { "class_chain": ["input", "row"] }
}"#,
    )
    .unwrap();
    formprobe()
        .arg("detect")
        .arg(&page)
        .assert()
        .success()
        .stdout(predicate::str::contains("nume: INVALID (explicit_marker"))
        .stdout(predicate::str::contains("telefon: INVALID (style_colors: 220, 53, 69)"))
        .stdout(predicate::str::contains("email: no signal"));
}

#[test]
fn test_detect_with_config_vocabulary() {
    let dir = TempDir::new().unwrap();
    let page = dir.path().join("page.json");
    fs::write(&page, r#"{ "nume": { "class_chain": ["wpcf7-not-valid"] } }"#).unwrap();
    let config = dir.path().join("probe.yaml");
    fs::write(&config, "vocabulary:\n  class_markers: [not-valid]\n").unwrap();

    formprobe()
        .arg("detect")
        .arg(&page)
        .assert()
        .success()
        .stdout(predicate::str::contains("nume: no signal"));

    formprobe()
        .arg("--config")
        .arg(&config)
        .arg("detect")
        .arg(&page)
        .args(["--field", "nume", "--field", "cnp"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nume: INVALID (class_markers: not-valid)"))
        .stdout(predicate::str::contains("cnp: not found"));
}

#[test]
fn test_detect_bad_json_fails() {
    let dir = TempDir::new().unwrap();
    let page = dir.path().join("page.json");
    fs::write(&page, "{ not json").unwrap();
    formprobe()
        .arg("detect")
        .arg(&page)
        .assert()
        .failure()
        .stderr(predicate::str::contains("JSON error"));
}

// ============================================================================
// config / run
// ============================================================================

#[test]
fn test_config_shows_defaults() {
    formprobe()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("aria-invalid"))
        .stdout(predicate::str::contains("blur_settle_ms: 100"));
}

#[test]
fn test_config_missing_file_fails() {
    formprobe()
        .args(["--config", "/nonexistent/probe.yaml", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_run_fails_without_data() {
    let dir = TempDir::new().unwrap();
    formprobe()
        .current_dir(dir.path())
        .args(["run", "https://example.com/", "--field", "nume", "--data", "absent.csv"])
        .assert()
        .failure();
}
