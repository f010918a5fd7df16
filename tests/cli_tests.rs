//! CLI tests for the Tabata timer binary.
//!
//! These drive the compiled binary with assert_cmd:
//! - `total` with flags and presets
//! - `presets list|save|remove` against a temporary presets file
//! - Argument validation and exit codes
//! - A stopped foreground session

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// ============================================================================
// Test Helpers
// ============================================================================

fn tabata() -> Command {
    let mut cmd = Command::cargo_bin("tabata").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn presets_file(dir: &TempDir) -> String {
    dir.path().join("presets.json").display().to_string()
}

// ============================================================================
// total
// ============================================================================

#[test]
fn test_total_defaults() {
    tabata()
        .arg("total")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 4:10"));
}

#[test]
fn test_total_with_flags() {
    tabata()
        .args(["total", "--work", "30", "--rest", "30", "--rounds", "10", "--prepare", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 10:00"));
}

#[test]
fn test_total_from_preset() {
    let dir = tempfile::tempdir().unwrap();
    tabata()
        .args(["total", "--preset", "Quick Burn", "--presets-file"])
        .arg(presets_file(&dir))
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 5:10"));
}

#[test]
fn test_total_unknown_preset_fails() {
    let dir = tempfile::tempdir().unwrap();
    tabata()
        .args(["total", "--preset", "Missing", "--presets-file"])
        .arg(presets_file(&dir))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: No preset named 'Missing'"));
}

// ============================================================================
// presets
// ============================================================================

#[test]
fn test_presets_list_writes_defaults() {
    let dir = tempfile::tempdir().unwrap();
    tabata()
        .args(["presets", "list", "--presets-file"])
        .arg(presets_file(&dir))
        .assert()
        .success()
        .stdout(predicate::str::contains("Classic Tabata"))
        .stdout(predicate::str::contains("HIIT 30/30"))
        .stdout(predicate::str::contains("Quick Burn"));

    assert!(dir.path().join("presets.json").exists());
}

#[test]
fn test_presets_save_then_list_and_remove() {
    let dir = tempfile::tempdir().unwrap();
    let file = presets_file(&dir);

    tabata()
        .args(["presets", "save", "Legs", "-w", "45", "-r", "15", "-n", "6"])
        .args(["--presets-file", &file])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved preset 'Legs'"));

    tabata()
        .args(["presets", "list", "--presets-file", &file])
        .assert()
        .success()
        .stdout(predicate::str::contains("Legs"))
        .stdout(predicate::str::contains("45s/15s x 6"));

    tabata()
        .args(["presets", "remove", "Legs", "--presets-file", &file])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed preset 'Legs'"));

    tabata()
        .args(["presets", "list", "--presets-file", &file])
        .assert()
        .success()
        .stdout(predicate::str::contains("Legs").not());
}

#[test]
fn test_presets_remove_unknown_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    tabata()
        .args(["presets", "remove", "Nope", "--presets-file"])
        .arg(presets_file(&dir))
        .assert()
        .success()
        .stdout(predicate::str::contains("No preset named 'Nope'"));
}

// ============================================================================
// Argument validation
// ============================================================================

#[test]
fn test_out_of_range_flags_are_rejected() {
    tabata().args(["total", "--work", "4"]).assert().failure();
    tabata().args(["total", "--rest", "301"]).assert().failure();
    tabata().args(["total", "--rounds", "0"]).assert().failure();
    tabata().args(["total", "--prepare", "61"]).assert().failure();
}

#[test]
fn test_help_without_command() {
    tabata()
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_completions() {
    tabata()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tabata"));
}

// ============================================================================
// start
// ============================================================================

#[test]
fn test_start_stopped_from_stdin() {
    tabata()
        .args(["start", "--no-sound", "-w", "5", "-r", "5", "-n", "1", "-p", "0"])
        .write_stdin("s\n")
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("Starting: 10 total"))
        .stdout(predicate::str::contains("Session stopped"));
}
