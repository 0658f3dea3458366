//! End-to-end smoke tests: run the built `mg` binary against the emulated
//! engine.

use std::path::PathBuf;
use std::process::Command;

/// Helper to get the mg binary path
fn mg_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    path.pop(); // Remove deps
    path.push("mg");
    path
}

fn run_mg(args: &[&str]) -> (bool, String, String) {
    let output = Command::new(mg_binary())
        .args(args)
        .output()
        .expect("failed to execute mg");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    (output.status.success(), stdout, stderr)
}

#[test]
fn status_against_emulated_engine() {
    let (ok, stdout, stderr) = run_mg(&["--emulated", "status"]);
    assert!(ok, "status failed: {stderr}");
    assert!(stdout.contains("left"), "missing left glove line: {stdout}");
    assert!(stdout.contains("right"), "missing right glove line: {stdout}");
    assert!(stdout.contains("connected"), "missing status: {stdout}");
}

#[test]
fn hand_prints_every_finger() {
    let (ok, stdout, stderr) = run_mg(&["--emulated", "hand", "right"]);
    assert!(ok, "hand failed: {stderr}");
    for finger in ["thumb", "index", "middle", "ring", "pinky"] {
        assert!(stdout.contains(finger), "missing {finger}: {stdout}");
    }
    assert!(stdout.contains("distal"), "missing joint rows: {stdout}");
}

#[test]
fn profiles_survive_separate_invocations_over_shared_storage() {
    let dir = tempfile::tempdir().unwrap();
    let storage = dir.path().to_str().unwrap();

    // Each invocation is its own engine over the same storage directory.
    let (ok, _, stderr) = run_mg(&["--emulated", "--storage-dir", storage, "profiles", "commit"]);
    assert!(ok, "commit failed: {stderr}");

    let (ok, stdout, stderr) =
        run_mg(&["--emulated", "--storage-dir", storage, "profiles", "list"]);
    assert!(ok, "list failed: {stderr}");
    assert!(stdout.contains("default"), "missing default profile: {stdout}");

    let (ok, stdout, stderr) =
        run_mg(&["--emulated", "--storage-dir", storage, "profiles", "show"]);
    assert!(ok, "show failed: {stderr}");
    assert!(
        stdout.contains("shoulderLength"),
        "missing profile fields: {stdout}"
    );
}

#[test]
fn out_of_range_vibration_power_fails_with_description() {
    let (ok, _, stderr) = run_mg(&["--emulated", "vibrate", "left", "1.5"]);
    assert!(!ok, "out-of-range power must fail");
    assert!(
        stderr.contains("out of range") || stderr.contains("outside [0, 1]"),
        "missing human-readable description: {stderr}"
    );
}

#[test]
fn errors_table_needs_no_engine() {
    let (ok, stdout, _) = run_mg(&["errors"]);
    assert!(ok);
    assert!(stdout.contains("100"));
    assert!(stdout.contains("not implemented"));
}
