use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::{TempDir, tempdir};

/// Matches of "error": item 0 once, item 2 twice, item 3 once (in the
/// tool arguments).
fn write_transcript(dir: &Path) -> PathBuf {
    let events = json!({
        "events": [
            {"event": "input", "input": "first error"},
            {"event": "input", "input": "fine"},
            {"event": "input", "input": "Error and ERROR"},
            {
                "event": "tool",
                "function": "read_file",
                "arguments": {"path": "error.log"},
                "result": "ok"
            }
        ]
    });
    let path = dir.join("transcript.json");
    fs::write(&path, events.to_string()).unwrap();
    path
}

fn setup() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = write_transcript(dir.path());
    (dir, path)
}

#[test]
fn test_count_prints_total() {
    let (dir, path) = setup();

    cargo_bin_cmd!("tfind")
        .env("TFIND_HOME", dir.path())
        .arg("count")
        .arg(&path)
        .arg("error")
        .assert()
        .success()
        .stdout("4\n");
}

#[test]
fn test_count_absent_term_is_zero() {
    let (dir, path) = setup();

    cargo_bin_cmd!("tfind")
        .env("TFIND_HOME", dir.path())
        .arg("count")
        .arg(&path)
        .arg("warning")
        .assert()
        .success()
        .stdout("0\n");
}

#[test]
fn test_count_by_item() {
    let (dir, path) = setup();

    cargo_bin_cmd!("tfind")
        .env("TFIND_HOME", dir.path())
        .arg("count")
        .arg(&path)
        .arg("error")
        .arg("--by-item")
        .assert()
        .success()
        .stdout(predicate::str::contains("0\tevent-0\t1\tInput"))
        .stdout(predicate::str::contains("2\tevent-2\t2\tInput"))
        .stdout(predicate::str::contains("3\tevent-3\t1\tTool: read_file"))
        .stdout(predicate::str::contains("event-1").not())
        .stdout(predicate::str::contains("total\t4"));
}

#[test]
fn test_locate_reports_item_and_occurrence() {
    let (dir, path) = setup();

    cargo_bin_cmd!("tfind")
        .env("TFIND_HOME", dir.path())
        .arg("locate")
        .arg(&path)
        .args(["error", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("match 3/4"))
        .stdout(predicate::str::contains("item 2 (event-2): Input"))
        .stdout(predicate::str::contains("occurrence 2"))
        .stdout(predicate::str::contains("Error and [ERROR]"));
}

#[test]
fn test_locate_out_of_range_fails() {
    let (dir, path) = setup();

    cargo_bin_cmd!("tfind")
        .env("TFIND_HOME", dir.path())
        .arg("locate")
        .arg(&path)
        .args(["error", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn test_missing_file_fails() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("tfind")
        .env("TFIND_HOME", dir.path())
        .arg("count")
        .arg(dir.path().join("nope.json"))
        .arg("error")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read transcript"));
}

#[test]
fn test_view_needs_a_terminal() {
    let (dir, path) = setup();

    cargo_bin_cmd!("tfind")
        .env("TFIND_HOME", dir.path())
        .arg("view")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("needs a terminal"));
}
