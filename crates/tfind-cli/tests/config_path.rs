use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_config_path_command() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("tfind")
        .env("TFIND_HOME", dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_path_honors_override() {
    let dir = tempdir().unwrap();
    let custom = dir.path().join("custom.toml");

    cargo_bin_cmd!("tfind")
        .env("TFIND_HOME", dir.path())
        .arg("--config")
        .arg(&custom)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_init_creates_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    assert!(!config_path.exists());

    cargo_bin_cmd!("tfind")
        .env("TFIND_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config at"));

    let contents = fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("debounce_ms = 100"));
    assert!(contents.contains("[view]"));
}

#[test]
fn test_config_init_fails_if_exists() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "# existing config").unwrap();

    cargo_bin_cmd!("tfind")
        .env("TFIND_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "[find\n").unwrap();
    let transcript = dir.path().join("t.json");
    fs::write(&transcript, "[]").unwrap();

    cargo_bin_cmd!("tfind")
        .env("TFIND_HOME", dir.path())
        .arg("count")
        .arg(&transcript)
        .arg("error")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"));
}
