//! Golden tests for exit codes and JSON error output of the `nexus3` binary
//!
//! None of these need a running Nexus service. Each test points the
//! configuration directory at a fresh temp dir.
//!
//! Run with: `cargo test --features golden`

#![cfg(feature = "golden")]

use std::process::{Command, Output};

use tempfile::TempDir;

fn nexus3(config_dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_nexus3"))
        .args(args)
        .env("NEXUS3_CONFIG_DIR", config_dir.path())
        .env_remove("RUST_LOG")
        .env_remove("NEXUS3_URL")
        .env_remove("NEXUS3_USERNAME")
        .env_remove("NEXUS3_PASSWORD")
        .output()
        .expect("Failed to execute nexus3")
}

/// URL of a local port with nothing listening on it
fn unused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

fn write_config(config_dir: &TempDir, url: &str) {
    let config = format!(
        "url = \"{url}\"\nusername = \"admin\"\npassword = \"admin123\"\nx509_verify = true\napi_version = \"v1\"\n"
    );
    std::fs::write(config_dir.path().join("config.toml"), config).unwrap();
}

#[test]
fn test_help_exits_zero() {
    let dir = TempDir::new().unwrap();
    let output = nexus3(&dir, &["--help"]);
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in [
        "login",
        "list",
        "upload",
        "download",
        "delete",
        "repository",
        "script",
        "cleanup_policy",
    ] {
        assert!(stdout.contains(command), "{command} missing from help");
    }
}

#[test]
fn test_usage_error_exit_code() {
    let dir = TempDir::new().unwrap();
    let output = nexus3(&dir, &["upload"]);
    assert_eq!(output.status.code(), Some(10));

    let output = nexus3(&dir, &["frobnicate"]);
    assert_eq!(output.status.code(), Some(10));
}

#[test]
fn test_invalid_repository_path_exit_code() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, &unused_url());

    let output = nexus3(&dir, &["list", "/leading/slash", "--json"]);
    assert_eq!(output.status.code(), Some(10));
    assert!(output.stdout.is_empty());

    let stderr: serde_json::Value =
        serde_json::from_slice(&output.stderr).expect("stderr should be JSON");
    assert!(stderr["error"].is_string());
}

#[test]
fn test_connection_error_json() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, &unused_url());

    let output = nexus3(&dir, &["repository", "list", "--json"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty());

    let stderr: serde_json::Value =
        serde_json::from_slice(&output.stderr).expect("stderr should be JSON");
    let keys: Vec<_> = stderr.as_object().unwrap().keys().cloned().collect();
    insta::assert_json_snapshot!(keys, @r#"
    [
      "error"
    ]
    "#);
}

#[test]
fn test_repository_delete_needs_confirmation() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, &unused_url());

    // stdin and stderr are not a terminal here, so nothing can confirm
    let output = nexus3(&dir, &["repository", "delete", "files", "--json"]);
    assert_eq!(output.status.code(), Some(10));

    let output = nexus3(&dir, &["repository", "delete", "files", "--force", "--json"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_invalid_management_arguments_exit_code() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, &unused_url());

    let output = nexus3(&dir, &["cleanup_policy", "create", "idle", "--json"]);
    assert_eq!(output.status.code(), Some(10));

    let output = nexus3(
        &dir,
        &["repository", "create", "hosted", "yum", "rpms", "--depth", "6", "--json"],
    );
    assert_eq!(output.status.code(), Some(10));

    let output = nexus3(&dir, &["repository", "create", "hosted", "docker", "images"]);
    assert_eq!(output.status.code(), Some(11));
}

#[test]
fn test_login_failure_saves_nothing() {
    let dir = TempDir::new().unwrap();
    let url = unused_url();

    let output = nexus3(&dir, &["login", "--url", &url, "--json"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(!dir.path().join("config.toml").exists());
}

#[test]
fn test_missing_config_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();

    // the default URL points at localhost:8081; either way the command must
    // not fail on the missing file itself
    let output = nexus3(&dir, &["list", "files/", "--quiet"]);
    assert_ne!(output.status.code(), Some(99));
}

#[test]
fn test_completions_output() {
    let dir = TempDir::new().unwrap();
    let output = nexus3(&dir, &["completions", "bash"]);
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("nexus3"));
}
