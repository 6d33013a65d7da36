//! Integration tests for CLI behavior
//!
//! These run the actual binary against a throwaway home directory. Nothing
//! here reaches the network: saves that need remote bytes point at a closed
//! local port and are expected to fail.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn filekeep(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_filekeep"))
        .env("FILEKEEP_HOME", home)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run filekeep")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn integration_help_flag() {
    let output = Command::new(env!("CARGO_BIN_EXE_filekeep"))
        .arg("-h")
        .output()
        .expect("failed to run filekeep");

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("filekeep"));
    assert!(text.contains("Usage"));
}

#[test]
fn integration_save_without_url_is_usage_error() {
    let home = TempDir::new().unwrap();
    let output = filekeep(home.path(), &["save"]);
    assert!(!output.status.success());
}

// =============================================================================
// Backend selection
// =============================================================================

#[test]
fn integration_backend_defaults_to_filesystem() {
    let home = TempDir::new().unwrap();
    let output = filekeep(home.path(), &["backend"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "filesystem");
}

#[test]
fn integration_backend_object_store_when_sandbox_disabled() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("config.toml"), "[sandbox]\nenabled = false\n").unwrap();
    let output = filekeep(home.path(), &["backend"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "object-store");
}

#[test]
fn integration_no_backend_fails_operations() {
    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join("config.toml"),
        "[sandbox]\nenabled = false\n[object_store]\nenabled = false\n",
    )
    .unwrap();

    let output = filekeep(home.path(), &["backend"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "none");

    let output = filekeep(home.path(), &["list"]);
    assert!(!output.status.success());
}

#[test]
fn integration_home_flag_overrides_env() {
    let env_home = TempDir::new().unwrap();
    let flag_home = TempDir::new().unwrap();
    std::fs::write(env_home.path().join("config.toml"), "[sandbox]\nenabled = false\n").unwrap();

    let output = filekeep(
        env_home.path(),
        &["--home", flag_home.path().to_str().unwrap(), "backend"],
    );
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "filesystem");
}

// =============================================================================
// Enumeration and lookup
// =============================================================================

#[test]
fn integration_list_empty_store() {
    let home = TempDir::new().unwrap();
    for command in ["init", "list"] {
        let output = filekeep(home.path(), &[command]);
        assert!(output.status.success(), "{command}");
        assert!(stdout(&output).trim().is_empty(), "{command}");
    }
}

#[test]
fn integration_list_shows_existing_sandbox_files() {
    let home = TempDir::new().unwrap();
    let sandbox = home.path().join("sandbox");
    std::fs::create_dir_all(&sandbox).unwrap();
    std::fs::write(sandbox.join("report.pdf"), b"%PDF-1.7").unwrap();

    let output = filekeep(home.path(), &["list"]);
    assert!(output.status.success());
    let text = stdout(&output);
    let line = text.lines().next().unwrap();
    assert!(line.starts_with("report.pdf\tfile://"), "{line}");
    assert!(!text.contains(".filekeep"), "reserved files leaked: {text}");
}

#[test]
fn integration_list_json_is_valid() {
    let home = TempDir::new().unwrap();
    let sandbox = home.path().join("sandbox");
    std::fs::create_dir_all(&sandbox).unwrap();
    std::fs::write(sandbox.join("a.bin"), b"a").unwrap();

    let output = filekeep(home.path(), &["list", "--json"]);
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = parsed.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["name"], "a.bin");
    assert!(entries[0]["url"].as_str().unwrap().starts_with("file://"));
}

#[test]
fn integration_get_writes_bytes_to_output() {
    let home = TempDir::new().unwrap();
    let sandbox = home.path().join("sandbox");
    std::fs::create_dir_all(&sandbox).unwrap();
    std::fs::write(sandbox.join("data.bin"), [0u8, 1, 2, 255]).unwrap();
    let out = home.path().join("copy.bin");

    let output = filekeep(home.path(), &["get", "data.bin", "-o", out.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(std::fs::read(&out).unwrap(), vec![0u8, 1, 2, 255]);
}

#[test]
fn integration_get_unknown_name_fails() {
    let home = TempDir::new().unwrap();
    let output = filekeep(home.path(), &["get", "never-saved.bin"]);
    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
}

// =============================================================================
// Saving
// =============================================================================

#[test]
fn integration_save_unreachable_url_fails() {
    let home = TempDir::new().unwrap();
    let output = filekeep(home.path(), &["save", "http://127.0.0.1:9/x.bin"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("http://127.0.0.1:9/x.bin"), "{stderr}");

    // Nothing was persisted.
    let output = filekeep(home.path(), &["list"]);
    assert!(output.status.success());
    assert!(stdout(&output).trim().is_empty());
}
