//! Integration tests for the `resolve` subcommand

use crate::cli;
use std::{fs, path::Path, str};

/// Config with a local registry document, so no server is needed
fn local_registry(home: &Path) -> String {
    fs::write(
        home.join("chain.json"),
        cli::chain_json("https://example.com"),
    )
    .unwrap();

    let config = cli::write_config(home, "http://127.0.0.1:1/chain.json", "");
    config.to_str().unwrap().to_owned()
}

fn resolved_name(args: &[&str]) -> String {
    let output = cli::run_successfully(args);
    let stdout = str::from_utf8(&output.stdout).unwrap();

    // Skip any log lines printed ahead of the JSON document
    let start = if stdout.starts_with('{') {
        0
    } else {
        stdout.rfind("\n{\n").unwrap() + 1
    };

    let version: serde_json::Value = serde_json::from_str(&stdout[start..]).unwrap();
    version["name"].as_str().unwrap().to_owned()
}

#[test]
fn resolves_by_height() {
    let home = tempfile::tempdir().unwrap();
    let config = local_registry(home.path());

    assert_eq!(resolved_name(&["resolve", "-c", config.as_str(), "--height", "3000"]), "v2");
    assert_eq!(resolved_name(&["resolve", "-c", config.as_str(), "--height", "5000"]), "v3");

    // Only v2 and v3 carry heights
    let output = cli::run(["resolve", "-c", config.as_str(), "--height", "500"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn resolves_selectors() {
    let home = tempfile::tempdir().unwrap();
    let config = local_registry(home.path());

    assert_eq!(resolved_name(&["resolve", "-c", config.as_str(), "--key", "v2.0.0"]), "v2");
    assert_eq!(resolved_name(&["resolve", "-c", config.as_str(), "--first"]), "v1");
    assert_eq!(resolved_name(&["resolve", "-c", config.as_str(), "--last"]), "v2");
    assert_eq!(resolved_name(&["resolve", "-c", config.as_str(), "--genesis"]), "v1");
    assert_eq!(resolved_name(&["resolve", "-c", config.as_str(), "--recommended"]), "v2");
}

#[test]
fn resolves_from_saved_status() {
    let home = tempfile::tempdir().unwrap();
    let config = local_registry(home.path());
    let status = home.path().join("status.json");
    fs::write(
        &status,
        r#"{"result": {
            "node_info": {"id": "6ae5b3d4d4e5f0d7e4a3f1a2b3c4d5e6f7a8b9c0"},
            "sync_info": {"latest_block_height": "1200", "catching_up": false}
        }}"#,
    )
    .unwrap();

    let name = resolved_name(&[
        "resolve",
        "-c",
        &config,
        "--status-file",
        status.to_str().unwrap(),
    ]);
    assert_eq!(name, "v2");
}

#[test]
fn unknown_key_exits_with_error() {
    let home = tempfile::tempdir().unwrap();
    let config = local_registry(home.path());

    let output = cli::run(["resolve", "-c", config.as_str(), "--key", "v9"]);
    assert_eq!(output.status.code(), Some(1));

    // v3 only ships an arm64 binary
    let output = cli::run(["resolve", "-c", config.as_str(), "--key", "v3"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn selector_is_required() {
    let home = tempfile::tempdir().unwrap();
    let config = local_registry(home.path());

    let output = cli::run(["resolve", "-c", config.as_str()]);
    assert_eq!(output.status.code(), Some(2));
}
