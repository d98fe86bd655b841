//! Integration tests for the `status` subcommand

use crate::cli;
use std::{fs, str};

#[test]
fn prints_saved_status() {
    let dir = tempfile::tempdir().unwrap();
    let status = dir.path().join("status.json");
    fs::write(
        &status,
        r#"{"jsonrpc": "2.0", "id": -1, "result": {
            "node_info": {"id": "6ae5b3d4d4e5f0d7e4a3f1a2b3c4d5e6f7a8b9c0", "network": "phoenix-1"},
            "sync_info": {"latest_block_height": "7603700", "catching_up": true}
        }}"#,
    )
    .unwrap();

    let output = cli::run_successfully(["status", "--file", status.to_str().unwrap()]);
    let stdout = str::from_utf8(&output.stdout).unwrap();

    assert!(stdout.contains("catching_up: true"));
    assert!(stdout.contains("latest_block_height: 7603700"));
    assert!(stdout.contains("node_id: 6ae5b3d4d4e5f0d7e4a3f1a2b3c4d5e6f7a8b9c0"));
}

#[test]
fn unreachable_node_exits_with_error() {
    let output = cli::run(["status", "--rpc-url", "http://127.0.0.1:1"]);
    assert_eq!(output.status.code(), Some(1));
}
