//! Integration tests for the `bootstrap` subcommand

use crate::cli;
use std::{fs, os::unix::fs::PermissionsExt};

#[test]
fn fresh_node_gets_genesis_version() {
    let home = tempfile::tempdir().unwrap();
    let server = cli::registry_server();
    let config = cli::write_config(home.path(), &server.url("/chain.json"), "");

    cli::run_successfully(["bootstrap", "-c", config.to_str().unwrap()]);

    let cosmovisor = home.path().join("cosmovisor");
    let binary = cosmovisor.join("current/bin/terrad");
    assert_eq!(fs::read(&binary).unwrap(), b"v1 binary");
    assert_eq!(
        fs::metadata(&binary).unwrap().permissions().mode() & 0o777,
        0o755
    );
    assert_eq!(
        fs::read_link(cosmovisor.join("genesis")).unwrap(),
        cosmovisor.join("upgrades/v1")
    );

    // Registry document is saved for later runs
    assert!(home.path().join("chain.json").exists());
    assert_eq!(server.request_count("/chain.json"), 1);
}

#[test]
fn rerun_downloads_nothing() {
    let home = tempfile::tempdir().unwrap();
    let server = cli::registry_server();
    let config = cli::write_config(home.path(), &server.url("/chain.json"), "");

    cli::run_successfully(["bootstrap", "-c", config.to_str().unwrap()]);
    cli::run_successfully(["bootstrap", "-c", config.to_str().unwrap()]);

    assert_eq!(server.request_count("/chain.json"), 1);
    assert_eq!(server.request_count("/v1/terrad"), 1);
}

#[test]
fn configured_version_is_linked_current() {
    let home = tempfile::tempdir().unwrap();
    let server = cli::registry_server();
    let config = cli::write_config(
        home.path(),
        &server.url("/chain.json"),
        "[bootstrap]\nbinary_version = \"v2.0.0\"\n",
    );

    cli::run_successfully(["bootstrap", "-c", config.to_str().unwrap()]);

    let cosmovisor = home.path().join("cosmovisor");
    assert_eq!(
        fs::read_link(cosmovisor.join("current")).unwrap(),
        cosmovisor.join("upgrades/v2")
    );

    let info: serde_json::Value = serde_json::from_slice(
        &fs::read(cosmovisor.join("upgrades/v2/upgrade-info.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(info["name"], "v2");
    assert_eq!(info["height"], 1000);
}

#[test]
fn environment_overrides_config() {
    let home = tempfile::tempdir().unwrap();
    let server = cli::registry_server();
    server.add("/custom/terrad", "custom binary");
    let config = cli::write_config(home.path(), &server.url("/chain.json"), "");

    let binary_url = server.url("/custom/terrad");
    let output = cli::run_with_env(
        ["bootstrap", "-c", config.to_str().unwrap()],
        &[("BINARY_URL", binary_url.as_str())],
    );
    cli::check_success(output);

    assert_eq!(
        fs::read(home.path().join("cosmovisor/current/bin/terrad")).unwrap(),
        b"custom binary"
    );
    assert!(home.path().join("cosmovisor/upgrades/custom").is_dir());
    assert_eq!(server.request_count("/chain.json"), 0);
}

#[test]
fn unreachable_registry_exits_with_error() {
    let home = tempfile::tempdir().unwrap();
    let config = cli::write_config(home.path(), "http://127.0.0.1:1/chain.json", "");

    let output = cli::run(["bootstrap", "-c", config.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(!home.path().join("cosmovisor/current").exists());
}

#[test]
fn failed_binary_download_exits_with_error() {
    let home = tempfile::tempdir().unwrap();
    let server = cli::FileServer::start();
    server.add("/chain.json", cli::chain_json(server.base_url()));
    let config = cli::write_config(home.path(), &server.url("/chain.json"), "");

    let output = cli::run(["bootstrap", "-c", config.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(!home.path().join("cosmovisor/upgrades/v1/bin/terrad").exists());
}

#[test]
fn seeded_upgrades_are_not_downloaded() {
    let home = tempfile::tempdir().unwrap();
    let server = cli::registry_server();
    let config = cli::write_config(home.path(), &server.url("/chain.json"), "");

    let seeded = home.path().join("seed/upgrades/v1/bin/terrad");
    fs::create_dir_all(seeded.parent().unwrap()).unwrap();
    fs::write(&seeded, b"image v1").unwrap();

    cli::run_successfully(["bootstrap", "-c", config.to_str().unwrap()]);

    assert_eq!(server.request_count("/v1/terrad"), 0);
    assert_eq!(
        fs::read(home.path().join("cosmovisor/current/bin/terrad")).unwrap(),
        b"image v1"
    );
}
