//! Integration tests for the `download` subcommand

use crate::cli;
use std::fs;

#[test]
fn installs_every_supported_version() {
    let home = tempfile::tempdir().unwrap();
    let server = cli::registry_server();
    let config = cli::write_config(home.path(), &server.url("/chain.json"), "");

    cli::run_successfully(["download", "-c", config.to_str().unwrap()]);

    let upgrades = home.path().join("cosmovisor/upgrades");
    assert_eq!(fs::read(upgrades.join("v1/bin/terrad")).unwrap(), b"v1 binary");
    assert_eq!(fs::read(upgrades.join("v2/bin/terrad")).unwrap(), b"v2 binary");
    assert!(!upgrades.join("v3").exists());

    let cosmovisor = home.path().join("cosmovisor");
    assert!(fs::symlink_metadata(cosmovisor.join("current")).is_err());
    assert_eq!(
        fs::read_link(cosmovisor.join("genesis")).unwrap(),
        upgrades.join("v1")
    );
    assert_eq!(server.request_count("/v3/terrad"), 0);
}
