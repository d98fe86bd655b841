//! Node layout configuration

use serde::Deserialize;
use std::path::PathBuf;

/// Node layout and naming configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// Home directory of the upgrade manager (default: current directory)
    pub daemon_home: Option<PathBuf>,

    /// Home directory of the chain daemon (default: `daemon_home`)
    pub chain_home: Option<PathBuf>,

    /// Chain registry name of the chain (e.g. `osmosis`)
    #[serde(default = "default_chain_name")]
    pub chain_name: String,

    /// Network type: `mainnet` or a testnet name
    #[serde(default = "default_chain_network")]
    pub chain_network: String,

    /// Name of the daemon executable (default: `<chain_name>d`)
    pub daemon_name: Option<String>,

    /// Directory for global shared libraries listed by the codebase
    #[serde(default = "default_library_dir")]
    pub library_dir: PathBuf,

    /// Upgrade manager tree shipped with the image; its `upgrades/` are
    /// copied into the daemon home before a version is chosen
    #[serde(default = "default_seed_dir")]
    pub seed_dir: PathBuf,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            daemon_home: None,
            chain_home: None,
            chain_name: default_chain_name(),
            chain_network: default_chain_network(),
            daemon_name: None,
            library_dir: default_library_dir(),
            seed_dir: default_seed_dir(),
        }
    }
}

fn default_chain_name() -> String {
    "terra".to_owned()
}

fn default_chain_network() -> String {
    "mainnet".to_owned()
}

fn default_library_dir() -> PathBuf {
    PathBuf::from("/usr/lib")
}

fn default_seed_dir() -> PathBuf {
    PathBuf::from("/opt/cosmovisor")
}
