//! Immutable runtime context derived from the configuration

use crate::{
    arch::Arch,
    config::{BootConfig, BootstrapConfig, FetchConfig, RegistryConfig},
    error::Error,
};
use std::{
    env,
    path::{Path, PathBuf},
};

/// Name of the upgrade manager directory inside the daemon home
pub const COSMOVISOR_DIR: &str = "cosmovisor";

/// Name of the file the daemon writes when it halts for an upgrade
pub const UPGRADE_INFO_FILE: &str = "upgrade-info.json";

/// Everything the bootstrapper components need, resolved once at startup
#[derive(Clone, Debug)]
pub struct Context {
    /// Architecture key of this host
    pub arch: Arch,

    /// Chain registry name
    pub chain_name: String,

    /// Network type (`mainnet` or a testnet)
    pub chain_network: String,

    /// Name of the daemon executable
    pub daemon_name: String,

    /// `true` if `daemon_name` was configured rather than derived
    pub daemon_name_configured: bool,

    /// Home directory of the upgrade manager
    pub daemon_home: PathBuf,

    /// Home directory of the chain daemon
    pub chain_home: PathBuf,

    /// Directory for global shared libraries
    pub library_dir: PathBuf,

    /// Upgrade manager tree shipped with the image
    pub seed_dir: PathBuf,

    /// Chain metadata sources
    pub registry: RegistryConfig,

    /// Version selection overrides
    pub bootstrap: BootstrapConfig,

    /// Artifact download settings
    pub fetch: FetchConfig,
}

impl Context {
    /// Build the context from a loaded configuration
    pub fn from_config(config: &BootConfig) -> Result<Self, Error> {
        let arch = match &config.arch {
            Some(key) => key.parse()?,
            None => Arch::detect()?,
        };

        let daemon_home = match &config.node.daemon_home {
            Some(path) => path.clone(),
            None => env::current_dir()?,
        };

        let chain_home = config
            .node
            .chain_home
            .clone()
            .unwrap_or_else(|| daemon_home.clone());

        let (daemon_name, daemon_name_configured) = match &config.node.daemon_name {
            Some(name) => (name.clone(), true),
            None => (format!("{}d", config.node.chain_name), false),
        };

        Ok(Self {
            arch,
            chain_name: config.node.chain_name.clone(),
            chain_network: config.node.chain_network.clone(),
            daemon_name,
            daemon_name_configured,
            daemon_home,
            chain_home,
            library_dir: config.node.library_dir.clone(),
            seed_dir: config.node.seed_dir.clone(),
            registry: config.registry.clone(),
            bootstrap: config.bootstrap.clone(),
            fetch: config.fetch.clone(),
        })
    }

    /// Use the daemon name declared by the codebase unless one was configured
    pub fn with_codebase_daemon_name(mut self, name: &str) -> Self {
        if !self.daemon_name_configured && !name.is_empty() {
            self.daemon_name = name.to_owned();
        }
        self
    }

    /// Root of the upgrade manager directory tree
    pub fn cosmovisor_dir(&self) -> PathBuf {
        self.daemon_home.join(COSMOVISOR_DIR)
    }

    /// Path of the `current` symlink
    pub fn current_link(&self) -> PathBuf {
        self.cosmovisor_dir().join("current")
    }

    /// Path of the `genesis` symlink
    pub fn genesis_link(&self) -> PathBuf {
        self.cosmovisor_dir().join("genesis")
    }

    /// Directory holding one subdirectory per installed upgrade
    pub fn upgrades_dir(&self) -> PathBuf {
        self.cosmovisor_dir().join("upgrades")
    }

    /// Chain data directory
    pub fn data_dir(&self) -> PathBuf {
        self.chain_home.join("data")
    }

    /// `upgrade-info.json` written by the daemon in its data directory
    pub fn upgrade_info_path(&self) -> PathBuf {
        self.data_dir().join(UPGRADE_INFO_FILE)
    }

    /// Path of the upgrade directory for the given upgrade name
    pub fn upgrade_dir(&self, name: &str) -> PathBuf {
        self.upgrades_dir().join(name)
    }

    /// Daemon binary path within an upgrade directory
    pub fn binary_path(&self, upgrade_dir: &Path) -> PathBuf {
        upgrade_dir.join("bin").join(&self.daemon_name)
    }
}
