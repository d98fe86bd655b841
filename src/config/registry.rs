//! Chain metadata source configuration

use serde::Deserialize;
use std::path::PathBuf;

/// Default base URL of the public chain registry
pub const DEFAULT_REGISTRY_BASE_URL: &str =
    "https://raw.githubusercontent.com/cosmos/chain-registry/master";

/// Where chain metadata is read from, in order of precedence:
/// `upgrades_yaml_path`, `upgrades_json_path`, then `chain_json_path`
/// (downloaded first if absent).
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Explicit URL of the chain registry document
    pub chain_json_url: Option<String>,

    /// Base URL used to construct the registry document URL
    #[serde(default = "default_registry_base_url")]
    pub registry_base_url: String,

    /// Local path of the chain registry document
    #[serde(default = "default_chain_json_path")]
    pub chain_json_path: PathBuf,

    /// Local upgrades-override JSON file
    #[serde(default = "default_upgrades_json_path")]
    pub upgrades_json_path: PathBuf,

    /// Local upgrades-override YAML document
    #[serde(default = "default_upgrades_yaml_path")]
    pub upgrades_yaml_path: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            chain_json_url: None,
            registry_base_url: default_registry_base_url(),
            chain_json_path: default_chain_json_path(),
            upgrades_json_path: default_upgrades_json_path(),
            upgrades_yaml_path: default_upgrades_yaml_path(),
        }
    }
}

fn default_registry_base_url() -> String {
    DEFAULT_REGISTRY_BASE_URL.to_owned()
}

fn default_chain_json_path() -> PathBuf {
    PathBuf::from("/etc/default/chain.json")
}

fn default_upgrades_json_path() -> PathBuf {
    PathBuf::from("/etc/default/upgrades.json")
}

fn default_upgrades_yaml_path() -> PathBuf {
    PathBuf::from("/etc/default/upgrades.yml")
}
