//! Configuration file structures (with serde-derived parser)

pub mod bootstrap;
pub mod fetch;
pub mod node;
pub mod registry;

pub use self::{
    bootstrap::BootstrapConfig, fetch::FetchConfig, node::NodeConfig, registry::RegistryConfig,
};

use serde::Deserialize;
use std::{collections::HashMap, path::PathBuf, str::FromStr};

/// Environment variable containing path to config file
pub const CONFIG_ENV_VAR: &str = "COSMOBOOT_CONFIG_FILE";

/// Name of the bootstrapper configuration file
pub const CONFIG_FILE_NAME: &str = "cosmoboot.toml";

/// Bootstrapper configuration (i.e. TOML file parsed with serde)
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootConfig {
    /// Architecture key override (e.g. `linux/arm64`)
    pub arch: Option<String>,

    /// Node layout and naming
    #[serde(default)]
    pub node: NodeConfig,

    /// Chain metadata sources
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Version selection overrides
    #[serde(default)]
    pub bootstrap: BootstrapConfig,

    /// Artifact download settings
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl BootConfig {
    /// Apply environment-style overrides on top of the file configuration.
    ///
    /// Takes the variables as a map so that the process environment is only
    /// ever read in one place (the command's config hook).
    pub fn apply_env(mut self, env: &HashMap<String, String>) -> Result<Self, String> {
        let var = |name: &str| env.get(name).filter(|v| !v.is_empty()).cloned();

        if let Some(v) = var("DAEMON_HOME") {
            self.node.daemon_home = Some(PathBuf::from(v));
        }
        if let Some(v) = var("CHAIN_HOME") {
            self.node.chain_home = Some(PathBuf::from(v));
        }
        if let Some(v) = var("CHAIN_NAME") {
            self.node.chain_name = v;
        }
        if let Some(v) = var("CHAIN_NETWORK") {
            self.node.chain_network = v;
        }
        if let Some(v) = var("DAEMON_NAME") {
            self.node.daemon_name = Some(v);
        }
        if let Some(v) = var("CHAIN_JSON_URL") {
            self.registry.chain_json_url = Some(v);
        }
        if let Some(v) = var("BINARY_URL") {
            self.bootstrap.binary_url = Some(v);
        }
        if let Some(v) = var("BINARY_VERSION") {
            self.bootstrap.binary_version = Some(v);
        }
        if let Some(v) = var("RECOMMENDED_VERSION") {
            self.bootstrap.recommended_version = Some(v);
        }
        if let Some(v) = var("PREFER_RECOMMENDED_VERSION") {
            self.bootstrap.prefer_recommended = parse_flag("PREFER_RECOMMENDED_VERSION", &v)?;
        }
        if let Some(v) = var("STATESYNC_ENABLED") {
            self.bootstrap.statesync_enabled = parse_flag("STATESYNC_ENABLED", &v)?;
        }
        if let Some(v) = var("BINARY_ARCH") {
            self.arch = Some(v);
        }

        Ok(self)
    }
}

/// Parse a boolean environment flag (`true`/`false`/`1`/`0`, case-insensitive)
fn parse_flag(name: &str, value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "yes" | "on" => Ok(true),
        "0" | "no" | "off" => Ok(false),
        other => bool::from_str(other).map_err(|_| format!("invalid {}: `{}`", name, value)),
    }
}
