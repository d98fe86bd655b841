//! Version selection overrides

use serde::Deserialize;

/// Version selection overrides consumed by the bootstrap policy
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapConfig {
    /// Install this binary URL unconditionally
    pub binary_url: Option<String>,

    /// Install the registry version with this tag or name
    /// (also names the upgrade when `binary_url` is set)
    pub binary_version: Option<String>,

    /// Prefer the recommended version over the genesis version
    #[serde(default)]
    pub prefer_recommended: bool,

    /// Recommended version identifier, overriding the registry's own
    pub recommended_version: Option<String>,

    /// The node will state-sync rather than replay from genesis
    #[serde(default)]
    pub statesync_enabled: bool,
}
