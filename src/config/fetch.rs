//! Artifact download configuration

use serde::Deserialize;

/// Artifact download settings
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    /// HTTP timeout in seconds for a single download
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// External tool used to copy container images
    #[serde(default = "default_image_tool")]
    pub image_tool: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            image_tool: default_image_tool(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_image_tool() -> String {
    "skopeo".to_owned()
}
