//! Chain codebase metadata: the ordered version history of a chain

mod source;

pub use self::source::{load, registry_url};

use crate::{arch::Arch, fetch, Map};
use serde::{de, Deserialize, Deserializer, Serialize};

/// Normalized chain metadata, whichever document it was read from
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CodebaseData {
    /// Chain registry name
    #[serde(default)]
    pub chain_name: String,

    /// Name of the daemon executable
    #[serde(default)]
    pub daemon_name: String,

    /// `mainnet` or `testnet`
    #[serde(default)]
    pub network_type: String,

    /// Source repository of the daemon
    #[serde(default)]
    pub git_repo: String,

    /// Versions in registry order (later entries are newer)
    #[serde(default)]
    pub versions: Vec<VersionDescriptor>,

    /// Libraries installed regardless of version
    #[serde(default)]
    pub libraries: Libraries,

    /// Version active at height 0, if declared
    #[serde(default)]
    pub genesis_version: Option<String>,

    /// Version operators should run, if declared
    #[serde(default)]
    pub recommended_version: Option<String>,
}

/// One entry in the chain's version history
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct VersionDescriptor {
    /// Upgrade name (also the upgrade directory name)
    #[serde(default)]
    pub name: String,

    /// Release tag (defaults to `name`)
    #[serde(default)]
    pub tag: Option<String>,

    /// Recommended release identifier for this upgrade
    #[serde(default)]
    pub recommended_version: Option<String>,

    /// Activation height; `None` for versions without automatic activation
    #[serde(default, deserialize_with = "deserialize_height")]
    pub height: Option<u64>,

    /// Upgrade time recorded in `upgrade-info.json`
    #[serde(default)]
    pub time: Option<String>,

    /// Download URLs keyed by architecture (`linux/amd64`, `docker/linux/amd64`)
    #[serde(default)]
    pub binaries: Map<String, String>,

    /// Shared libraries needed by the binary
    #[serde(default)]
    pub libraries: Libraries,
}

impl VersionDescriptor {
    /// Tag of this version, falling back to its name
    pub fn tag(&self) -> &str {
        self.tag.as_deref().unwrap_or(&self.name)
    }

    /// Binary URL for the given architecture, falling back to the
    /// container-image entry. Empty URLs count as absent.
    pub fn binary_url(&self, arch: &Arch) -> Option<&str> {
        lookup_arch(&self.binaries, arch)
    }
}

/// Shared library download URLs
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Libraries {
    /// Plain list of URLs; files are named after the URL basename
    Urls(Vec<String>),

    /// File name to URL
    Named(Map<String, String>),

    /// Architecture key to a file name to URL mapping
    PerArch(Map<String, Map<String, String>>),
}

impl Default for Libraries {
    fn default() -> Self {
        Libraries::Urls(vec![])
    }
}

impl Libraries {
    /// Library file names and URLs applicable to the given architecture
    pub fn for_arch(&self, arch: &Arch) -> Map<String, String> {
        match self {
            Libraries::Urls(urls) => urls
                .iter()
                .filter(|url| !url.is_empty())
                .map(|url| (fetch::url_file_name(url), url.clone()))
                .collect(),
            Libraries::Named(named) => named.clone(),
            Libraries::PerArch(per_arch) => per_arch
                .get(&arch.to_string())
                .or_else(|| per_arch.get(&arch.docker_key()))
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Are there no libraries at all?
    pub fn is_empty(&self) -> bool {
        match self {
            Libraries::Urls(urls) => urls.is_empty(),
            Libraries::Named(named) => named.is_empty(),
            Libraries::PerArch(per_arch) => per_arch.is_empty(),
        }
    }
}

/// Look up an architecture-keyed URL, falling back to the `docker/` key
pub(crate) fn lookup_arch<'a>(urls: &'a Map<String, String>, arch: &Arch) -> Option<&'a str> {
    urls.get(&arch.to_string())
        .filter(|url| !url.is_empty())
        .or_else(|| urls.get(&arch.docker_key()).filter(|url| !url.is_empty()))
        .map(String::as_str)
}

/// Heights appear as numbers, numeric strings, or empty strings
pub(crate) fn deserialize_height<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawHeight {
        Number(u64),
        Text(String),
    }

    match Option::<RawHeight>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawHeight::Number(height)) => Ok(Some(height)),
        Some(RawHeight::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawHeight::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid height: `{}`", text))),
    }
}
