//! `upgrade-info.json`: the upgrade manager's record of a pending upgrade

use crate::{
    arch::Arch,
    codebase::{deserialize_height, lookup_arch},
    error::{Error, ErrorKind::*},
    fetch::Fetcher,
    prelude::*,
    resolver::ResolvedVersion,
    Map,
};
use serde::{Deserialize, Serialize};
use std::{fs, io::Write, path::Path};
use tempfile::NamedTempFile;

/// Time recorded for upgrades without a known time
pub const DEFAULT_UPGRADE_TIME: &str = "0001-01-01T00:00:00Z";

/// Contents of an `upgrade-info.json` file
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct UpgradeInfo {
    /// Upgrade name
    #[serde(default)]
    pub name: String,

    /// Upgrade time
    #[serde(default)]
    pub time: String,

    /// Upgrade height
    #[serde(
        default,
        deserialize_with = "deserialize_height",
        skip_serializing_if = "Option::is_none"
    )]
    pub height: Option<u64>,

    /// JSON-encoded `{"binaries": {...}}` document, or a URL
    #[serde(default)]
    pub info: String,
}

/// `{"binaries": {...}}` payload of the `info` field
#[derive(Debug, Default, Deserialize, Serialize)]
struct BinariesDoc {
    #[serde(default)]
    binaries: Map<String, String>,
}

impl UpgradeInfo {
    /// Record of an installed version activating at `height`
    pub fn for_version(version: &ResolvedVersion, arch: &Arch, height: u64) -> Result<Self, Error> {
        let mut binaries = Map::new();
        binaries.insert(
            arch.to_string(),
            version.binary_url.clone().unwrap_or_default(),
        );

        Ok(Self {
            name: version.name.clone(),
            time: version
                .time
                .clone()
                .unwrap_or_else(|| DEFAULT_UPGRADE_TIME.to_owned()),
            height: Some(height),
            info: serde_json::to_string(&BinariesDoc { binaries })?,
        })
    }

    /// Parse an `upgrade-info.json` file
    pub fn load(path: &Path) -> Result<Self, Error> {
        let json = fs::read_to_string(path)
            .map_err(|e| format_err!(IoError, "couldn't read {}: {}", path.display(), e))?;

        let info: Self = serde_json::from_str(&json)
            .map_err(|e| format_err!(ParseError, "error parsing {}: {}", path.display(), e))?;

        if info.name.is_empty() {
            fail!(ParseError, "{} does not name an upgrade", path.display());
        }

        Ok(info)
    }

    /// Write to `path` unless a file is already there
    pub fn write_new(&self, path: &Path) -> Result<bool, Error> {
        if path.exists() {
            return Ok(false);
        }

        let parent = crate::fetch::parent_dir(path);
        let mut staged = NamedTempFile::new_in(parent)?;
        serde_json::to_writer(&mut staged, self)?;
        staged.write_all(b"\n")?;

        // Fails instead of replacing a file created in the meantime
        staged.persist_noclobber(path)?;
        Ok(true)
    }

    /// Classify the `info` field
    pub fn source(&self) -> Result<InfoSource, Error> {
        InfoSource::classify(&self.info)
    }

    /// Resolve the binary to install for this upgrade, reading the
    /// document `info` refers to if necessary
    pub fn resolve(&self, arch: &Arch, fetcher: &Fetcher) -> Result<ResolvedVersion, Error> {
        let binary_url = match self.source()? {
            InfoSource::Binaries(binaries) => lookup_arch(&binaries, arch).map(str::to_owned),
            InfoSource::Document(url) => {
                info!("Reading upgrade binaries from {}...", url);
                let body = fetcher.read_url(&url)?;
                let doc: BinariesDoc = serde_json::from_slice(&body)
                    .map_err(|e| format_err!(ParseError, "error parsing {}: {}", url, e))?;
                lookup_arch(&doc.binaries, arch).map(str::to_owned)
            }
            InfoSource::Direct(url) => Some(url),
            InfoSource::Empty => None,
        };

        if binary_url.is_none() {
            warn!("upgrade {} names no binary for {}", self.name, arch);
        }

        Ok(ResolvedVersion {
            name: self.name.clone(),
            tag: self.name.clone(),
            binary_url,
            ..Default::default()
        })
    }
}

/// Where the binaries of an upgrade are described
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InfoSource {
    /// Inline architecture-keyed binary URLs
    Binaries(Map<String, String>),

    /// URL of a JSON document containing the binaries
    Document(String),

    /// URL of the binary itself
    Direct(String),

    /// Nothing to go on
    Empty,
}

impl InfoSource {
    /// Classify an `info` value.
    ///
    /// Inline documents written by hand often use single quotes or carry a
    /// trailing comma; both are tolerated.
    pub fn classify(info: &str) -> Result<Self, Error> {
        let info = info.trim().trim_end_matches(',').replace('\'', "\"");

        if info.is_empty() {
            return Ok(InfoSource::Empty);
        }

        if info.ends_with(".json") {
            return Ok(InfoSource::Document(info));
        }

        if info.contains("binaries") {
            let doc: BinariesDoc = serde_json::from_str(&info)
                .map_err(|e| format_err!(ParseError, "malformed upgrade info `{}`: {}", info, e))?;
            return Ok(InfoSource::Binaries(doc.binaries));
        }

        Ok(InfoSource::Direct(info))
    }
}
