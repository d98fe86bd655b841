//! Selecting a version from the codebase and resolving its binary for the
//! running architecture

use crate::{
    arch::Arch,
    codebase::{CodebaseData, VersionDescriptor},
    Map,
};
use serde::Serialize;

/// A version ready to be installed on this host
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ResolvedVersion {
    /// Upgrade name (and directory name)
    pub name: String,

    /// Release tag
    pub tag: String,

    /// Recommended release identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_version: Option<String>,

    /// Activation height
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,

    /// Upgrade time recorded in `upgrade-info.json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    /// Source repository of the daemon
    #[serde(skip_serializing_if = "String::is_empty")]
    pub git_repo: String,

    /// Binary URL for this architecture
    pub binary_url: Option<String>,

    /// Library file names and URLs for this architecture
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub libraries: Map<String, String>,
}

impl ResolvedVersion {
    /// A one-off version pointing directly at a binary URL
    pub fn custom(name: impl Into<String>, binary_url: impl Into<String>) -> Self {
        let name = name.into();

        Self {
            tag: name.clone(),
            name,
            binary_url: Some(binary_url.into()),
            ..Default::default()
        }
    }

    /// Resolve a descriptor's binary and libraries for `arch`
    pub fn from_descriptor(
        codebase: &CodebaseData,
        version: &VersionDescriptor,
        arch: &Arch,
    ) -> Self {
        Self {
            name: version.name.clone(),
            tag: version.tag().to_owned(),
            recommended_version: version.recommended_version.clone(),
            height: version.height,
            time: version.time.clone(),
            git_repo: codebase.git_repo.clone(),
            binary_url: version.binary_url(arch).map(str::to_owned),
            libraries: version.libraries.for_arch(arch),
        }
    }
}

/// Version lookups over a codebase for one architecture
#[derive(Copy, Clone, Debug)]
pub struct Resolver<'a> {
    codebase: &'a CodebaseData,
    arch: &'a Arch,
}

impl<'a> Resolver<'a> {
    /// Create a resolver
    pub fn new(codebase: &'a CodebaseData, arch: &'a Arch) -> Self {
        Self { codebase, arch }
    }

    /// Find the version identified by `key`.
    ///
    /// Tags are matched first, then names, then recommended versions; within
    /// each, the first entry in registry order wins. Entries with no binary
    /// for this architecture never match.
    pub fn by_key(&self, key: &str) -> Option<ResolvedVersion> {
        let fields: [fn(&VersionDescriptor) -> Option<&str>; 3] = [
            |v| Some(v.tag()),
            |v| Some(v.name.as_str()),
            |v| v.recommended_version.as_deref(),
        ];

        fields.iter().find_map(|field| {
            self.installable()
                .find(|v| field(*v) == Some(key))
                .map(|v| self.resolve(v))
        })
    }

    /// Oldest version with a binary for this architecture
    pub fn first(&self) -> Option<ResolvedVersion> {
        self.installable().next().map(|v| self.resolve(v))
    }

    /// Newest version with a binary for this architecture
    pub fn last(&self) -> Option<ResolvedVersion> {
        self.installable().last().map(|v| self.resolve(v))
    }

    /// Version active at `height`: the one with the highest activation
    /// height not above it. Versions without a height are never returned.
    ///
    /// The result may lack a binary for this architecture, which makes it
    /// uninstallable rather than causing an older version to be picked.
    pub fn by_height(&self, height: u64) -> Option<ResolvedVersion> {
        let mut versions = self
            .codebase
            .versions
            .iter()
            .filter(|v| v.height.is_some())
            .collect::<Vec<_>>();

        // Stable sort: equal heights keep registry order
        versions.sort_by(|a, b| b.height.cmp(&a.height));

        versions
            .into_iter()
            .find(|v| v.height.map_or(false, |h| h <= height))
            .map(|v| self.resolve(v))
    }

    /// Version declared as genesis, falling back to the first version
    pub fn genesis(&self) -> Option<ResolvedVersion> {
        match &self.codebase.genesis_version {
            Some(key) => self.by_key(key),
            None => self.first(),
        }
    }

    /// Recommended version: `key` if given, else the codebase's declared
    /// recommended version, else the last version
    pub fn recommended(&self, key: Option<&str>) -> Option<ResolvedVersion> {
        match key.or(self.codebase.recommended_version.as_deref()) {
            Some(key) => self.by_key(key),
            None => self.last(),
        }
    }

    fn installable(&self) -> impl DoubleEndedIterator<Item = &'a VersionDescriptor> + 'a {
        let arch = self.arch;

        self.codebase
            .versions
            .iter()
            .filter(move |v| v.binary_url(arch).is_some())
    }

    fn resolve(&self, version: &VersionDescriptor) -> ResolvedVersion {
        ResolvedVersion::from_descriptor(self.codebase, version, self.arch)
    }
}
