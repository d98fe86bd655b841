//! Loading codebase metadata from override documents or the chain registry

use super::{CodebaseData, Libraries, VersionDescriptor};
use crate::{
    context::Context,
    error::{Error, ErrorKind::*},
    fetch::Fetcher,
    prelude::*,
};
use serde::Deserialize;
use std::{
    fs,
    io::{self, Write},
    path::Path,
};
use tempfile::NamedTempFile;

/// Chain registry `chain.json` document (only the fields used here)
#[derive(Debug, Default, Deserialize)]
struct ChainJson {
    chain_name: Option<String>,
    daemon_name: Option<String>,
    network_type: Option<String>,
    #[serde(default)]
    codebase: ChainCodebase,
}

#[derive(Debug, Default, Deserialize)]
struct ChainCodebase {
    #[serde(default)]
    git_repo: String,
    recommended_version: Option<String>,
    #[serde(default)]
    genesis: ChainGenesis,
    #[serde(default)]
    versions: Vec<VersionDescriptor>,
}

#[derive(Debug, Default, Deserialize)]
struct ChainGenesis {
    version: Option<String>,
}

/// Load the codebase from the first source that exists: the upgrades YAML
/// override, the upgrades JSON override, then the chain registry document
/// (downloaded first when missing). Sources are never merged.
pub fn load(ctx: &Context, fetcher: &Fetcher) -> Result<CodebaseData, Error> {
    let registry = &ctx.registry;

    if registry.upgrades_yaml_path.exists() {
        info!(
            "Loading upgrades from {}...",
            registry.upgrades_yaml_path.display()
        );
        let yaml = read(&registry.upgrades_yaml_path)?;
        return serde_yaml::from_str(&yaml).map_err(|e| {
            format_err!(
                ParseError,
                "error parsing {}: {}",
                registry.upgrades_yaml_path.display(),
                e
            )
            .into()
        });
    }

    if registry.upgrades_json_path.exists() {
        info!(
            "Loading upgrades from {}...",
            registry.upgrades_json_path.display()
        );
        let json = read(&registry.upgrades_json_path)?;
        return serde_json::from_str(&json).map_err(|e| {
            format_err!(
                ParseError,
                "error parsing {}: {}",
                registry.upgrades_json_path.display(),
                e
            )
            .into()
        });
    }

    if !registry.chain_json_path.exists() {
        download_chain_json(ctx, fetcher)?;
    }

    let json = read(&registry.chain_json_path)?;
    let chain: ChainJson = serde_json::from_str(&json).map_err(|e| {
        format_err!(
            ParseError,
            "error parsing {}: {}",
            registry.chain_json_path.display(),
            e
        )
    })?;

    Ok(CodebaseData {
        chain_name: chain.chain_name.unwrap_or_else(|| ctx.chain_name.clone()),
        daemon_name: chain.daemon_name.unwrap_or_else(|| ctx.daemon_name.clone()),
        network_type: chain.network_type.unwrap_or_else(|| "mainnet".to_owned()),
        git_repo: chain.codebase.git_repo,
        versions: chain.codebase.versions,
        libraries: Libraries::default(),
        genesis_version: chain.codebase.genesis.version,
        recommended_version: chain.codebase.recommended_version,
    })
}

/// URL of the chain registry document for this chain
pub fn registry_url(ctx: &Context) -> String {
    if let Some(url) = &ctx.registry.chain_json_url {
        return url.clone();
    }

    // The registry swapped these names when Terra 2 launched
    let chain_name = match ctx.chain_name.as_str() {
        "terra" => "terra2",
        "terraclassic" => "terra",
        other => other,
    };

    let prefix = if ctx.chain_network == "mainnet" {
        ""
    } else {
        "testnets/"
    };

    format!(
        "{}/{}{}/chain.json",
        ctx.registry.registry_base_url.trim_end_matches('/'),
        prefix,
        chain_name
    )
}

/// Download the registry document and save it to `chain_json_path`
fn download_chain_json(ctx: &Context, fetcher: &Fetcher) -> Result<(), Error> {
    let url = registry_url(ctx);
    let path = &ctx.registry.chain_json_path;
    info!("Retrieving chain information from {}...", url);

    let body = fetcher.read_url(&url).map_err(|e| {
        format_err!(
            RegistryUnavailable,
            "couldn't download chain registry document {}: {}",
            url,
            e
        )
    })?;

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut staged = NamedTempFile::new_in(parent)?;
    staged.write_all(&body)?;
    staged.persist(path)?;

    debug!("saved chain registry document to {}", path.display());
    Ok(())
}

fn read(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|e: io::Error| {
        format_err!(IoError, "couldn't read {}: {}", path.display(), e).into()
    })
}
