//! `resolve` subcommand

use crate::{
    codebase,
    commands::abort,
    error::{Error, ErrorKind::*},
    fetch::Fetcher,
    prelude::*,
    resolver::{ResolvedVersion, Resolver},
    status::{self, Status},
};
use abscissa_core::Command;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// The `resolve` command
#[derive(Command, Debug, Default, Parser)]
#[clap(group(ArgGroup::new("selector").required(true)))]
pub struct ResolveCommand {
    /// path to configuration file
    #[clap(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// enable verbose debug logging
    #[clap(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// version tag, name, or recommended version
    #[clap(long, group = "selector")]
    pub key: Option<String>,

    /// version active at this block height
    #[clap(long, group = "selector")]
    pub height: Option<u64>,

    /// oldest version with a binary for this architecture
    #[clap(long, group = "selector")]
    pub first: bool,

    /// newest version with a binary for this architecture
    #[clap(long, group = "selector")]
    pub last: bool,

    /// genesis version
    #[clap(long, group = "selector")]
    pub genesis: bool,

    /// recommended version
    #[clap(long, group = "selector")]
    pub recommended: bool,

    /// version active at the latest height of the node at this RPC URL
    #[clap(long, group = "selector")]
    pub status_url: Option<String>,

    /// version active at the latest height in a saved `/status` response
    #[clap(long, group = "selector")]
    pub status_file: Option<PathBuf>,
}

impl Runnable for ResolveCommand {
    /// Print the selected version as JSON
    fn run(&self) {
        let version = self.resolve().unwrap_or_else(|e| {
            abort!("couldn't resolve version: {}", e);
        });

        match serde_json::to_string_pretty(&version) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                abort!("couldn't serialize version: {}", e);
            }
        }
    }
}

impl ResolveCommand {
    fn resolve(&self) -> Result<ResolvedVersion, Error> {
        let ctx = super::context();
        let fetcher = Fetcher::new(&ctx);
        let codebase = codebase::load(&ctx, &fetcher)?;
        let resolver = Resolver::new(&codebase, &ctx.arch);

        let (selector, version) = if let Some(key) = &self.key {
            (format!("key `{}`", key), resolver.by_key(key))
        } else if let Some(height) = self.status_height()? {
            (format!("height {}", height), resolver.by_height(height))
        } else if self.first {
            ("first version".to_owned(), resolver.first())
        } else if self.last {
            ("last version".to_owned(), resolver.last())
        } else if self.genesis {
            ("genesis version".to_owned(), resolver.genesis())
        } else {
            (
                "recommended version".to_owned(),
                resolver.recommended(ctx.bootstrap.recommended_version.as_deref()),
            )
        };

        version.ok_or_else(|| {
            format_err!(VersionNotFound, "no {} for {}", selector, ctx.arch).into()
        })
    }

    /// Height given directly or read from a node status
    fn status_height(&self) -> Result<Option<u64>, Error> {
        if let Some(height) = self.height {
            return Ok(Some(height));
        }

        let status = if let Some(url) = &self.status_url {
            status::Client::new(url, status::DEFAULT_TIMEOUT).get_status()?
        } else if let Some(path) = &self.status_file {
            info!("Looking for height in {}...", path.display());
            Status::load(path)?
        } else {
            return Ok(None);
        };

        Ok(Some(status.latest_block_height()))
    }
}
