//! `download` subcommand

use crate::{codebase, commands::abort, fetch::Fetcher, prelude::*, upgrade::Installer};
use abscissa_core::Command;
use clap::Parser;
use std::path::PathBuf;

/// The `download` command
#[derive(Command, Debug, Default, Parser)]
pub struct DownloadCommand {
    /// path to configuration file
    #[clap(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// enable verbose debug logging
    #[clap(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Runnable for DownloadCommand {
    /// Install every version of the chain without changing `current`
    fn run(&self) {
        let ctx = super::context();
        let fetcher = Fetcher::new(&ctx);

        let codebase = codebase::load(&ctx, &fetcher).unwrap_or_else(|e| {
            abort!("couldn't load chain versions: {}", e);
        });

        let ctx = ctx.with_codebase_daemon_name(&codebase.daemon_name);

        let installed = Installer::new(&ctx, &fetcher)
            .install_all(&codebase)
            .unwrap_or_else(|e| {
                abort!("download failed: {}", e);
            });

        for installation in &installed {
            status_ok!("Installed", "{}", installation.dir.display());
        }

        status_ok!(
            "Finished",
            "{} of {} versions installed",
            installed.len(),
            codebase.versions.len()
        );
    }
}
