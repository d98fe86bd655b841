//! `bootstrap` subcommand

use crate::{bootstrap, commands::abort, fetch::Fetcher, prelude::*};
use abscissa_core::Command;
use clap::Parser;
use std::path::PathBuf;

/// The `bootstrap` command
#[derive(Command, Debug, Default, Parser)]
pub struct BootstrapCommand {
    /// path to configuration file
    #[clap(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// enable verbose debug logging
    #[clap(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Runnable for BootstrapCommand {
    /// Install the version this node starts with
    fn run(&self) {
        info!(
            "{} {} bootstrapping...",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        );

        let ctx = super::context();
        let fetcher = Fetcher::new(&ctx);

        let version = bootstrap::ensure_version_installed(&ctx, &fetcher).unwrap_or_else(|e| {
            abort!("bootstrap failed: {}", e);
        });

        status_ok!(
            "Installed",
            "{} ({})",
            version.name,
            ctx.current_link().display()
        );
    }
}
