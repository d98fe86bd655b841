//! Subcommands of the `cosmoboot` command-line application

pub mod bootstrap;
pub mod download;
pub mod resolve;
pub mod status;
pub mod version;

pub use self::{
    bootstrap::BootstrapCommand, download::DownloadCommand, resolve::ResolveCommand,
    status::StatusCommand, version::VersionCommand,
};

use crate::{
    config::{BootConfig, CONFIG_ENV_VAR, CONFIG_FILE_NAME},
    context::Context,
    prelude::*,
};
use abscissa_core::{Command, Configurable, FrameworkError, FrameworkErrorKind, Runnable};
use clap::Parser;
use std::{env, path::PathBuf, process};

/// Abort the operation, printing a formatted message and exiting the process
/// with a status code of 1 (i.e. error)
macro_rules! abort {
    ($fmt:expr, $($arg:tt)+) => {
        status_err!(format!($fmt, $($arg)+));
        std::process::exit(1);
    };
}

pub(crate) use abort;

/// Subcommands of the bootstrapper command-line application
#[derive(Command, Debug, Parser, Runnable)]
pub enum BootCommand {
    /// select, download, and link the version this node starts with
    Bootstrap(BootstrapCommand),

    /// download every registry version for this architecture
    Download(DownloadCommand),

    /// print the version a selector resolves to
    Resolve(ResolveCommand),

    /// query a node's sync status
    Status(StatusCommand),

    /// display the version
    Version(VersionCommand),
}

impl BootCommand {
    /// Are we configured for verbose logging?
    pub fn verbose(&self) -> bool {
        match self {
            BootCommand::Bootstrap(cmd) => cmd.verbose,
            BootCommand::Download(cmd) => cmd.verbose,
            BootCommand::Resolve(cmd) => cmd.verbose,
            BootCommand::Status(cmd) => cmd.verbose,
            BootCommand::Version(_) => false,
        }
    }
}

impl Configurable<BootConfig> for BootCommand {
    /// Get the path to the configuration file, either from selected subcommand
    /// or the default. A missing default file means built-in defaults.
    fn config_path(&self) -> Option<PathBuf> {
        let config = match self {
            BootCommand::Bootstrap(cmd) => cmd.config.as_ref(),
            BootCommand::Download(cmd) => cmd.config.as_ref(),
            BootCommand::Resolve(cmd) => cmd.config.as_ref(),
            BootCommand::Status(cmd) => cmd.config.as_ref(),
            BootCommand::Version(_) => return None,
        };

        if let Some(path) = config
            .cloned()
            .or_else(|| env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from))
        {
            return Some(path);
        }

        let default_path = PathBuf::from(CONFIG_FILE_NAME);
        default_path.exists().then_some(default_path)
    }

    /// Apply environment overrides to the loaded configuration
    fn process_config(&self, config: BootConfig) -> Result<BootConfig, FrameworkError> {
        if let BootCommand::Version(_) = self {
            return Ok(config);
        }

        config
            .apply_env(&env::vars().collect())
            .map_err(|e| FrameworkErrorKind::ConfigError.context(e).into())
    }
}

/// Build the runtime context from the application configuration, exiting
/// the process if that isn't possible
pub(crate) fn context() -> Context {
    let config = APP.config();

    Context::from_config(&config).unwrap_or_else(|e| {
        status_err!("invalid configuration: {}", e);
        process::exit(1);
    })
}
