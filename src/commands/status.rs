//! `status` subcommand

use crate::{
    commands::abort,
    prelude::*,
    status::{Client, Status, DEFAULT_RPC_URL, DEFAULT_TIMEOUT},
};
use abscissa_core::Command;
use clap::Parser;
use std::path::PathBuf;

/// The `status` command
#[derive(Command, Debug, Parser)]
pub struct StatusCommand {
    /// path to configuration file
    #[clap(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// enable verbose debug logging
    #[clap(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// node RPC address
    #[clap(short = 'u', long = "rpc-url", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// read a saved `/status` response instead of querying the node
    #[clap(short = 'f', long = "file")]
    pub file: Option<PathBuf>,
}

impl Runnable for StatusCommand {
    /// Print the node's sync status
    fn run(&self) {
        let result = match &self.file {
            Some(path) => Status::load(path),
            None => Client::new(&self.rpc_url, DEFAULT_TIMEOUT).get_status(),
        };

        let status = result.unwrap_or_else(|e| {
            abort!("couldn't get node status: {}", e);
        });

        println!("catching_up: {}", status.catching_up());
        println!("latest_block_height: {}", status.latest_block_height());
        println!("node_id: {}", status.node_id());
    }
}
