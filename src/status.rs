//! Node sync status from the RPC `/status` endpoint

use crate::{
    error::{Error, ErrorKind::*},
    prelude::*,
};
use serde::Deserialize;
use std::{fs, io::Read, path::Path, time::Duration};
use tendermint::{block, node};

/// Default RPC address of a local node
pub const DEFAULT_RPC_URL: &str = "http://localhost:26657";

/// Default timeout for status requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON-RPC response envelope
#[derive(Debug, Deserialize)]
struct Response {
    result: Status,
}

/// Node status, as reported by `/status`
#[derive(Clone, Debug, Deserialize)]
pub struct Status {
    /// Node identity
    pub node_info: NodeInfo,

    /// Sync progress
    pub sync_info: SyncInfo,
}

/// Node identity section of the status
#[derive(Clone, Debug, Deserialize)]
pub struct NodeInfo {
    /// Node ID
    pub id: node::Id,

    /// P2P listen address
    #[serde(default)]
    pub listen_addr: String,

    /// Chain ID
    #[serde(default)]
    pub network: String,
}

/// Sync section of the status
#[derive(Clone, Debug, Deserialize)]
pub struct SyncInfo {
    /// Height of the latest block
    pub latest_block_height: block::Height,

    /// Is the node still syncing?
    pub catching_up: bool,
}

impl Status {
    /// Parse a `/status` JSON-RPC response
    pub fn parse(json: &[u8]) -> Result<Self, Error> {
        let response: Response = serde_json::from_slice(json)
            .map_err(|e| format_err!(StatusError, "malformed status response: {}", e))?;

        Ok(response.result)
    }

    /// Load a previously saved `/status` response
    pub fn load(path: &Path) -> Result<Self, Error> {
        let json = fs::read(path)
            .map_err(|e| format_err!(StatusError, "couldn't read {}: {}", path.display(), e))?;

        Self::parse(&json)
    }

    /// Is the node still catching up?
    pub fn catching_up(&self) -> bool {
        self.sync_info.catching_up
    }

    /// Latest block height
    pub fn latest_block_height(&self) -> u64 {
        self.sync_info.latest_block_height.value()
    }

    /// ID of the node
    pub fn node_id(&self) -> node::Id {
        self.node_info.id
    }
}

/// RPC status client
#[derive(Debug)]
pub struct Client {
    agent: ureq::Agent,
    url: String,
}

impl Client {
    /// Create a client for the node RPC at `rpc_url`
    pub fn new(rpc_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        let url = format!("{}/status", rpc_url.trim_end_matches('/'));

        Self { agent, url }
    }

    /// Fetch the node's current status
    pub fn get_status(&self) -> Result<Status, Error> {
        debug!("requesting {}", self.url);

        let response = self
            .agent
            .get(&self.url)
            .call()
            .map_err(|e| format_err!(StatusError, "couldn't query {}: {}", self.url, e))?;

        let mut body = vec![];
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| format_err!(StatusError, "error reading {}: {}", self.url, e))?;

        Status::parse(&body)
    }
}
