//! Tests for the cosmoboot command-line interface

use std::{
    collections::HashMap,
    ffi::OsStr,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process::{Command, Output},
    sync::{Arc, Mutex},
    thread,
};

use super::BOOT_EXE_PATH;

mod bootstrap;
mod download;
mod resolve;
mod status;
mod version;

/// Run the `cosmoboot` CLI command with the given arguments and environment.
///
/// The environment is cleared first so overrides set on the host don't leak
/// into the test.
pub fn run_with_env<I, S>(args: I, envs: &[(&str, &str)]) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    Command::new(BOOT_EXE_PATH)
        .args(args)
        .env_clear()
        .envs(envs.iter().copied())
        .output()
        .unwrap()
}

/// Run the `cosmoboot` CLI command with the given arguments
pub fn run<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_with_env(args, &[])
}

/// Run the `cosmoboot` CLI command with the expectation that it will exit successfully,
/// panicking and printing stdout/stderr if it does not
pub fn run_successfully<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    check_success(run(args))
}

/// Panic with the command's output unless it exited successfully
pub fn check_success(output: Output) -> Output {
    let status_code = output.status.code().unwrap();

    if status_code == 0 {
        output
    } else {
        io::stdout().write_all(&output.stdout).unwrap();
        io::stderr().write_all(&output.stderr).unwrap();

        panic!("{BOOT_EXE_PATH} exited with error status: {status_code}");
    }
}

/// Write a `cosmoboot.toml` rooted at `home`, followed by `extra` TOML
pub fn write_config(home: &Path, chain_json_url: &str, extra: &str) -> PathBuf {
    let config = format!(
        r#"arch = "linux/amd64"

[node]
daemon_home = "{home}"
daemon_name = "terrad"
library_dir = "{home}/lib"
seed_dir = "{home}/seed"

[registry]
chain_json_url = "{chain_json_url}"
chain_json_path = "{home}/chain.json"
upgrades_json_path = "{home}/upgrades.json"
upgrades_yaml_path = "{home}/upgrades.yml"

[fetch]
timeout_secs = 5

{extra}
"#,
        home = home.display(),
    );

    let path = home.join("cosmoboot.toml");
    fs::write(&path, config).unwrap();
    path
}

/// Registry document for three versions served from `base_url`
pub fn chain_json(base_url: &str) -> String {
    serde_json::json!({
        "chain_name": "terra2",
        "daemon_name": "terrad",
        "network_type": "mainnet",
        "codebase": {
            "git_repo": "https://github.com/terra-money/core",
            "recommended_version": "v2.0.0",
            "versions": [
                {"name": "v1", "tag": "v1.0.0",
                 "binaries": {"linux/amd64": format!("{base_url}/v1/terrad?sig=abc")}},
                {"name": "v2", "tag": "v2.0.0", "height": 1000,
                 "binaries": {"linux/amd64": format!("{base_url}/v2/terrad")}},
                {"name": "v3", "tag": "v3.0.0", "height": 5000,
                 "binaries": {"linux/arm64": format!("{base_url}/v3/terrad")}}
            ]
        }
    })
    .to_string()
}

/// HTTP server for registry documents and artifacts
pub struct FileServer {
    base_url: String,
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FileServer {
    /// Start serving on an ephemeral local port
    pub fn start() -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", server.server_addr().to_ip().unwrap());
        let files = Arc::new(Mutex::new(HashMap::<String, Vec<u8>>::new()));
        let requests = Arc::new(Mutex::new(vec![]));

        let served = files.clone();
        let log = requests.clone();
        thread::spawn(move || {
            for request in server.incoming_requests() {
                let path = request.url().split('?').next().unwrap_or_default().to_owned();
                log.lock().unwrap().push(path.clone());

                let body = served.lock().unwrap().get(&path).cloned();
                let response = match body {
                    Some(body) => request.respond(tiny_http::Response::from_data(body)),
                    None => request.respond(tiny_http::Response::empty(404)),
                };
                response.unwrap();
            }
        });

        Self {
            base_url,
            files,
            requests,
        }
    }

    /// Base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of `path` on this server
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Serve `body` at `path`
    pub fn add(&self, path: &str, body: impl Into<Vec<u8>>) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_owned(), body.into());
    }

    /// Number of requests made for `path`
    pub fn request_count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|p| *p == path)
            .count()
    }
}

/// Server with the registry document and binaries for v1 and v2
pub fn registry_server() -> FileServer {
    let server = FileServer::start();
    server.add("/chain.json", chain_json(server.base_url()));
    server.add("/v1/terrad", "v1 binary");
    server.add("/v2/terrad", "v2 binary");
    server
}

#[test]
fn test_usage() {
    let status_code = run(&[] as &[&OsStr]).status.code().unwrap();
    assert_eq!(status_code, 2);
}
