//! Fetching binaries and libraries from URLs, container images, or local paths

mod archive;
mod image;

pub use self::archive::Extraction;

use crate::{
    arch::Arch,
    config::FetchConfig,
    context::Context,
    error::{Error, ErrorKind::*},
    prelude::*,
};
use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

/// Scheme prefix of container image sources
pub const IMAGE_SCHEME: &str = "docker://";

/// Transport used to download artifacts
pub trait Transport {
    /// Download the resource at `url` into `out`, returning the byte count.
    ///
    /// Non-2xx responses are errors.
    fn download(&self, url: &str, out: &mut dyn Write) -> Result<u64, Error>;
}

/// Blocking HTTP(S) transport
#[derive(Debug)]
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    /// Create a transport using the configured timeout
    pub fn new(config: &FetchConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("cosmoboot/", env!("CARGO_PKG_VERSION")))
            .build();

        Self { agent }
    }
}

impl Transport for HttpTransport {
    fn download(&self, url: &str, out: &mut dyn Write) -> Result<u64, Error> {
        let response = self.agent.get(url).call()?;
        let mut reader = response.into_reader();
        Ok(io::copy(&mut reader, out)?)
    }
}

/// Where an artifact comes from
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Source {
    /// Container image reference (`docker://...`)
    Image(String),

    /// HTTP(S) URL
    Http(Url),

    /// File on the local filesystem (absolute or relative path, or a
    /// `file://` URL)
    Local(PathBuf),
}

impl Source {
    /// Classify an artifact location
    pub fn parse(location: &str) -> Result<Self, Error> {
        if location.starts_with(IMAGE_SCHEME) {
            return Ok(Source::Image(location.to_owned()));
        }

        if location.starts_with('/') {
            return Ok(Source::Local(PathBuf::from(location)));
        }

        let url = match Url::parse(location) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) if !location.trim().is_empty() => {
                return Ok(Source::Local(PathBuf::from(location)));
            }
            Err(e) => fail!(FetchFailed, "invalid location `{}`: {}", location, e),
        };

        match url.scheme() {
            "http" | "https" => Ok(Source::Http(url)),
            "file" => url
                .to_file_path()
                .map(Source::Local)
                .map_err(|_| format_err!(FetchFailed, "invalid file URL: {}", location).into()),
            other => fail!(FetchFailed, "unsupported URL scheme `{}`: {}", other, location),
        }
    }
}

/// Retrieves artifacts and materializes them at a target path
pub struct Fetcher {
    transport: Box<dyn Transport>,
    image_tool: String,
    arch: Arch,
}

impl Fetcher {
    /// Create a fetcher using HTTP for remote artifacts
    pub fn new(ctx: &Context) -> Self {
        Self::with_transport(ctx, Box::new(HttpTransport::new(&ctx.fetch)))
    }

    /// Create a fetcher with a custom transport
    pub fn with_transport(ctx: &Context, transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            image_tool: ctx.fetch.image_tool.clone(),
            arch: ctx.arch.clone(),
        }
    }

    /// Fetch `location` to `target`.
    ///
    /// Does nothing if `target` already exists. Archives are unpacked
    /// according to their [`Extraction`] policy, and the result is renamed
    /// into place only once complete. Image sources are best-effort: if the
    /// image can't be pulled this logs and returns `Ok`.
    pub fn fetch(&self, location: &str, target: &Path) -> Result<(), Error> {
        if target.exists() {
            debug!("{} already exists, skipping download", target.display());
            return Ok(());
        }

        let parent = parent_dir(target);
        fs::create_dir_all(parent)?;

        info!("Downloading {} to {}...", location, target.display());

        let file_name = url_file_name(location);
        let download_dir = tempfile::tempdir()?;
        let download_path = download_dir.path().join(&file_name);

        match Source::parse(location)? {
            Source::Image(image) => {
                return image::fetch(&self.image_tool, &self.arch, &image, target);
            }
            Source::Http(url) => {
                let mut file = File::create(&download_path)?;
                self.transport.download(url.as_str(), &mut file)?;
                file.sync_all()?;
            }
            Source::Local(path) => {
                fs::copy(&path, &download_path).map_err(|e| {
                    format_err!(FetchFailed, "couldn't copy {}: {}", path.display(), e)
                })?;
            }
        }

        let policy = Extraction::for_file_name(&file_name);
        debug!("extracting {} with {:?}", file_name, policy);
        policy.extract(&download_path, target)
    }

    /// Read the resource at `location` fully into memory
    pub fn read_url(&self, location: &str) -> Result<Vec<u8>, Error> {
        match Source::parse(location)? {
            Source::Http(url) => {
                let mut body = vec![];
                self.transport.download(url.as_str(), &mut body)?;
                Ok(body)
            }
            Source::Local(path) => Ok(fs::read(path)?),
            Source::Image(image) => fail!(FetchFailed, "can't read image as a document: {}", image),
        }
    }
}

/// File name of a URL or path, ignoring any query string or fragment.
///
/// Signed download URLs carry query parameters that must not leak into the
/// name of the downloaded file.
pub fn url_file_name(location: &str) -> String {
    let path = location.split(['?', '#']).next().unwrap_or_default();

    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("download")
        .to_owned()
}

/// Parent directory of a target path (`.` for bare file names)
pub(crate) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
