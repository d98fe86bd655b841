//! Error types

use abscissa_core::error::{BoxError, Context};
use std::{
    fmt::{self, Display},
    io,
    ops::Deref,
};
use thiserror::Error;

/// Kinds of errors
#[derive(Copy, Clone, Eq, PartialEq, Debug, Error)]
pub enum ErrorKind {
    /// Running on an OS/machine combination with no known architecture key
    #[error("architecture unresolved")]
    ArchitectureUnresolved,

    /// Error in configuration file
    #[error("config error")]
    ConfigError,

    /// Downloading or extracting an artifact failed
    #[error("fetch failed")]
    FetchFailed,

    /// Input/output error
    #[error("I/O error")]
    IoError,

    /// Daemon binary absent after installation
    #[error("missing binary")]
    MissingBinary,

    /// Parse error
    #[error("parse error")]
    ParseError,

    /// Chain metadata could not be retrieved
    #[error("registry unavailable")]
    RegistryUnavailable,

    /// Node status could not be read
    #[error("status error")]
    StatusError,

    /// No registry version matched the selection
    #[error("version not found")]
    VersionNotFound,
}

impl ErrorKind {
    /// Create an error context from this error
    pub fn context(self, source: impl Into<BoxError>) -> Context<ErrorKind> {
        Context::new(self, Some(source.into()))
    }
}

/// Error type
#[derive(Debug)]
pub struct Error(Box<Context<ErrorKind>>);

impl Error {
    /// Get the kind of error
    pub fn kind(&self) -> ErrorKind {
        *self.0.kind()
    }
}

impl Deref for Error {
    type Target = Context<ErrorKind>;

    fn deref(&self) -> &Context<ErrorKind> {
        &self.0
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Context::new(kind, None).into()
    }
}

impl From<Context<ErrorKind>> for Error {
    fn from(context: Context<ErrorKind>) -> Self {
        Error(Box::new(context))
    }
}

impl From<io::Error> for Error {
    fn from(other: io::Error) -> Self {
        ErrorKind::IoError.context(other).into()
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(other: tempfile::PersistError) -> Self {
        ErrorKind::IoError.context(other.error).into()
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<serde_json::error::Error> for Error {
    fn from(other: serde_json::error::Error) -> Self {
        ErrorKind::ParseError.context(other).into()
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(other: serde_yaml::Error) -> Self {
        ErrorKind::ParseError.context(other).into()
    }
}

impl From<ureq::Error> for Error {
    fn from(other: ureq::Error) -> Self {
        ErrorKind::FetchFailed.context(other).into()
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(other: zip::result::ZipError) -> Self {
        ErrorKind::FetchFailed.context(other).into()
    }
}
