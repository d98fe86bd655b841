//! Architecture keys (`<os>/<arch>`) used to select binaries

use crate::error::{Error, ErrorKind::*};
use crate::prelude::*;
use std::{
    fmt::{self, Display},
    str::FromStr,
};

/// Prefix of the container-image fallback key (e.g. `docker/linux/amd64`)
pub const DOCKER_PREFIX: &str = "docker/";

/// Architecture key of the host running the node
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Arch {
    os: String,
    machine: String,
}

impl Arch {
    /// Detect the architecture of the running host
    pub fn detect() -> Result<Self, Error> {
        let os = std::env::consts::OS;
        let machine = std::env::consts::ARCH;
        debug!("OS: {}, machine: {}", os, machine);

        Self::from_os_machine(os, machine).ok_or_else(|| {
            format_err!(
                ArchitectureUnresolved,
                "unsupported machine `{}` on `{}`",
                machine,
                os
            )
            .into()
        })
    }

    /// Build an architecture key from an OS name and a machine name.
    ///
    /// Registries key Apple binaries as `darwin/...`, so `macos` (the Rust
    /// name for that OS) is renamed. Returns `None` for machine names that
    /// have no normalized form.
    pub fn from_os_machine(os: &str, machine: &str) -> Option<Self> {
        let machine = match machine {
            "arm64" | "aarch64" => "arm64",
            "x86_64" | "amd64" => "amd64",
            _ => return None,
        };

        let os = match os.to_lowercase().as_str() {
            "macos" => "darwin".to_owned(),
            other => other.to_owned(),
        };

        Some(Self {
            os,
            machine: machine.to_owned(),
        })
    }

    /// Lowercased OS name
    pub fn os(&self) -> &str {
        &self.os
    }

    /// Normalized machine name (`amd64` or `arm64`)
    pub fn machine(&self) -> &str {
        &self.machine
    }

    /// Key of the container-image fallback entry
    pub fn docker_key(&self) -> String {
        format!("{}{}", DOCKER_PREFIX, self)
    }
}

impl Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.machine)
    }
}

impl FromStr for Arch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        s.split_once('/')
            .and_then(|(os, machine)| Self::from_os_machine(os, machine))
            .ok_or_else(|| format_err!(ArchitectureUnresolved, "invalid arch key `{}`", s).into())
    }
}
