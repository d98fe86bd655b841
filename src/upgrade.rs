//! Installing versions into the upgrade manager directory tree:
//!
//! ```text
//! <daemon_home>/cosmovisor/
//! ├── current -> upgrades/<name>
//! ├── genesis -> upgrades/<name>
//! └── upgrades/<name>/
//!     ├── bin/<daemon_name>
//!     ├── lib/*
//!     └── upgrade-info.json
//! ```

mod info;

pub use self::info::{InfoSource, UpgradeInfo, DEFAULT_UPGRADE_TIME};

use crate::{
    codebase::CodebaseData,
    context::{Context, UPGRADE_INFO_FILE},
    error::{Error, ErrorKind::*},
    fetch::{self, Fetcher},
    prelude::*,
    resolver::ResolvedVersion,
};
use std::{
    fs, io,
    os::unix::fs::{symlink, PermissionsExt},
    path::{Path, PathBuf},
};

/// Filesystem permissions for installed binaries and libraries
pub const EXECUTABLE_PERMISSIONS: u32 = 0o755;

/// Result of a successful installation
#[derive(Clone, Debug)]
pub struct Installation {
    /// Upgrade name
    pub name: String,

    /// Upgrade directory
    pub dir: PathBuf,

    /// Installed daemon binary
    pub binary: PathBuf,

    /// Number of libraries that failed to download
    pub library_errors: usize,
}

/// Installs resolved versions for one context
pub struct Installer<'a> {
    ctx: &'a Context,
    fetcher: &'a Fetcher,
}

impl<'a> Installer<'a> {
    /// Create an installer
    pub fn new(ctx: &'a Context, fetcher: &'a Fetcher) -> Self {
        Self { ctx, fetcher }
    }

    /// Install `version` into its upgrade directory.
    ///
    /// Every step is skipped if its result is already on disk, so this may
    /// be re-run after a partial failure. `current` is repointed only when
    /// `link_current` is set; `genesis` is created by the first successful
    /// install and never changed afterwards.
    pub fn install(
        &self,
        version: &ResolvedVersion,
        link_current: bool,
    ) -> Result<Installation, Error> {
        if version.name.is_empty() {
            fail!(VersionNotFound, "refusing to install a version without a name");
        }

        let dir = self.ctx.upgrade_dir(&version.name);
        let binary = self.ctx.binary_path(&dir);

        info!("Found version {}, checking for {}...", version.name, dir.display());
        fs::create_dir_all(self.ctx.upgrades_dir())?;
        fs::create_dir_all(&dir)?;

        if let Some(url) = &version.binary_url {
            self.fetcher.fetch(url, &binary)?;

            if binary.exists() {
                set_executable(&binary)?;
            }
        }

        let library_errors = self.install_libraries(version, &dir.join("lib"));

        if !binary.exists() {
            fail!(MissingBinary, "binary {} not found", binary.display());
        }

        info!("Successfully added binary {}", binary.display());

        if let Some(height) = version.height.filter(|h| *h >= 1) {
            let info = UpgradeInfo::for_version(version, &self.ctx.arch, height)?;

            if info.write_new(&dir.join(UPGRADE_INFO_FILE))? {
                info!("Set upgrade height of {} to {}", version.name, height);
            }
        }

        if link_current {
            repoint_link(&self.ctx.current_link(), &dir)?;
        }

        let genesis = self.ctx.genesis_link();
        if fs::symlink_metadata(&genesis).is_err() {
            repoint_link(&genesis, &dir)?;
        }

        Ok(Installation {
            name: version.name.clone(),
            dir,
            binary,
            library_errors,
        })
    }

    /// Install every version of the codebase without touching `current`,
    /// then the codebase's global libraries.
    ///
    /// Versions with no binary for this architecture are skipped.
    pub fn install_all(&self, codebase: &CodebaseData) -> Result<Vec<Installation>, Error> {
        let mut installed = vec![];

        for descriptor in &codebase.versions {
            let version = ResolvedVersion::from_descriptor(codebase, descriptor, &self.ctx.arch);

            if version.binary_url.is_none() {
                warn!(
                    "skipping {}: no binary for {}",
                    descriptor.name, self.ctx.arch
                );
                continue;
            }

            installed.push(self.install(&version, false)?);
        }

        let failures = self.install_global_libraries(codebase);
        if failures > 0 {
            warn!("{} global libraries could not be downloaded", failures);
        }

        Ok(installed)
    }

    /// Fetch the codebase's global libraries into the library directory,
    /// returning the number of failures
    pub fn install_global_libraries(&self, codebase: &CodebaseData) -> usize {
        let mut failures = 0;

        for (name, url) in codebase.libraries.for_arch(&self.ctx.arch) {
            let target = self.ctx.library_dir.join(&name);
            info!("Downloading library {}...", url);

            if let Err(e) = self.fetcher.fetch(&url, &target) {
                error!("couldn't download library {}: {}", url, e);
                failures += 1;
            }
        }

        failures
    }

    fn install_libraries(&self, version: &ResolvedVersion, lib_dir: &Path) -> usize {
        let mut errors = 0;

        for (name, url) in &version.libraries {
            let target = lib_dir.join(name);
            info!("Downloading library {}...", url);

            let result = self
                .fetcher
                .fetch(url, &target)
                .and_then(|()| set_executable(&target));

            if let Err(e) = result {
                error!("couldn't install library {} for {}: {}", name, version.name, e);
                errors += 1;
            }
        }

        errors
    }
}

/// Copy the upgrades shipped under `<seed_dir>/upgrades` into `upgrades_dir`.
///
/// Upgrades already present in `upgrades_dir` are left untouched. Each new
/// one is copied under a temporary name and renamed into place. Returns the
/// names of the upgrades copied.
pub fn seed_upgrades(seed_dir: &Path, upgrades_dir: &Path) -> Result<Vec<String>, Error> {
    let source = seed_dir.join("upgrades");

    if !source.is_dir() {
        debug!("no upgrades to seed from {}", source.display());
        return Ok(vec![]);
    }

    fs::create_dir_all(upgrades_dir)?;

    let mut entries = fs::read_dir(&source)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut seeded = vec![];

    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();

        if name.starts_with('.') || !entry.file_type()?.is_dir() {
            continue;
        }

        let target = upgrades_dir.join(&name);
        if fs::symlink_metadata(&target).is_ok() {
            debug!("{} already exists, not seeding", target.display());
            continue;
        }

        let staged = upgrades_dir.join(format!(".{}.seed", name));
        if fs::symlink_metadata(&staged).is_ok() {
            fs::remove_dir_all(&staged)?;
        }

        info!("Seeding {} from {}...", name, entry.path().display());
        copy_tree(&entry.path(), &staged)?;
        fs::rename(&staged, &target)?;
        seeded.push(name);
    }

    Ok(seeded)
}

/// Recursively copy a directory, preserving file modes and symlinks
fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;

    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let dest = to.join(entry.file_name());
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            copy_tree(&entry.path(), &dest)?;
        } else if file_type.is_symlink() {
            symlink(fs::read_link(entry.path())?, &dest)?;
        } else {
            fs::copy(entry.path(), &dest)?;
        }
    }

    Ok(())
}

/// Point the symlink at `link` to `target`.
///
/// The new link is created under a temporary name and renamed over `link`,
/// so an existing symlink is replaced atomically. A real directory at `link`
/// is removed first; a crash at that point leaves no link at all.
pub fn repoint_link(link: &Path, target: &Path) -> Result<(), Error> {
    if let Ok(existing) = fs::read_link(link) {
        if existing == target {
            debug!("{} already points to {}", link.display(), target.display());
            return Ok(());
        }
    }

    let link_name = link
        .file_name()
        .ok_or_else(|| format_err!(IoError, "invalid link path: {}", link.display()))?;
    let staged = fetch::parent_dir(link).join(format!(".{}.new", link_name.to_string_lossy()));

    match fs::remove_file(&staged) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
        _ => (),
    }

    symlink(target, &staged)?;

    if let Ok(metadata) = fs::symlink_metadata(link) {
        if metadata.is_dir() {
            info!("Removing existing {}...", link.display());
            fs::remove_dir_all(link)?;
        }
    }

    info!("Linking {} to {}...", link.display(), target.display());
    fs::rename(&staged, link)?;
    Ok(())
}

fn set_executable(path: &Path) -> Result<(), Error> {
    fs::set_permissions(path, fs::Permissions::from_mode(EXECUTABLE_PERMISSIONS)).map_err(|e| {
        format_err!(
            IoError,
            "couldn't set permissions on `{}`: {}",
            path.display(),
            e
        )
        .into()
    })
}
