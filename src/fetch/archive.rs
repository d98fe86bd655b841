//! Extraction policies for downloaded artifacts

use super::parent_dir;
use crate::{
    error::{Error, ErrorKind::*},
    prelude::*,
};
use flate2::read::GzDecoder;
use std::{
    fs::File,
    io::{self, BufReader, Read, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

/// How the target file is obtained from a downloaded artifact
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Extraction {
    /// Copy the download byte-for-byte
    Raw,

    /// Gzipped tarball: the first regular file whose path ends with the
    /// target file name, or whose file name starts with it
    SuffixMatch,

    /// Zip archive: the first non-directory entry, whatever its name
    SingleEntryArchive,

    /// Uncompressed tarball: the first regular file named exactly like the
    /// target file
    ExactMemberName,
}

impl Extraction {
    /// Policy for a downloaded file, chosen by its extension
    pub fn for_file_name(name: &str) -> Self {
        if name.ends_with(".tar.gz") {
            Extraction::SuffixMatch
        } else if name.ends_with(".zip") {
            Extraction::SingleEntryArchive
        } else {
            Extraction::Raw
        }
    }

    /// Extract `target`'s content from `archive`.
    ///
    /// The content is staged next to `target` and renamed into place, so
    /// `target` only ever appears complete.
    pub fn extract(self, archive: &Path, target: &Path) -> Result<(), Error> {
        let name = target
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| format_err!(FetchFailed, "invalid target path: {}", target.display()))?
            .to_owned();

        let file = File::open(archive)?;
        let mut staged = NamedTempFile::new_in(parent_dir(target))?;

        let member = match self {
            Extraction::Raw => {
                io::copy(&mut BufReader::new(file), staged.as_file_mut())?;
                None
            }
            Extraction::SuffixMatch => {
                let mut tar = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
                let found = copy_member(
                    &mut tar,
                    |path| suffix_match(path, &name),
                    staged.as_file_mut(),
                )
                .map_err(|e| unreadable(archive, e))?;
                Some(found.ok_or_else(|| not_found(archive, &name))?)
            }
            Extraction::ExactMemberName => {
                let mut tar = tar::Archive::new(BufReader::new(file));
                let found = copy_member(
                    &mut tar,
                    |path| exact_match(path, &name),
                    staged.as_file_mut(),
                )
                .map_err(|e| unreadable(archive, e))?;
                Some(found.ok_or_else(|| not_found(archive, &name))?)
            }
            Extraction::SingleEntryArchive => {
                let found = copy_first_zip_entry(file, staged.as_file_mut())?;
                Some(found.ok_or_else(|| not_found(archive, &name))?)
            }
        };

        if let Some(member) = member {
            info!("Extracted {} to {}", member.display(), target.display());
        }

        staged.as_file().sync_all()?;
        staged.persist(target)?;
        Ok(())
    }
}

/// Copy the first regular file in `archive` accepted by `matches` into `out`
pub(super) fn copy_member<R: Read>(
    archive: &mut tar::Archive<R>,
    matches: impl Fn(&Path) -> bool,
    out: &mut dyn Write,
) -> io::Result<Option<PathBuf>> {
    for entry in archive.entries()? {
        let mut entry = entry?;

        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry.path()?.into_owned();

        if matches(&path) {
            io::copy(&mut entry, out)?;
            return Ok(Some(path));
        }
    }

    Ok(None)
}

/// Copy the first non-directory zip entry into `out`.
///
/// Archives with several files are not disambiguated by name.
fn copy_first_zip_entry(file: File, out: &mut dyn Write) -> Result<Option<PathBuf>, Error> {
    let mut zip = zip::ZipArchive::new(BufReader::new(file))?;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;

        if entry.is_dir() {
            continue;
        }

        let name = PathBuf::from(entry.name());
        io::copy(&mut entry, out)?;
        return Ok(Some(name));
    }

    Ok(None)
}

fn suffix_match(path: &Path, name: &str) -> bool {
    let file_name = path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or_default();

    path.to_string_lossy().ends_with(name) || file_name.starts_with(name)
}

pub(super) fn exact_match(path: &Path, name: &str) -> bool {
    path.file_name().and_then(|f| f.to_str()) == Some(name)
}

fn not_found(archive: &Path, name: &str) -> Error {
    format_err!(
        FetchFailed,
        "no member matching `{}` in {}",
        name,
        archive.display()
    )
    .into()
}

fn unreadable(archive: &Path, e: io::Error) -> Error {
    format_err!(FetchFailed, "error reading {}: {}", archive.display(), e).into()
}
