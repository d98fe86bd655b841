//! Extracting binaries from container images.
//!
//! The image is copied to a `docker-archive` tarball with an external tool
//! (`skopeo` by default), then every layer is scanned for the target file,
//! since the layer that owns it isn't known in advance.

use super::{
    archive::{copy_member, exact_match},
    parent_dir,
};
use crate::{arch::Arch, error::Error, prelude::*};
use flate2::read::GzDecoder;
use std::{
    fs::File,
    io::{self, BufRead, BufReader, Read, Seek, SeekFrom},
    path::Path,
    process::{Command, Stdio},
};
use tempfile::NamedTempFile;

/// Magic bytes at the start of a gzip stream
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Pull `image` and extract the file named like `target` from its layers.
///
/// Best effort: when the image can't be found, pulled, or doesn't contain
/// the file, this logs and returns `Ok` without creating `target`.
pub fn fetch(tool: &str, arch: &Arch, image: &str, target: &Path) -> Result<(), Error> {
    let name = match target.file_name().and_then(|f| f.to_str()) {
        Some(name) => name.to_owned(),
        None => {
            warn!("invalid target path for image {}: {}", image, target.display());
            return Ok(());
        }
    };

    info!("Checking for {}...", image);
    if let Err(e) = run(tool, &image_args("inspect", arch, &[image])) {
        warn!("the image {} could not be found: {}", image, e);
        return Ok(());
    }

    let workdir = tempfile::tempdir()?;
    let image_tar = workdir.path().join("image.tar");
    let destination = format!("docker-archive:{}", image_tar.display());

    info!("Downloading {}...", image);
    if let Err(e) = run(tool, &image_args("copy", arch, &[image, &destination])) {
        warn!("failed to download the image {}: {}", image, e);
        return Ok(());
    }

    let mut staged = NamedTempFile::new_in(parent_dir(target))?;

    match find_in_layers(&image_tar, &name, staged.as_file_mut()) {
        Ok(true) => {
            staged.persist(target)?;
            info!("Successfully extracted {} from {}", name, image);
        }
        Ok(false) => warn!("{} not found in any layer of {}", name, image),
        Err(e) => warn!("failed to extract {} from {}: {}", name, image, e),
    }

    Ok(())
}

/// Arguments for an image tool subcommand, pinned to the host platform
fn image_args<'a>(subcommand: &'a str, arch: &'a Arch, rest: &[&'a str]) -> Vec<String> {
    let mut args = vec![
        subcommand.to_owned(),
        format!("--override-os={}", arch.os()),
        format!("--override-arch={}", arch.machine()),
    ];
    args.extend(rest.iter().map(|arg| arg.to_string()));
    args
}

fn run(tool: &str, args: &[String]) -> io::Result<()> {
    debug!("running {} {}", tool, args.join(" "));

    let output = Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .output()?;

    if output.status.success() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::Other,
            format!(
                "{} exited with {}: {}",
                tool,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ))
    }
}

/// Scan each layer tarball inside an image archive for a file called `name`
fn find_in_layers(image_tar: &Path, name: &str, out: &mut File) -> io::Result<bool> {
    let mut image = tar::Archive::new(BufReader::new(File::open(image_tar)?));

    for entry in image.entries()? {
        let entry = entry?;
        let layer = entry.path()?.into_owned();

        if !entry.header().entry_type().is_file() || !is_layer(&layer) {
            continue;
        }

        debug!("checking {} for {}...", layer.display(), name);

        let mut reader = BufReader::new(entry);
        let gzipped = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
        let layer_reader: Box<dyn Read + '_> = if gzipped {
            Box::new(GzDecoder::new(reader))
        } else {
            Box::new(reader)
        };

        match copy_member(&mut tar::Archive::new(layer_reader), |p| exact_match(p, name), out) {
            Ok(Some(path)) => {
                info!("Found {} in {}", path.display(), layer.display());
                return Ok(true);
            }
            Ok(None) => continue,
            // Non-tar blobs (image configs) land here
            Err(e) => {
                debug!("skipping {}: {}", layer.display(), e);
                out.set_len(0)?;
                out.seek(SeekFrom::Start(0))?;
            }
        }
    }

    Ok(false)
}

/// Layers are `<digest>.tar` (`docker-archive`) or `blobs/...` (OCI)
fn is_layer(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "tar") || path.starts_with("blobs")
}
