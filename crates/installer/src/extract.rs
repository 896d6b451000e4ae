//! Archive extraction into an install path.
//!
//! Archives are unpacked into a hidden sibling directory first and renamed into
//! place only on success, so a failed extraction never leaves a partial
//! install behind. When an archive wraps everything in one top-level
//! directory, that directory's contents become the install path's contents.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;

use flate2::read::GzDecoder;
use picoup_core::{ArchiveType, Error, Result};
use tar::Archive;
use tracing::{debug, trace};

/// Sibling path with a hidden name and `suffix`, e.g. `cmake/.v3.31.5.tmp`.
pub(crate) fn sibling(dest: &Path, suffix: &str) -> PathBuf {
    let name = dest
        .file_name()
        .map_or_else(|| "install".to_string(), |n| n.to_string_lossy().into_owned());
    dest.with_file_name(format!(".{name}.{suffix}"))
}

/// Whether the installer can unpack this archive type.
#[must_use]
pub fn is_supported(kind: ArchiveType) -> bool {
    !matches!(kind, ArchiveType::Pkg | ArchiveType::Unknown)
}

/// Unpack `archive` of type `kind` so that its contents end up at `dest`.
///
/// Any existing directory at `dest` is replaced.
///
/// # Errors
///
/// - [`Error::UnsupportedArchive`] for `pkg` and unrecognised archives
/// - [`Error::ExtractionFailed`] when the archive is corrupt
/// - [`Error::CommandFailed`] when the system `tar` rejects an xz/bz2 archive
/// - [`Error::Io`] on filesystem failures
pub fn unpack(archive: &Path, kind: ArchiveType, dest: &Path) -> Result<()> {
    if !is_supported(kind) {
        return Err(Error::unsupported_archive(
            kind.as_str(),
            archive.display().to_string(),
        ));
    }

    let staging = sibling(dest, "tmp");
    if staging.exists() {
        std::fs::remove_dir_all(&staging)?;
    }
    std::fs::create_dir_all(&staging)?;

    let unpacked = match kind {
        ArchiveType::Zip => unpack_zip(archive, &staging),
        ArchiveType::TarGz => unpack_tar_gz(archive, &staging),
        _ => unpack_with_system_tar(archive, &staging),
    };
    if let Err(e) = unpacked.and_then(|()| move_into_place(&staging, dest)) {
        let _ = std::fs::remove_dir_all(&staging);
        return Err(e);
    }
    if staging.exists() {
        std::fs::remove_dir_all(&staging)?;
    }

    debug!(archive = %archive.display(), dest = %dest.display(), %kind, "Extracted");
    Ok(())
}

fn unpack_zip(archive: &Path, into: &Path) -> Result<()> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| Error::extraction_failed(archive.display().to_string(), e.to_string()))?;
    zip.extract(into)
        .map_err(|e| Error::extraction_failed(archive.display().to_string(), e.to_string()))
}

fn unpack_tar_gz(archive: &Path, into: &Path) -> Result<()> {
    let file = File::open(archive)?;
    let mut tar = Archive::new(GzDecoder::new(file));
    tar.set_preserve_permissions(true);
    tar.unpack(into)
        .map_err(|e| Error::extraction_failed(archive.display().to_string(), e.to_string()))
}

/// xz and bzip2 tarballs go through the host's `tar`, which both supported
/// platforms ship with.
fn unpack_with_system_tar(archive: &Path, into: &Path) -> Result<()> {
    let mut command = Command::new("tar");
    command.arg("-xf").arg(archive).arg("-C").arg(into);
    trace!(?command, "Running system tar");

    let output = command.output()?;
    if output.status.success() {
        Ok(())
    } else {
        Err(Error::command_failed(
            format!("tar -xf {} -C {}", archive.display(), into.display()),
            output.status.to_string(),
            String::from_utf8_lossy(&output.stderr).trim(),
        ))
    }
}

/// The directory whose contents should become the install path.
fn content_root(staging: &Path) -> Result<PathBuf> {
    let mut entries = std::fs::read_dir(staging)?.collect::<std::io::Result<Vec<_>>>()?;
    if entries.len() == 1 && entries[0].file_type()?.is_dir() {
        if let Some(only) = entries.pop() {
            trace!(dir = %only.path().display(), "Flattening single top-level directory");
            return Ok(only.path());
        }
    }
    Ok(staging.to_path_buf())
}

fn move_into_place(staging: &Path, dest: &Path) -> Result<()> {
    let source = content_root(staging)?;
    if dest.exists() {
        std::fs::remove_dir_all(dest)?;
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::rename(&source, dest)?;
    Ok(())
}
