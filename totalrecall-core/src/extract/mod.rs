//! Copying the store out to an extraction folder
//!
//! The source store may still be open by its owning process. Nothing here
//! coordinates with that writer: the copy is a plain byte stream, so a copy
//! taken mid-write can be torn.

pub mod normalize;

pub use normalize::{normalize, IMAGE_SUFFIX};

use crate::error::{Error, Result};
use crate::format::extraction_folder_name;
use crate::types::{CopyStats, ExtractionTarget};
use chrono::{DateTime, TimeZone};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// SQLite files that may sit next to a live database.
const DATABASE_SIDECAR_SUFFIXES: &[&str] = &["-wal", "-shm", "-journal"];

/// Upper bound on `-N` suffixes tried when the extraction folder name is taken.
const MAX_TARGET_ATTEMPTS: usize = 100;

fn io_at(path: &Path, err: io::Error) -> Error {
    Error::Io(io::Error::new(
        err.kind(),
        format!("{}: {}", path.display(), err),
    ))
}

/// Create a fresh, uniquely named extraction folder under `output_dir`.
///
/// The folder is named after `now`; if that name exists, `-2`, `-3`, ... are
/// appended until an unused name is found.
pub fn create_target<Tz: TimeZone>(output_dir: &Path, now: &DateTime<Tz>) -> Result<ExtractionTarget>
where
    Tz::Offset: std::fmt::Display,
{
    fs::create_dir_all(output_dir).map_err(|e| io_at(output_dir, e))?;

    let base_name = extraction_folder_name(now);
    for attempt in 1..=MAX_TARGET_ATTEMPTS {
        let name = if attempt == 1 {
            base_name.clone()
        } else {
            format!("{}-{}", base_name, attempt)
        };
        let root = output_dir.join(name);

        match fs::create_dir(&root) {
            Ok(()) => {
                tracing::info!(folder = %root.display(), "Created extraction folder");
                return Ok(ExtractionTarget::under(root));
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(io_at(&root, e)),
        }
    }

    Err(Error::Io(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!(
            "no free extraction folder name for {} under {}",
            base_name,
            output_dir.display()
        ),
    )))
}

/// Stream `src` into `dst`, truncating `dst` if present.
///
/// Permission bits are copied after the data. Returns the number of bytes
/// written. A size mismatch against the length seen at open time is logged
/// but not treated as an error, since the source may be a live database.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64> {
    let mut reader = File::open(src).map_err(|e| io_at(src, e))?;
    let metadata = reader.metadata().map_err(|e| io_at(src, e))?;

    let mut writer = File::create(dst).map_err(|e| io_at(dst, e))?;
    let copied = io::copy(&mut reader, &mut writer).map_err(|e| io_at(src, e))?;
    writer.flush().map_err(|e| io_at(dst, e))?;
    drop(writer);

    fs::set_permissions(dst, metadata.permissions()).map_err(|e| io_at(dst, e))?;

    if copied != metadata.len() {
        tracing::warn!(
            src = %src.display(),
            expected = metadata.len(),
            copied,
            "Source size changed during copy"
        );
    }

    tracing::debug!(src = %src.display(), dst = %dst.display(), bytes = copied, "Copied file");
    Ok(copied)
}

/// Permission bits of copied directories, held back until the copy is done
/// being modified.
///
/// A read-only source directory yields a read-only copy once these are
/// applied, so anything that renames or adds entries must run first.
#[must_use = "directory permissions are only copied once applied"]
#[derive(Debug, Default)]
pub struct DirectoryModes {
    pending: Vec<(PathBuf, fs::Permissions)>,
}

impl DirectoryModes {
    /// Set each directory's source permissions, deepest directory first.
    pub fn apply(self) -> Result<()> {
        for (dir, permissions) in self.pending.into_iter().rev() {
            fs::set_permissions(&dir, permissions).map_err(|e| io_at(&dir, e))?;
        }
        Ok(())
    }
}

/// Recursively copy the tree at `src` to `dst_root`.
///
/// Depth-first in name order; the first failing entry aborts the walk and already-copied
/// entries are left in place. Directories are created writable; their
/// source permissions are returned for the caller to apply.
pub fn copy_directory(src: &Path, dst_root: &Path) -> Result<(CopyStats, DirectoryModes)> {
    let mut stats = CopyStats::default();
    let mut modes = DirectoryModes::default();

    for entry in WalkDir::new(src).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src).map_err(|_| {
            Error::Io(io::Error::other(format!(
                "{} is outside {}",
                entry.path().display(),
                src.display()
            )))
        })?;
        let target = dst_root.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| io_at(&target, e))?;
            modes.pending.push((target, entry.metadata()?.permissions()));
            stats.directories += 1;
        } else {
            stats.bytes += copy_file(entry.path(), &target)?;
            stats.files += 1;
        }
    }

    tracing::info!(
        src = %src.display(),
        dst = %dst_root.display(),
        files = stats.files,
        directories = stats.directories,
        bytes = stats.bytes,
        "Copied directory tree"
    );
    Ok((stats, modes))
}

fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Copy a SQLite database along with any `-wal`/`-shm`/`-journal` files
/// next to it.
pub fn copy_database(src: &Path, dst: &Path) -> Result<CopyStats> {
    let mut stats = CopyStats {
        files: 1,
        directories: 0,
        bytes: copy_file(src, dst)?,
    };

    for suffix in DATABASE_SIDECAR_SUFFIXES {
        let sidecar = sidecar_path(src, suffix);
        if !sidecar.is_file() {
            continue;
        }
        let copied = copy_file(&sidecar, &sidecar_path(dst, suffix))?;
        stats.absorb(CopyStats {
            files: 1,
            directories: 0,
            bytes: copied,
        });
    }

    Ok(stats)
}
