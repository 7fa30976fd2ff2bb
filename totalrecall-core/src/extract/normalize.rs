//! Image name normalization
//!
//! Image store entries are written without an extension. Appending `.jpg`
//! makes them open in ordinary viewers. Only names are inspected, never
//! file contents.

use crate::error::{Error, Result};
use crate::types::NormalizeStats;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::Path;

/// Suffix every normalized entry ends with (case-sensitive).
pub const IMAGE_SUFFIX: &str = ".jpg";

fn has_image_suffix(name: &OsStr) -> bool {
    name.as_encoded_bytes().ends_with(IMAGE_SUFFIX.as_bytes())
}

/// Append [`IMAGE_SUFFIX`] to every entry of `directory` lacking it.
///
/// Non-recursive. The listing is collected before any rename, so renamed
/// entries are not visited twice. If the suffixed name is already taken the
/// entry is left as-is and counted as a collision.
pub fn normalize(directory: &Path) -> Result<NormalizeStats> {
    let map_err = |e: io::Error| {
        Error::Io(io::Error::new(
            e.kind(),
            format!("failed to read image store {}: {}", directory.display(), e),
        ))
    };

    let names = fs::read_dir(directory)
        .map_err(map_err)?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect::<io::Result<Vec<OsString>>>()
        .map_err(map_err)?;

    let mut stats = NormalizeStats::default();
    for name in names {
        if has_image_suffix(&name) {
            stats.already_normalized += 1;
            continue;
        }

        let old_path = directory.join(&name);
        let mut new_name = name.clone();
        new_name.push(IMAGE_SUFFIX);
        let new_path = directory.join(&new_name);

        if new_path.exists() {
            tracing::warn!(
                entry = %old_path.display(),
                "Normalized name already exists, leaving entry unrenamed"
            );
            stats.collisions += 1;
            continue;
        }

        fs::rename(&old_path, &new_path).map_err(|e| {
            Error::Io(io::Error::new(
                e.kind(),
                format!("failed to rename {}: {}", old_path.display(), e),
            ))
        })?;
        stats.renamed += 1;
    }

    tracing::info!(
        directory = %directory.display(),
        renamed = stats.renamed,
        already_normalized = stats.already_normalized,
        collisions = stats.collisions,
        "Normalized image names"
    );
    Ok(stats)
}
