//! Locating the Recall store on disk
//!
//! The store lives under a per-user root:
//!
//! ```text
//! <users_root>\<user>\AppData\Local\CoreAIPlatform.00\UKP\
//! └── {GUID}\
//!     ├── ukg.db
//!     └── ImageStore\
//! ```
//!
//! The GUID folder name differs per installation, so it is discovered rather
//! than configured.

pub mod permissions;

pub use permissions::{IcaclsGranter, NoopGranter, PermissionGranter};

use crate::error::{Error, Result};
use crate::types::{Artifact, SourceLocation, DATABASE_FILE_NAME, IMAGE_STORE_DIR_NAME};
use std::path::{Component, Path, PathBuf};

/// Path segments from a user's profile directory to the store root.
const STORE_ROOT_SEGMENTS: &[&str] = &["AppData", "Local", "CoreAIPlatform.00", "UKP"];

/// How the GUID folder is picked when more than one directory exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Sort candidate names before picking the first one
    pub sort_subfolders: bool,
}

/// Derive the store root for `username` under `users_root`.
pub fn base_path_for_user(users_root: &Path, username: &str) -> Result<PathBuf> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::Config("username must not be empty".to_string()));
    }

    let mut components = Path::new(username).components();
    let is_plain_name = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !username.contains(['/', '\\']);
    if !is_plain_name {
        return Err(Error::Config(format!(
            "username {:?} is not a plain profile name",
            username
        )));
    }

    let mut path = users_root.join(username);
    for segment in STORE_ROOT_SEGMENTS {
        path.push(segment);
    }
    Ok(path)
}

/// Find the GUID folder under `base_path`.
///
/// Returns the first directory in listing order, or in name order when
/// `options.sort_subfolders` is set. Listing order is whatever the OS yields,
/// so with several directories present the choice is not stable.
pub fn resolve_subfolder(base_path: &Path, options: ResolveOptions) -> Result<String> {
    let entries = std::fs::read_dir(base_path).map_err(|e| {
        Error::NotFound(format!(
            "could not list base path {}: {}",
            base_path.display(),
            e
        ))
    })?;

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !options.sort_subfolders {
            tracing::debug!(subfolder = %name, "Using first directory in listing order");
            return Ok(name);
        }
        candidates.push(name);
    }

    candidates.sort();
    if candidates.len() > 1 {
        tracing::warn!(
            count = candidates.len(),
            chosen = %candidates[0],
            "Multiple candidate GUID folders found"
        );
    }

    candidates.into_iter().next().ok_or_else(|| {
        Error::NotFound(format!(
            "could not find the GUID folder under {}",
            base_path.display()
        ))
    })
}

/// Check that both store artifacts exist.
pub fn validate(database_path: &Path, image_store_path: &Path) -> Result<()> {
    if !database_path.exists() {
        return Err(Error::MissingArtifact {
            artifact: Artifact::Database,
            path: database_path.to_path_buf(),
        });
    }
    if !image_store_path.is_dir() {
        return Err(Error::MissingArtifact {
            artifact: Artifact::ImageStore,
            path: image_store_path.to_path_buf(),
        });
    }
    Ok(())
}

/// Check that the store root exists.
///
/// Runs before the permission granter, which is never pointed at a missing
/// path.
pub fn require_base_path(base_path: &Path) -> Result<()> {
    if !base_path.is_dir() {
        return Err(Error::NotFound(format!(
            "base path {} does not exist",
            base_path.display()
        )));
    }
    Ok(())
}

/// Resolve and validate the full store location under `base_path`.
///
/// A missing `base_path` surfaces as [`Error::NotFound`] from
/// [`resolve_subfolder`].
pub fn locate(base_path: &Path, options: ResolveOptions) -> Result<SourceLocation> {
    let resolved_subfolder = resolve_subfolder(base_path, options)?;
    let recall_folder = base_path.join(&resolved_subfolder);
    let database_path = recall_folder.join(DATABASE_FILE_NAME);
    let image_store_path = recall_folder.join(IMAGE_STORE_DIR_NAME);

    validate(&database_path, &image_store_path)?;

    tracing::info!(folder = %recall_folder.display(), "Recall folder found");

    Ok(SourceLocation {
        base_path: base_path.to_path_buf(),
        resolved_subfolder,
        database_path,
        image_store_path,
    })
}
