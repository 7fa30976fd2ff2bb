//! Making the store readable before it is resolved
//!
//! The UKP folder is ACL-protected even for its owner. [`IcaclsGranter`]
//! grants the user full control recursively; [`NoopGranter`] is for stores
//! that are already readable (mounted images, tests, non-Windows hosts).

use crate::error::{Error, Result};
use std::path::Path;
use std::process::Command;

/// Capability invoked on the base path before it is resolved.
pub trait PermissionGranter: Send + Sync {
    /// Make everything under `base_path` readable by the extracting user.
    fn grant(&self, base_path: &Path) -> Result<()>;
}

/// Leaves permissions untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGranter;

impl PermissionGranter for NoopGranter {
    fn grant(&self, base_path: &Path) -> Result<()> {
        tracing::debug!(path = %base_path.display(), "Skipping permission grant");
        Ok(())
    }
}

/// Grants full control to `username` via the Windows `icacls` tool.
#[derive(Debug, Clone)]
pub struct IcaclsGranter {
    username: String,
}

impl IcaclsGranter {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }

    /// Build the `icacls` invocation for `base_path`.
    pub fn command(&self, base_path: &Path) -> Command {
        let mut cmd = Command::new("icacls");
        cmd.arg(base_path)
            .arg("/grant")
            .arg(format!("{}:(OI)(CI)F", self.username))
            .args(["/T", "/C", "/Q"]);
        cmd
    }
}

impl PermissionGranter for IcaclsGranter {
    fn grant(&self, base_path: &Path) -> Result<()> {
        let output = self.command(base_path).output().map_err(|e| {
            Error::Permission(format!(
                "failed to run icacls for {}: {}",
                base_path.display(),
                e
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Permission(format!(
                "failed to modify permissions for {}: icacls exited with {}: {}",
                base_path.display(),
                output.status,
                stderr.trim()
            )));
        }

        tracing::info!(
            path = %base_path.display(),
            user = %self.username,
            "Permissions modified for base path and all its subdirectories and files"
        );
        Ok(())
    }
}
