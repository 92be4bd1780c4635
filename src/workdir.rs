//! Per-request staging directory

use crate::error::{Error, Result};
use crate::utils::unique_path;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Name of the template subdirectory inside a working directory
pub const TEMPLATES_DIR: &str = "templates";

/// Uniquely named directory owning every artifact of one request
///
/// The directory is created with a random name, so concurrent requests can never share
/// one. It is removed when the value is dropped, on every exit path.
#[derive(Debug)]
pub struct WorkingDirectory {
    dir: TempDir,
}

impl WorkingDirectory {
    /// Create a fresh directory under `root`, or under the system temp dir when `None`
    pub fn create(root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("bip-extract-");

        let dir = match root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "failed to create working directory: {e}"
            )))
        })?;

        debug!(path = ?dir.path(), "created working directory");
        Ok(Self { dir })
    }

    /// Root of the directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `templates/`, created on first use
    pub fn templates_dir(&self) -> Result<PathBuf> {
        let dir = self.path().join(TEMPLATES_DIR);
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "failed to create templates directory: {e}"
            )))
        })?;
        Ok(dir)
    }

    /// A not-yet-used `<stem>.<ext>` path at the root (`<stem>_1.<ext>`, ... on collision)
    pub fn unique_file(&self, stem: &str, ext: &str) -> Result<PathBuf> {
        unique_path(self.path(), stem, ext)
    }

    /// A not-yet-used subdirectory at the root, created before returning
    ///
    /// `templates/` is reserved for the template collector and is never handed out.
    pub fn unique_subdir(&self, name: &str) -> Result<PathBuf> {
        self.templates_dir()?;
        let dir = unique_path(self.path(), name, "")?;
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "failed to create directory {}: {e}",
                dir.display()
            )))
        })?;
        Ok(dir)
    }

    /// Delete the directory now, reporting failures instead of ignoring them
    pub fn close(self) -> Result<()> {
        let path = self.path().to_path_buf();
        self.dir.close().map_err(|e| {
            warn!(?path, error = %e, "failed to remove working directory");
            Error::Io(e)
        })?;
        debug!(?path, "removed working directory");
        Ok(())
    }
}
