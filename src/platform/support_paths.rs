//! Per-user application-support directory resolution.
//!
//! A support path is where the application keeps non-bundled persistent data
//! (logs, caches, local databases). Resolution is a pure function of the
//! configured root, the requested subdirectories, and the filesystem: no
//! state is retained between calls.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::CoordinatorError;

/// Resolves paths under the per-user application-support root.
pub struct SupportPaths {
    root: PathBuf,
}

impl SupportPaths {
    /// Resolver rooted at the platform's per-user data directory for
    /// `app_name`, e.g. `~/Library/Application Support/Haven` on macOS or
    /// `~/.local/share/Haven` on Linux.
    ///
    /// Returns None when the platform reports no user data directory.
    pub fn for_application(app_name: &str) -> Option<Self> {
        dirs::data_dir().map(|base| Self {
            root: base.join(app_name),
        })
    }

    /// Resolver rooted at an explicit directory. Used by tests and by
    /// portable installs.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Joins the root with `subdirs` in order.
    ///
    /// With `create` set, missing directories along the path are created;
    /// the call succeeds if they already exist. Without `create`, the call
    /// fails with `NotFound` if the resolved path does not exist.
    pub fn resolve<S: AsRef<str>>(
        &self,
        subdirs: &[S],
        create: bool,
    ) -> Result<PathBuf, CoordinatorError> {
        let mut path = self.root.clone();
        for segment in subdirs {
            path.push(segment.as_ref());
        }

        if create {
            fs::create_dir_all(&path).map_err(|source| CoordinatorError::PathCreationFailed {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "support path ready");
        } else if !path.exists() {
            return Err(CoordinatorError::NotFound { path });
        }

        Ok(path)
    }
}
