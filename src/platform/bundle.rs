//! Bundled-resource resolution.
//!
//! Resources ship in a `resources/` directory next to the executable.
//! Resolution has no side effects and no retained state.

use std::io;
use std::path::{Path, PathBuf};

use crate::errors::CoordinatorError;

/// Resolves named resources bundled with the application.
pub struct BundleResources {
    root: PathBuf,
}

impl BundleResources {
    /// Resources directory next to the running executable.
    pub fn for_executable() -> io::Result<Self> {
        let exe = std::env::current_exe()?;
        let dir = exe.parent().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "executable has no parent directory")
        })?;
        Ok(Self {
            root: dir.join("resources"),
        })
    }

    /// Resolver rooted at an explicit directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the bundled resource `name`.
    ///
    /// Fails with `ResourceNotFound` if no such file ships with the
    /// application.
    pub fn file(&self, name: &str) -> Result<PathBuf, CoordinatorError> {
        let path = self.root.join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(CoordinatorError::ResourceNotFound {
                name: name.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolves_existing_resource() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("motd.txt"), "hello").unwrap();

        let bundle = BundleResources::with_root(dir.path());
        let path = bundle.file("motd.txt").unwrap();
        assert_eq!(path, dir.path().join("motd.txt"));
    }

    #[test]
    fn test_missing_resource_is_an_error() {
        let dir = TempDir::new().unwrap();
        let bundle = BundleResources::with_root(dir.path());

        let err = bundle.file("missing.png").unwrap_err();
        assert!(matches!(err, CoordinatorError::ResourceNotFound { .. }));
    }

    #[test]
    fn test_directories_do_not_count_as_resources() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("themes")).unwrap();

        let bundle = BundleResources::with_root(dir.path());
        assert!(bundle.file("themes").is_err());
    }
}
