//! Pinned data directory layout under a project root.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{CatalogError, CatalogResult};

/// Project data layout: `<root>/data/raw` for downloads and
/// `<root>/data/processed` for derived outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    /// Pin the layout to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Project root the layout was pinned to.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding raw downloads.
    #[must_use]
    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("data").join("raw")
    }

    /// Directory holding processed outputs.
    #[must_use]
    pub fn processed_dir(&self) -> PathBuf {
        self.root.join("data").join("processed")
    }

    /// Resolve `path` to a destination under the raw-data root and create
    /// its parent directories.
    ///
    /// Relative paths resolve against the raw root. The normalized result
    /// must stay under the raw root; anything else fails with
    /// [`CatalogError::DestinationOutsideRoot`] rather than being redirected.
    pub fn ensure_raw_destination(&self, path: impl AsRef<Path>) -> CatalogResult<PathBuf> {
        let raw_root = normalize(&self.raw_dir());
        let candidate = if path.as_ref().is_absolute() {
            path.as_ref().to_path_buf()
        } else {
            raw_root.join(path.as_ref())
        };
        let destination = normalize(&candidate);

        if !destination.starts_with(&raw_root) {
            return Err(CatalogError::DestinationOutsideRoot {
                requested: destination,
                root: raw_root,
            });
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|source| CatalogError::Io {
                operation: "layout.create_parent",
                path: parent.to_path_buf(),
                source,
            })?;
        }

        debug!(path = %destination.display(), "resolved raw destination");
        Ok(destination)
    }
}

/// Collapse `.` and `..` components lexically, without touching the
/// filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}
