//! Scratch directory used while a package is assembled.

use crate::layout::staging_root;
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures setting up a staging directory.
#[derive(Debug, Error)]
pub enum StagingError {
    /// A staging directory from an earlier run is still present.
    #[error("staging directory {path} already exists; remove it and retry")]
    AlreadyExists {
        /// The leftover directory.
        path: PathBuf,
    },

    /// The staging directory or one of its subfolders could not be created.
    #[error("could not create staging directory {path}: {source}")]
    Create {
        /// The directory that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// A staging directory owned by one build.
///
/// Call [`StagingArea::remove`] to delete it and collect any cleanup
/// warning. If the value is dropped without that call the directory is
/// still removed, with failures only logged.
#[derive(Debug)]
pub struct StagingArea {
    root: PathBuf,
    created: bool,
}

impl StagingArea {
    /// Create the staging directory for `package_path` with `subfolders`.
    ///
    /// # Errors
    ///
    /// Returns [`StagingError::AlreadyExists`] when the directory is already
    /// present, or [`StagingError::Create`] when it cannot be created.
    pub fn create(
        package_path: &Path,
        explicit_dir: Option<&Path>,
        subfolders: &[&str],
    ) -> Result<Self, StagingError> {
        let root = staging_root(package_path, explicit_dir);
        if root.exists() {
            return Err(StagingError::AlreadyExists { path: root });
        }
        fs::create_dir_all(&root).map_err(|source| StagingError::Create {
            path: root.clone(),
            source,
        })?;

        // From here on Drop owns the cleanup.
        let area = Self {
            root,
            created: true,
        };
        for folder in subfolders {
            let path = area.root.join(folder);
            fs::create_dir_all(&path).map_err(|source| StagingError::Create { path, source })?;
        }
        debug!("created staging directory {}", area.root.display());
        Ok(area)
    }

    /// Return the staging root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Delete the staging directory.
    ///
    /// Returns a warning message when the directory could not be removed.
    #[must_use]
    pub fn remove(mut self) -> Option<String> {
        self.created = false;
        remove_tree(&self.root).err().map(|e| {
            format!(
                "could not remove staging directory {}: {e}",
                self.root.display()
            )
        })
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if !self.created {
            return;
        }
        if let Err(e) = remove_tree(&self.root) {
            warn!(
                "could not remove staging directory {}: {e}",
                self.root.display()
            );
        }
    }
}

fn remove_tree(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
