//! Serializer traits consumed by the package engine.
//!
//! The engine never formats system or device definitions itself. It hands
//! the in-memory model to an implementation of these traits and packs
//! whatever files the implementation reports as written.

use crate::model::{DeviceDefinition, Node};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by system and device definition serializers.
#[derive(Debug, Error)]
pub enum SerializeError {
    /// Reading or writing a definition file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A definition file could not be encoded or decoded.
    #[error("invalid definition file {path}: {source}")]
    Json {
        /// File being read or written.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A device type cannot be used as a file name.
    #[error("device type \"{0}\" cannot be used as a file name")]
    InvalidDeviceType(String),

    /// Two devices share a device type and would share a file.
    #[error("device type \"{0}\" appears more than once")]
    DuplicateDeviceType(String),

    /// The device index file is structurally broken.
    #[error("invalid device index {path}: {reason}")]
    InvalidIndex {
        /// Path of the index file.
        path: PathBuf,
        /// Description of the problem.
        reason: String,
    },
}

impl SerializeError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Writes and reads the system definition of a single node.
pub trait SystemDefinitionSerializer {
    /// Write `node` to `path`.
    ///
    /// Returns every file written, including `path` itself.
    ///
    /// # Errors
    ///
    /// Returns a [`SerializeError`] when the file cannot be encoded or
    /// written.
    fn save(&self, node: &Node, path: &Path) -> Result<Vec<PathBuf>, SerializeError>;

    /// Read a node back from `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`SerializeError`] when the file cannot be read or decoded.
    fn load(&self, path: &Path) -> Result<Node, SerializeError>;
}

/// Writes and reads the device index and its device definition files.
pub trait DeviceDefinitionSerializer {
    /// Write the index file at `index_path` and one file per device next
    /// to it.
    ///
    /// Returns every file written, index first.
    ///
    /// # Errors
    ///
    /// Returns a [`SerializeError`] when any file cannot be encoded or
    /// written.
    fn save(
        &self,
        devices: &[DeviceDefinition],
        index_path: &Path,
    ) -> Result<Vec<PathBuf>, SerializeError>;

    /// Read the index at `index_path` and every device file it references.
    ///
    /// # Errors
    ///
    /// Returns a [`SerializeError`] when the index or a referenced file is
    /// missing or malformed.
    fn load(&self, index_path: &Path) -> Result<Vec<DeviceDefinition>, SerializeError>;
}
