//! Error taxonomy for package operations.
//!
//! Internally every step returns a [`PackageError`] carrying the details of
//! what went wrong. At the public boundary it collapses into one of the
//! fixed [`ErrorKind`] values, with its message moved into the call's
//! [`Diagnostics`](crate::Diagnostics).

use crate::archive::ArchiveError;
use crate::layout::ARCHIVE_EXTENSION;
use crate::manifest::ManifestError;
use crate::staging::StagingError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use xcfg_common::SerializeError;

/// Fixed failure categories reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad target location, wrong extension, or leftover staging directory.
    InvalidPath,
    /// The manifest names a node that the system definition lacks.
    InvalidReference,
    /// A required package member is missing, duplicated, or misnamed.
    IncompletePackage,
    /// A filesystem, archive, or serializer operation failed.
    IoFailure,
    /// The manifest document is structurally wrong or of another version.
    MalformedManifest,
}

impl ErrorKind {
    /// Stable numeric code, also used as the CLI exit status.
    ///
    /// # Examples
    ///
    /// ```
    /// use xcfg::ErrorKind;
    ///
    /// assert_eq!(ErrorKind::InvalidPath.code(), 1);
    /// assert_eq!(ErrorKind::MalformedManifest.code(), 5);
    /// ```
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::InvalidPath => 1,
            Self::InvalidReference => 2,
            Self::IncompletePackage => 3,
            Self::IoFailure => 4,
            Self::MalformedManifest => 5,
        }
    }

    /// Kebab-case name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidPath => "invalid-path",
            Self::InvalidReference => "invalid-reference",
            Self::IncompletePackage => "incomplete-package",
            Self::IoFailure => "io-failure",
            Self::MalformedManifest => "malformed-manifest",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detailed failure raised inside a build or load.
#[derive(Debug, Error)]
pub enum PackageError {
    /// The package file to build already exists.
    #[error("package {path} already exists")]
    PackageExists {
        /// The rejected package path.
        path: PathBuf,
    },

    /// The directory that should receive the package does not exist.
    #[error("parent directory of package {path} does not exist")]
    MissingParent {
        /// The rejected package path.
        path: PathBuf,
    },

    /// The package path lacks the mandated extension.
    #[error("package {path} must have the .{ext} extension", ext = ARCHIVE_EXTENSION)]
    WrongExtension {
        /// The rejected package path.
        path: PathBuf,
    },

    /// A staging directory from an earlier run is still present.
    #[error("staging directory {path} already exists; remove it and retry")]
    StagingExists {
        /// The leftover staging directory.
        path: PathBuf,
    },

    /// The package to load does not exist.
    #[error("package {path} does not exist")]
    PackageNotFound {
        /// The missing package path.
        path: PathBuf,
    },

    /// The target directory cannot be used for extraction.
    #[error("invalid target directory {path}: {reason}")]
    InvalidTarget {
        /// The rejected target directory.
        path: PathBuf,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The manifest names a node absent from the system definition.
    #[error("node \"{node}\" not found in system definition")]
    UnknownNode {
        /// The missing node name.
        node: String,
    },

    /// The manifest names no node.
    #[error("the manifest names no node")]
    EmptyNodeName,

    /// Several nodes share the name the manifest refers to.
    #[error("node name \"{node}\" is ambiguous: {count} nodes share it")]
    AmbiguousNode {
        /// The duplicated node name.
        node: String,
        /// How many nodes carry the name.
        count: usize,
    },

    /// The extracted package does not have the required layout.
    #[error("could not find necessary files in package")]
    IncompletePackage,

    /// The target directory could not be cleared or created.
    #[error("could not prepare target directory {path}: {source}")]
    TargetDirectory {
        /// The target directory.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A serializer reported a file outside the staging directory.
    #[error("serializer wrote {path} outside the staging directory")]
    MemberOutsideStaging {
        /// The offending file.
        path: PathBuf,
    },

    /// A system or device definition could not be written.
    #[error("could not write {what}: {source}")]
    Serialize {
        /// Which definition was being written.
        what: &'static str,
        /// The serializer failure.
        #[source]
        source: SerializeError,
    },

    /// Reading or writing the manifest failed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Packing or extracting the archive failed.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// The staging directory could not be set up.
    #[error(transparent)]
    Staging(#[from] StagingError),
}

impl PackageError {
    /// Return the public category of this failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PackageExists { .. }
            | Self::MissingParent { .. }
            | Self::WrongExtension { .. }
            | Self::StagingExists { .. }
            | Self::PackageNotFound { .. }
            | Self::InvalidTarget { .. }
            | Self::Staging(StagingError::AlreadyExists { .. }) => ErrorKind::InvalidPath,
            Self::UnknownNode { .. } | Self::EmptyNodeName | Self::AmbiguousNode { .. } => {
                ErrorKind::InvalidReference
            }
            Self::IncompletePackage => ErrorKind::IncompletePackage,
            Self::Manifest(inner) => inner.kind(),
            Self::TargetDirectory { .. }
            | Self::MemberOutsideStaging { .. }
            | Self::Serialize { .. }
            | Self::Archive(_)
            | Self::Staging(StagingError::Create { .. }) => ErrorKind::IoFailure,
        }
    }
}

/// Result type alias using [`PackageError`].
pub type Result<T> = std::result::Result<T, PackageError>;
