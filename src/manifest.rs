//! Package manifest model and codec interface.
//!
//! The manifest is the small document at the root of every package that
//! names the node the package targets. It carries two independent version
//! numbers: the file-format version of the document itself, which must
//! match exactly, and the package schema version, which describes the
//! layout of the rest of the package.

use crate::error::ErrorKind;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File-format version written to and required from manifests.
pub const FILE_FORMAT_VERSION: u32 = 1;

/// Package schema version written by this build.
pub const PACKAGE_SCHEMA_VERSION: u32 = 1;

/// Tag of the manifest root element.
pub const ROOT_TAG: &str = "xcfg-package-manifest";

/// The kind of content a package carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PackageType {
    /// System definition of one node plus its device definitions.
    #[default]
    SystemConfiguration,
}

impl PackageType {
    /// Literal written to the `types` attribute of the package element.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SystemConfiguration => "system-configuration",
        }
    }

    /// Parse the `types` attribute literal.
    #[must_use]
    pub fn from_literal(value: &str) -> Option<Self> {
        (value == Self::SystemConfiguration.as_str()).then_some(Self::SystemConfiguration)
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata identifying which node a package targets.
///
/// # Examples
///
/// ```
/// use xcfg::manifest::{FILE_FORMAT_VERSION, Manifest, PACKAGE_SCHEMA_VERSION};
///
/// let manifest = Manifest::new("ECU_A");
/// assert_eq!(manifest.node_name(), "ECU_A");
/// assert_eq!(manifest.file_format_version(), FILE_FORMAT_VERSION);
/// assert_eq!(manifest.package_schema_version(), PACKAGE_SCHEMA_VERSION);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    node_name: String,
    file_format_version: u32,
    package_schema_version: u32,
    package_type: PackageType,
}

impl Manifest {
    /// Create a manifest for `node_name` using the current versions.
    #[must_use]
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            file_format_version: FILE_FORMAT_VERSION,
            package_schema_version: PACKAGE_SCHEMA_VERSION,
            package_type: PackageType::SystemConfiguration,
        }
    }

    /// Override the package schema version.
    ///
    /// Used when reading packages written by other tool versions.
    #[must_use]
    pub fn with_package_schema_version(mut self, version: u32) -> Self {
        self.package_schema_version = version;
        self
    }

    /// Return the name of the targeted node.
    #[must_use]
    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// Return the document file-format version.
    #[must_use]
    pub fn file_format_version(&self) -> u32 {
        self.file_format_version
    }

    /// Return the package schema version.
    #[must_use]
    pub fn package_schema_version(&self) -> u32 {
        self.package_schema_version
    }

    /// Return the package type.
    #[must_use]
    pub fn package_type(&self) -> PackageType {
        self.package_type
    }
}

/// Failures reading or writing a manifest document.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file does not exist.
    #[error("manifest {path} not found")]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The file exists but the document parser rejected it.
    #[error("manifest {path} could not be read: {reason}")]
    Unreadable {
        /// The manifest path.
        path: PathBuf,
        /// The parser's message.
        reason: String,
    },

    /// The root element is not the manifest tag.
    #[error("unexpected manifest root element \"{found}\", expected \"{root}\"", root = ROOT_TAG)]
    WrongRoot {
        /// The root element that was found.
        found: String,
    },

    /// The file-format version is not the one this build reads.
    #[error("unsupported manifest file version {found}; expected {expected}")]
    VersionMismatch {
        /// Version found in the document.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },

    /// A required element or attribute is missing or invalid.
    #[error("malformed manifest: {reason}")]
    Malformed {
        /// Description of the problem.
        reason: String,
    },

    /// The manifest document could not be written.
    #[error("could not write manifest {path}: {reason}")]
    WriteFailure {
        /// The destination path.
        path: PathBuf,
        /// The underlying message.
        reason: String,
    },
}

impl ManifestError {
    /// Return the public category of this failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } | Self::WriteFailure { .. } => ErrorKind::IoFailure,
            Self::Unreadable { .. }
            | Self::WrongRoot { .. }
            | Self::VersionMismatch { .. }
            | Self::Malformed { .. } => ErrorKind::MalformedManifest,
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

/// Structured read/write access to manifest documents.
#[cfg_attr(test, mockall::automock)]
pub trait ManifestCodec {
    /// Read and validate the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`ManifestError`] describing why the document was
    /// rejected.
    fn load(&self, path: &Path) -> Result<Manifest, ManifestError>;

    /// Write `manifest` to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::WriteFailure`] if the document cannot be
    /// persisted.
    fn save(&self, manifest: &Manifest, path: &Path) -> Result<(), ManifestError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_type_literal_round_trips() {
        let literal = PackageType::SystemConfiguration.as_str();
        assert_eq!(
            PackageType::from_literal(literal),
            Some(PackageType::SystemConfiguration)
        );
        assert_eq!(PackageType::from_literal("firmware"), None);
    }

    #[test]
    fn schema_version_override_keeps_node() {
        let manifest = Manifest::new("ECU_A").with_package_schema_version(7);
        assert_eq!(manifest.node_name(), "ECU_A");
        assert_eq!(manifest.package_schema_version(), 7);
        assert_eq!(manifest.file_format_version(), FILE_FORMAT_VERSION);
    }

    #[test]
    fn version_mismatch_reports_both_versions() {
        let err = ManifestError::VersionMismatch {
            found: 3,
            expected: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains('3'));
        assert!(msg.contains('1'));
        assert_eq!(err.kind(), ErrorKind::MalformedManifest);
    }
}
