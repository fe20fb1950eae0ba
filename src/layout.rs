//! Fixed on-disk layout shared by the package builder and loader.
//!
//! The names below are never negotiated at runtime. Compatibility between
//! tool versions is carried by the two version fields of the manifest, so
//! renaming any of these constants is a breaking format change.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Extension of a finished package archive.
pub const ARCHIVE_EXTENSION: &str = "xcfg";

/// Extension of the staging directory used while a package is assembled.
pub const STAGING_EXTENSION: &str = "xcfg_tmp";

/// Manifest file name at the archive root.
pub const MANIFEST_FILE: &str = "package_manifest.xml";

/// Folder holding the node's system definition.
pub const SYSTEM_DEFINITION_DIR: &str = "system_definition";

/// System definition file name inside [`SYSTEM_DEFINITION_DIR`].
pub const SYSTEM_DEFINITION_FILE: &str = "system_definition.sysdef";

/// Folder holding the device index and device definition files.
pub const DEVICE_DEFINITION_DIR: &str = "device_definitions";

/// Device index file name inside [`DEVICE_DEFINITION_DIR`].
pub const DEVICE_INDEX_FILE: &str = "devices.ini";

/// The three files every package must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequiredMember {
    /// The package manifest.
    Manifest,
    /// The system definition of the target node.
    SystemDefinition,
    /// The device definition index.
    DeviceIndex,
}

impl RequiredMember {
    /// Every required member, in the order the loader resolves them.
    pub const ALL: [Self; 3] = [Self::Manifest, Self::SystemDefinition, Self::DeviceIndex];

    /// Folder relative to the package root, `None` for the root itself.
    #[must_use]
    pub const fn folder(self) -> Option<&'static str> {
        match self {
            Self::Manifest => None,
            Self::SystemDefinition => Some(SYSTEM_DEFINITION_DIR),
            Self::DeviceIndex => Some(DEVICE_DEFINITION_DIR),
        }
    }

    /// Expected file name.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Manifest => MANIFEST_FILE,
            Self::SystemDefinition => SYSTEM_DEFINITION_FILE,
            Self::DeviceIndex => DEVICE_INDEX_FILE,
        }
    }

    /// Extension shared by every candidate file for this member.
    #[must_use]
    pub fn extension(self) -> &'static str {
        Path::new(self.file_name())
            .extension()
            .and_then(OsStr::to_str)
            .unwrap_or_default()
    }

    /// Path of the member relative to the package root.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use xcfg::layout::RequiredMember;
    ///
    /// assert_eq!(
    ///     RequiredMember::DeviceIndex.relative_path(),
    ///     Path::new("device_definitions").join("devices.ini"),
    /// );
    /// ```
    #[must_use]
    pub fn relative_path(self) -> PathBuf {
        match self.folder() {
            Some(folder) => Path::new(folder).join(self.file_name()),
            None => PathBuf::from(self.file_name()),
        }
    }

    /// Directory that should contain the member below `root`.
    #[must_use]
    pub fn folder_in(self, root: &Path) -> PathBuf {
        match self.folder() {
            Some(folder) => root.join(folder),
            None => root.to_path_buf(),
        }
    }

    /// Short human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Manifest => "manifest",
            Self::SystemDefinition => "system definition",
            Self::DeviceIndex => "device index",
        }
    }
}

/// Return whether `path` carries the package archive extension.
#[must_use]
pub fn has_archive_extension(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(ARCHIVE_EXTENSION))
}

/// Derive the staging directory for `package_path`.
///
/// The staging root sits next to the package (`42.xcfg` stages in
/// `42.xcfg_tmp`) unless `explicit_dir` is given, in which case it is
/// created inside that directory under the same name.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use xcfg::layout::staging_root;
///
/// let package = Path::new("/tmp/42.xcfg");
/// assert_eq!(staging_root(package, None), Path::new("/tmp/42.xcfg_tmp"));
/// assert_eq!(
///     staging_root(package, Some(Path::new("/var/tmp"))),
///     Path::new("/var/tmp/42.xcfg_tmp"),
/// );
/// ```
#[must_use]
pub fn staging_root(package_path: &Path, explicit_dir: Option<&Path>) -> PathBuf {
    let adjacent = package_path.with_extension(STAGING_EXTENSION);
    match (explicit_dir, adjacent.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => adjacent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::manifest(RequiredMember::Manifest, "xml")]
    #[case::system(RequiredMember::SystemDefinition, "sysdef")]
    #[case::devices(RequiredMember::DeviceIndex, "ini")]
    fn member_extensions_follow_file_names(
        #[case] member: RequiredMember,
        #[case] extension: &str,
    ) {
        assert_eq!(member.extension(), extension);
    }

    #[test]
    fn manifest_lives_at_the_root() {
        let root = Path::new("/out");
        assert_eq!(RequiredMember::Manifest.folder_in(root), root);
        assert_eq!(
            RequiredMember::Manifest.relative_path(),
            PathBuf::from(MANIFEST_FILE)
        );
    }

    #[test]
    fn device_index_extension_differs_from_device_files() {
        assert_ne!(
            RequiredMember::DeviceIndex.extension(),
            xcfg_common::DEVICE_FILE_EXTENSION
        );
    }

    #[rstest]
    #[case::plain("/tmp/42.xcfg", true)]
    #[case::other("/tmp/42.zip", false)]
    #[case::none("/tmp/42", false)]
    #[case::upper("/tmp/42.XCFG", false)]
    #[case::staging("/tmp/42.xcfg_tmp", false)]
    fn recognises_archive_extension(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(has_archive_extension(Path::new(path)), expected);
    }

    #[test]
    fn staging_root_for_relative_package() {
        assert_eq!(
            staging_root(Path::new("pkg.xcfg"), None),
            PathBuf::from("pkg.xcfg_tmp")
        );
    }
}
