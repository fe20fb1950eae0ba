//! Package extraction and structural validation.

use crate::archive::{ArchiveCodec, ZipCodec};
use crate::config::PackageConfig;
use crate::diagnostics::{Diagnostics, Outcome};
use crate::error::{PackageError, Result};
use crate::layout::RequiredMember;
use crate::manifest::{Manifest, ManifestCodec, PACKAGE_SCHEMA_VERSION};
use crate::manifest_xml::XmlManifestCodec;
use log::debug;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Log target for load failures.
pub const LOAD_USE_CASE: &str = "xcfg::load";

/// What a successful load hands back to the caller.
///
/// The definition files are located but not parsed; callers read them with
/// their own serializers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPackage {
    /// The parsed manifest.
    pub manifest: Manifest,
    /// Absolute path of the extracted system definition file.
    pub system_definition_path: PathBuf,
    /// Absolute path of the extracted device index file.
    pub device_definition_path: PathBuf,
}

/// Extracts packages and checks their layout.
pub struct PackageLoader {
    archive: Box<dyn ArchiveCodec>,
    manifest_codec: Box<dyn ManifestCodec>,
}

impl PackageLoader {
    /// Create a loader from explicit collaborators.
    #[must_use]
    pub fn new(archive: Box<dyn ArchiveCodec>, manifest_codec: Box<dyn ManifestCodec>) -> Self {
        Self {
            archive,
            manifest_codec,
        }
    }

    /// Create a loader with the zip and XML implementations.
    #[must_use]
    pub fn with_defaults(config: &PackageConfig) -> Self {
        Self::new(
            Box::new(ZipCodec::new(config.archive)),
            Box::new(XmlManifestCodec),
        )
    }

    /// Extract `package_path` into `target_dir` and resolve its members.
    ///
    /// `target_dir` is deleted and recreated first; its previous contents
    /// are lost even if the load then fails.
    #[must_use]
    pub fn load(&self, package_path: &Path, target_dir: &Path) -> Outcome<LoadedPackage> {
        let mut diagnostics = Diagnostics::new();
        let result = self.run(package_path, target_dir, &mut diagnostics);
        Outcome::finish(LOAD_USE_CASE, result, diagnostics)
    }

    fn run(
        &self,
        package_path: &Path,
        target_dir: &Path,
        diagnostics: &mut Diagnostics,
    ) -> Result<LoadedPackage> {
        let target = normalise_target(target_dir)?;
        if !package_path.is_file() {
            return Err(PackageError::PackageNotFound {
                path: package_path.to_path_buf(),
            });
        }
        if fs::canonicalize(package_path)
            .is_ok_and(|package| package.starts_with(resolve_aliases(&target)))
        {
            return Err(PackageError::InvalidTarget {
                path: target,
                reason: "the package lies inside it and would be deleted",
            });
        }

        recreate_dir(&target)?;
        self.archive.extract(package_path, &target)?;

        let manifest_path = resolve_member(&target, RequiredMember::Manifest)?;
        let system_definition_path = resolve_member(&target, RequiredMember::SystemDefinition)?;
        let device_definition_path = resolve_member(&target, RequiredMember::DeviceIndex)?;

        let manifest = self.manifest_codec.load(&manifest_path)?;
        if manifest.package_schema_version() != PACKAGE_SCHEMA_VERSION {
            let warning = format!(
                "package version {} differs from supported version {}",
                manifest.package_schema_version(),
                PACKAGE_SCHEMA_VERSION
            );
            log::warn!(target: LOAD_USE_CASE, "{warning}");
            diagnostics.push_warning(warning);
        }

        debug!(
            target: LOAD_USE_CASE,
            "loaded package for node {} into {}",
            manifest.node_name(),
            target.display()
        );
        Ok(LoadedPackage {
            manifest,
            system_definition_path,
            device_definition_path,
        })
    }
}

fn normalise_target(target_dir: &Path) -> Result<PathBuf> {
    if target_dir.as_os_str().is_empty() {
        return Err(PackageError::InvalidTarget {
            path: target_dir.to_path_buf(),
            reason: "no directory given",
        });
    }
    std::path::absolute(target_dir).map_err(|source| PackageError::TargetDirectory {
        path: target_dir.to_path_buf(),
        source,
    })
}

/// Resolve symlinks and `..` in the absolute `path`, which need not exist.
///
/// The longest existing prefix is canonicalised; the missing remainder is
/// folded lexically.
fn resolve_aliases(path: &Path) -> PathBuf {
    let components: Vec<Component<'_>> = path.components().collect();
    for split in (1..=components.len()).rev() {
        let (existing, missing) = components.split_at(split);
        let Ok(resolved) = fs::canonicalize(existing.iter().collect::<PathBuf>()) else {
            continue;
        };
        return missing.iter().fold(resolved, |mut acc, component| {
            match component {
                Component::ParentDir => {
                    acc.pop();
                }
                Component::CurDir => {}
                other => acc.push(other),
            }
            acc
        });
    }
    path.to_path_buf()
}

fn recreate_dir(target: &Path) -> Result<()> {
    let to_error = |source| PackageError::TargetDirectory {
        path: target.to_path_buf(),
        source,
    };
    match fs::remove_dir_all(target) {
        Ok(()) => debug!(target: LOAD_USE_CASE, "cleared {}", target.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(to_error(e)),
    }
    fs::create_dir_all(target).map_err(to_error)
}

/// Locate `member` below `root`.
///
/// The member must be the only file carrying its extension in its folder
/// and must have the exact expected name.
fn resolve_member(root: &Path, member: RequiredMember) -> Result<PathBuf> {
    let folder = member.folder_in(root);
    let candidates = files_with_extension(&folder, member.extension());
    match candidates.as_slice() {
        [only] if only.file_name() == Some(OsStr::new(member.file_name())) => Ok(only.clone()),
        _ => {
            debug!(
                target: LOAD_USE_CASE,
                "{} not resolved in {}: {} candidate(s)",
                member.label(),
                folder.display(),
                candidates.len()
            );
            Err(PackageError::IncompletePackage)
        }
    }
}

fn files_with_extension(folder: &Path, extension: &str) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(folder) else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file() && path.extension() == Some(OsStr::new(extension)))
        .collect()
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
