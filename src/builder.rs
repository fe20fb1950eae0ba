//! Package assembly.
//!
//! A build validates its inputs before touching the filesystem, writes every
//! member into a staging directory, and packs exactly those members into the
//! archive as its final step. The staging directory is removed whatever the
//! outcome.

use crate::archive::{ArchiveCodec, ZipCodec};
use crate::config::PackageConfig;
use crate::diagnostics::{Diagnostics, Outcome};
use crate::error::{PackageError, Result};
use crate::layout::{
    DEVICE_DEFINITION_DIR, RequiredMember, SYSTEM_DEFINITION_DIR, has_archive_extension,
    staging_root,
};
use crate::manifest::{Manifest, ManifestCodec};
use crate::manifest_xml::XmlManifestCodec;
use crate::staging::StagingArea;
use log::debug;
use std::path::{Path, PathBuf};
use xcfg_common::{
    DeviceDefinitionSerializer, IniDeviceDefinitionSerializer, JsonSystemDefinitionSerializer,
    Node, SystemDefinition, SystemDefinitionSerializer,
};

/// Log target for build failures.
pub const BUILD_USE_CASE: &str = "xcfg::build";

/// Inputs of a single build.
#[derive(Debug, Clone, Copy)]
pub struct BuildRequest<'a> {
    /// Destination archive; must not exist yet.
    pub package_path: &'a Path,
    /// System definition holding the target node and all devices.
    pub system_definition: &'a SystemDefinition,
    /// Manifest naming the target node.
    pub manifest: &'a Manifest,
    /// Directory in which to create the staging directory.
    pub temp_dir: Option<&'a Path>,
}

impl<'a> BuildRequest<'a> {
    /// Create a request that stages next to the package.
    #[must_use]
    pub fn new(
        package_path: &'a Path,
        system_definition: &'a SystemDefinition,
        manifest: &'a Manifest,
    ) -> Self {
        Self {
            package_path,
            system_definition,
            manifest,
            temp_dir: None,
        }
    }

    /// Stage inside `temp_dir` instead of next to the package.
    #[must_use]
    pub fn with_temp_dir(mut self, temp_dir: Option<&'a Path>) -> Self {
        self.temp_dir = temp_dir;
        self
    }
}

/// Builds packages using injected codecs and serializers.
pub struct PackageBuilder {
    archive: Box<dyn ArchiveCodec>,
    manifest_codec: Box<dyn ManifestCodec>,
    system_serializer: Box<dyn SystemDefinitionSerializer>,
    device_serializer: Box<dyn DeviceDefinitionSerializer>,
}

impl PackageBuilder {
    /// Create a builder from explicit collaborators.
    #[must_use]
    pub fn new(
        archive: Box<dyn ArchiveCodec>,
        manifest_codec: Box<dyn ManifestCodec>,
        system_serializer: Box<dyn SystemDefinitionSerializer>,
        device_serializer: Box<dyn DeviceDefinitionSerializer>,
    ) -> Self {
        Self {
            archive,
            manifest_codec,
            system_serializer,
            device_serializer,
        }
    }

    /// Create a builder with the zip, XML, JSON and INI implementations.
    #[must_use]
    pub fn with_defaults(config: &PackageConfig) -> Self {
        Self::new(
            Box::new(ZipCodec::new(config.archive)),
            Box::new(XmlManifestCodec),
            Box::new(JsonSystemDefinitionSerializer),
            Box::new(IniDeviceDefinitionSerializer),
        )
    }

    /// Build the package described by `request`.
    ///
    /// On success the result holds the archive path. Cleanup problems are
    /// reported as warnings and never replace the primary error.
    #[must_use]
    pub fn build(&self, request: &BuildRequest<'_>) -> Outcome<PathBuf> {
        let mut diagnostics = Diagnostics::new();
        let result = self.run(request, &mut diagnostics);
        Outcome::finish(BUILD_USE_CASE, result, diagnostics)
    }

    fn run(&self, request: &BuildRequest<'_>, diagnostics: &mut Diagnostics) -> Result<PathBuf> {
        validate_package_path(request.package_path, request.temp_dir)?;
        let node = resolve_node(request.system_definition, request.manifest.node_name())?;

        let staging = StagingArea::create(
            request.package_path,
            request.temp_dir,
            &[SYSTEM_DEFINITION_DIR, DEVICE_DEFINITION_DIR],
        )?;
        let packed = self.stage_and_pack(&staging, request, node);
        if let Some(warning) = staging.remove() {
            log::warn!(target: BUILD_USE_CASE, "{warning}");
            diagnostics.push_warning(warning);
        }
        packed?;

        debug!(
            target: BUILD_USE_CASE,
            "built {} for node {}",
            request.package_path.display(),
            node.name()
        );
        Ok(request.package_path.to_path_buf())
    }

    fn stage_and_pack(
        &self,
        staging: &StagingArea,
        request: &BuildRequest<'_>,
        node: &Node,
    ) -> Result<()> {
        let root = staging.root();
        let mut members = MemberSet::new(root);

        let manifest_path = root.join(RequiredMember::Manifest.relative_path());
        self.manifest_codec.save(request.manifest, &manifest_path)?;
        members.insert(&manifest_path)?;

        let system_path = root.join(RequiredMember::SystemDefinition.relative_path());
        let written = self
            .system_serializer
            .save(node, &system_path)
            .map_err(|source| PackageError::Serialize {
                what: "system definition",
                source,
            })?;
        members.extend(&written)?;

        let index_path = root.join(RequiredMember::DeviceIndex.relative_path());
        let written = self
            .device_serializer
            .save(request.system_definition.devices(), &index_path)
            .map_err(|source| PackageError::Serialize {
                what: "device definitions",
                source,
            })?;
        members.extend(&written)?;

        debug!(
            target: BUILD_USE_CASE,
            "packing {} member(s) from {}",
            members.paths.len(),
            root.display()
        );
        self.archive.pack(root, &members.paths, request.package_path)?;
        Ok(())
    }
}

/// Ordered, de-duplicated archive members relative to the staging root.
struct MemberSet<'a> {
    root: &'a Path,
    paths: Vec<PathBuf>,
}

impl<'a> MemberSet<'a> {
    fn new(root: &'a Path) -> Self {
        Self {
            root,
            paths: Vec::new(),
        }
    }

    fn insert(&mut self, written: &Path) -> Result<()> {
        let relative = written
            .strip_prefix(self.root)
            .map_err(|_| PackageError::MemberOutsideStaging {
                path: written.to_path_buf(),
            })?;
        if relative.as_os_str().is_empty() {
            return Err(PackageError::MemberOutsideStaging {
                path: written.to_path_buf(),
            });
        }
        if !self.paths.iter().any(|existing| existing == relative) {
            self.paths.push(relative.to_path_buf());
        }
        Ok(())
    }

    fn extend(&mut self, written: &[PathBuf]) -> Result<()> {
        written.iter().try_for_each(|path| self.insert(path))
    }
}

fn validate_package_path(package_path: &Path, temp_dir: Option<&Path>) -> Result<()> {
    if package_path.exists() {
        return Err(PackageError::PackageExists {
            path: package_path.to_path_buf(),
        });
    }

    let parent = match package_path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
        Some(parent) => parent,
        None => {
            return Err(PackageError::MissingParent {
                path: package_path.to_path_buf(),
            });
        }
    };
    if !parent.is_dir() {
        return Err(PackageError::MissingParent {
            path: package_path.to_path_buf(),
        });
    }

    if !has_archive_extension(package_path) {
        return Err(PackageError::WrongExtension {
            path: package_path.to_path_buf(),
        });
    }

    let staging = staging_root(package_path, temp_dir);
    if staging.exists() {
        return Err(PackageError::StagingExists { path: staging });
    }
    Ok(())
}

fn resolve_node<'s>(system_definition: &'s SystemDefinition, name: &str) -> Result<&'s Node> {
    // A nameless node cannot be written to a manifest that loads again.
    if name.is_empty() {
        return Err(PackageError::EmptyNodeName);
    }
    match system_definition.count_named(name) {
        0 => Err(PackageError::UnknownNode {
            node: name.to_owned(),
        }),
        1 => system_definition
            .find_node(name)
            .ok_or_else(|| PackageError::UnknownNode {
                node: name.to_owned(),
            }),
        count => Err(PackageError::AmbiguousNode {
            node: name.to_owned(),
            count,
        }),
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
