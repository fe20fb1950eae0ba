//! Build and load `.xcfg` configuration packages.
//!
//! A package is a zip archive holding a small XML manifest that names the
//! target node, that node's system definition, and the device definitions
//! (an index file plus one file per device). [`build_package`] assembles
//! one from an in-memory [`SystemDefinition`](xcfg_common::SystemDefinition);
//! [`load_package`] extracts it, checks that every required member is
//! present exactly once under its expected name, and returns the parsed
//! manifest together with the paths of the definition files.
//!
//! Both operations return an [`Outcome`]: a fixed [`ErrorKind`] on failure
//! plus per-call [`Diagnostics`] carrying the error message and any
//! warnings.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//! use xcfg::{BuildRequest, PackageConfig, build_package, load_package};
//! use xcfg::manifest::Manifest;
//! use xcfg_common::{Node, SystemDefinition};
//!
//! let system = SystemDefinition::new(vec![Node::new("ECU_A", "gateway")], Vec::new());
//! let manifest = Manifest::new("ECU_A");
//! let config = PackageConfig::default();
//!
//! let package = Path::new("/tmp/42.xcfg");
//! let built = build_package(&BuildRequest::new(package, &system, &manifest), &config);
//! assert!(built.is_ok(), "{}", built.diagnostics);
//!
//! let loaded = load_package(package, Path::new("/tmp/out"), &config);
//! if let Ok(contents) = &loaded.result {
//!     assert_eq!(contents.manifest.node_name(), "ECU_A");
//! }
//! ```

pub mod archive;
pub mod builder;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod layout;
pub mod loader;
pub mod manifest;
pub mod manifest_xml;
pub mod staging;

pub use builder::{BuildRequest, PackageBuilder};
pub use config::PackageConfig;
pub use diagnostics::{Diagnostics, Outcome};
pub use error::{ErrorKind, PackageError};
pub use loader::{LoadedPackage, PackageLoader};

use std::path::{Path, PathBuf};

/// Build a package with the default codecs and serializers.
///
/// A `temp_dir` set on the request takes precedence over
/// [`PackageConfig::temp_dir`].
#[must_use]
pub fn build_package(request: &BuildRequest<'_>, config: &PackageConfig) -> Outcome<PathBuf> {
    let request = request.with_temp_dir(request.temp_dir.or(config.temp_dir.as_deref()));
    PackageBuilder::with_defaults(config).build(&request)
}

/// Load a package with the default codecs.
#[must_use]
pub fn load_package(
    package_path: &Path,
    target_dir: &Path,
    config: &PackageConfig,
) -> Outcome<LoadedPackage> {
    PackageLoader::with_defaults(config).load(package_path, target_dir)
}
