//! Zip archive packing and extraction for packages.
//!
//! Archives store members under `/`-separated relative names so a package
//! built on one platform extracts identically on another. Extraction
//! validates every entry path to guard against path traversal (zip-slip).

use crate::config::{ArchiveConfig, Compression};
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Packs a staging directory into an archive and extracts it again.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveCodec {
    /// Write `members` (paths relative to `root`) into a new archive at
    /// `archive_path`.
    ///
    /// On failure no archive is left at `archive_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::PathTraversal`] for members that are not
    /// plain relative paths, and [`ArchiveError::Io`] /
    /// [`ArchiveError::Zip`] when reading a member or writing the archive
    /// fails.
    fn pack(&self, root: &Path, members: &[PathBuf], archive_path: &Path)
    -> Result<(), ArchiveError>;

    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// Returns the relative paths of the extracted files.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::PathTraversal`] if any entry attempts to
    /// escape `dest_dir`, [`ArchiveError::EmptyArchive`] if no files were
    /// found, and [`ArchiveError::Io`] / [`ArchiveError::Zip`] otherwise.
    fn extract(&self, archive_path: &Path, dest_dir: &Path)
    -> Result<Vec<PathBuf>, ArchiveError>;
}

/// Errors arising from packing or extracting archives.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// I/O error while reading members or writing files.
    #[error("archive I/O error: {0}")]
    Io(#[from] io::Error),

    /// The zip library rejected the archive.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A path attempts to traverse outside its root directory.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path.
        path: String,
    },

    /// The archive contains no files.
    #[error("archive contains no files")]
    EmptyArchive,
}

/// [`ArchiveCodec`] backed by the `zip` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipCodec {
    config: ArchiveConfig,
}

impl ZipCodec {
    /// Create a codec using the given compression settings.
    #[must_use]
    pub fn new(config: ArchiveConfig) -> Self {
        Self { config }
    }

    fn file_options(&self) -> SimpleFileOptions {
        let method = match self.config.compression {
            Compression::Deflated => CompressionMethod::Deflated,
            Compression::Stored => CompressionMethod::Stored,
        };
        let level = match self.config.compression {
            Compression::Deflated => self.config.level,
            Compression::Stored => None,
        };
        SimpleFileOptions::default()
            .compression_method(method)
            .compression_level(level)
    }

    fn write_archive(
        &self,
        root: &Path,
        members: &[PathBuf],
        names: Vec<String>,
        file: fs::File,
    ) -> Result<(), ArchiveError> {
        let mut zip = ZipWriter::new(file);
        let options = self.file_options();
        for (member, name) in members.iter().zip(names) {
            zip.start_file(name, options)?;
            let mut source = fs::File::open(root.join(member))?;
            io::copy(&mut source, &mut zip)?;
        }
        zip.finish()?;
        Ok(())
    }
}

impl ArchiveCodec for ZipCodec {
    fn pack(
        &self,
        root: &Path,
        members: &[PathBuf],
        archive_path: &Path,
    ) -> Result<(), ArchiveError> {
        let names = members
            .iter()
            .map(|member| entry_name(member))
            .collect::<Result<Vec<_>, _>>()?;

        // Never truncate or later discard a file this call did not create.
        let file = fs::File::create_new(archive_path)?;
        let result = self.write_archive(root, members, names, file);
        match &result {
            Ok(()) => debug!(
                "packed {} member(s) into {}",
                members.len(),
                archive_path.display()
            ),
            Err(_) => discard_partial(archive_path),
        }
        result
    }

    fn extract(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, ArchiveError> {
        let mut archive = ZipArchive::new(fs::File::open(archive_path)?)?;
        let mut extracted = Vec::new();

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let entry_path = PathBuf::from(entry.name());
            validate_entry_path(&entry_path)?;

            let dest_path = dest_dir.join(&entry_path);
            if entry.is_dir() {
                fs::create_dir_all(&dest_path)?;
                continue;
            }
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = fs::File::create(&dest_path)?;
            io::copy(&mut entry, &mut out)?;
            extracted.push(entry_path);
        }

        if extracted.is_empty() {
            return Err(ArchiveError::EmptyArchive);
        }
        debug!(
            "extracted {} file(s) from {} into {}",
            extracted.len(),
            archive_path.display(),
            dest_dir.display()
        );
        Ok(extracted)
    }
}

/// Remove a partially written archive so a failed pack leaves nothing
/// behind at the target path.
fn discard_partial(archive_path: &Path) {
    match fs::remove_file(archive_path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            "could not remove partial archive {}: {e}",
            archive_path.display()
        ),
    }
}

/// Convert a relative member path into a `/`-separated entry name.
fn entry_name(member: &Path) -> Result<String, ArchiveError> {
    validate_entry_path(member)?;
    let parts: Vec<String> = member
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        return Err(ArchiveError::PathTraversal {
            path: member.display().to_string(),
        });
    }
    Ok(parts.join("/"))
}

/// Validate that a path does not escape its root via `..` components or
/// absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ArchiveError> {
    let escapes = path.is_absolute()
        || path.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
    if escapes {
        return Err(ArchiveError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}
