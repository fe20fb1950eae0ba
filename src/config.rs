//! Package engine configuration.
//!
//! Settings live in an optional `xcfg.toml`. Every field has a default, so
//! an absent file and an empty file behave the same.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up by [`PackageConfig::discover`].
pub const CONFIG_FILE: &str = "xcfg.toml";

/// Highest deflate level accepted in `archive.level`.
pub const MAX_COMPRESSION_LEVEL: i64 = 9;

/// Engine settings shared by builds and loads.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PackageConfig {
    /// Directory in which staging directories are created.
    ///
    /// When unset the staging directory sits next to the package.
    pub temp_dir: Option<PathBuf>,
    /// Archive compression settings.
    pub archive: ArchiveConfig,
}

/// Compression applied to archive members.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Compression method.
    pub compression: Compression,
    /// Deflate level from 0 to 9; `None` uses the library default.
    pub level: Option<i64>,
}

/// Supported archive compression methods.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Deflate compression.
    #[default]
    Deflated,
    /// No compression.
    Stored,
}

/// Failures loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    Read {
        /// The configuration path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML for [`PackageConfig`].
    #[error("failed to parse configuration {path}: {source}")]
    Parse {
        /// The configuration path.
        path: PathBuf,
        /// The TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// `archive.level` is outside `0..=9`.
    #[error("compression level {level} is out of range 0..={max}", max = MAX_COMPRESSION_LEVEL)]
    InvalidLevel {
        /// The rejected level.
        level: i64,
    },
}

impl PackageConfig {
    /// Read and validate the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, does not parse,
    /// or carries an out-of-range compression level.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load_with(|| {
            toml::from_str(&source).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
        })
    }

    /// Read `xcfg.toml` from `dir` when present, otherwise return defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but is invalid.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            log::debug!("using configuration {}", candidate.display());
            Self::load_from(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration using the supplied loader, then validate it.
    ///
    /// Lets tests inject settings without touching the filesystem.
    ///
    /// # Examples
    ///
    /// ```
    /// use xcfg::config::{Compression, PackageConfig};
    ///
    /// let config = PackageConfig::load_with(|| Ok(PackageConfig::default()))
    ///     .expect("defaults are valid");
    /// assert_eq!(config.archive.compression, Compression::Deflated);
    /// ```
    ///
    /// # Errors
    ///
    /// Propagates the loader's error, or returns
    /// [`ConfigError::InvalidLevel`] for an out-of-range level.
    pub fn load_with<F>(loader: F) -> Result<Self, ConfigError>
    where
        F: FnOnce() -> Result<Self, ConfigError>,
    {
        let config = loader()?;
        config.archive.validate()?;
        Ok(config)
    }
}

impl ArchiveConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self.level {
            Some(level) if !(0..=MAX_COMPRESSION_LEVEL).contains(&level) => {
                Err(ConfigError::InvalidLevel { level })
            }
            _ => Ok(()),
        }
    }
}
