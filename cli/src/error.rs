//! Errors raised by the CLI before a package operation starts.

use thiserror::Error;
use xcfg::ErrorKind;
use xcfg::config::ConfigError;
use xcfg_common::SerializeError;

/// Exit status used for configuration problems (`EX_CONFIG`).
pub const CONFIG_EXIT_CODE: i32 = 78;

/// Failures preparing a build or load.
#[derive(Debug, Error)]
pub enum CliError {
    /// The configuration file is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The system definition given to `build` could not be read.
    #[error("could not read system definition: {0}")]
    SystemDefinition(#[from] SerializeError),

    /// The working directory could not be determined for config discovery.
    #[error("could not determine the current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

impl CliError {
    /// Process exit status for this failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => CONFIG_EXIT_CODE,
            Self::SystemDefinition(_) | Self::CurrentDir(_) => ErrorKind::IoFailure.code(),
        }
    }
}

/// Result type alias using [`CliError`].
pub type Result<T> = std::result::Result<T, CliError>;
