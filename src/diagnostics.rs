//! Per-call diagnostics returned by package operations.
//!
//! Every public operation starts from an empty [`Diagnostics`] value and
//! returns it fully populated inside an [`Outcome`]. The primary error and
//! the warnings occupy separate slots, so a failed cleanup can never replace
//! the error that caused the operation to fail.

use crate::error::{ErrorKind, PackageError};
use log::error;
use std::fmt;

/// Ordered warnings plus an optional error message for one call.
///
/// # Examples
///
/// ```
/// use xcfg::Diagnostics;
///
/// let mut diagnostics = Diagnostics::new();
/// diagnostics.push_warning("staging directory left behind");
/// assert_eq!(diagnostics.warnings(), ["staging directory left behind"]);
/// assert!(diagnostics.error().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    warnings: Vec<String>,
    error: Option<String>,
}

impl Diagnostics {
    /// Create an empty diagnostics value.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a warning.
    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Record the primary error. The first error recorded wins.
    pub fn set_error(&mut self, message: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(message.into());
        }
    }

    /// Return the warnings in the order they were raised.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Return the primary error message, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Return `true` when there are neither warnings nor an error.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.error.is_none()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let lines = self
            .warnings
            .iter()
            .map(|w| ("warning", w.as_str()))
            .chain(self.error.as_deref().map(|e| ("error", e)));
        for (level, text) in lines {
            if !first {
                writeln!(f)?;
            }
            write!(f, "{level}: {text}")?;
            first = false;
        }
        Ok(())
    }
}

/// Result of a public package operation.
///
/// `result` carries either the value or the fixed [`ErrorKind`]; the
/// human-readable detail lives in `diagnostics`.
#[derive(Debug)]
pub struct Outcome<T> {
    /// The operation result.
    pub result: Result<T, ErrorKind>,
    /// Warnings and the error message collected during the call.
    pub diagnostics: Diagnostics,
}

impl<T> Outcome<T> {
    /// Close an operation: log and record a failure, or pass a value through.
    ///
    /// `use_case` becomes the log target of the error record.
    pub(crate) fn finish(
        use_case: &str,
        result: Result<T, PackageError>,
        mut diagnostics: Diagnostics,
    ) -> Self {
        let result = result.map_err(|failure| {
            let message = failure.to_string();
            error!(target: use_case, "{message}");
            diagnostics.set_error(message);
            failure.kind()
        });
        Self {
            result,
            diagnostics,
        }
    }

    /// Return `true` if the operation succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Numeric status: `0` on success, otherwise [`ErrorKind::code`].
    #[must_use]
    pub fn status_code(&self) -> i32 {
        match &self.result {
            Ok(_) => 0,
            Err(kind) => kind.code(),
        }
    }
}
