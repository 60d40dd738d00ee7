//! Error taxonomy for the packaging pipeline.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::FunctionRole;

/// Result type alias for packaging operations.
pub type PackResult<T> = Result<T, PackError>;

/// Errors that can occur while planning or materializing a deployment bundle.
#[derive(Debug, Error)]
pub enum PackError {
    /// Unsupported build mode, disallowed source extension, or colliding
    /// function paths. Always fatal and raised before any output is written.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A declared resource is missing on storage.
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// One or more functions failed to bundle. Sibling outputs that
    /// succeeded are left on disk.
    #[error("{} function(s) failed to bundle:\n{}", .failures.len(), render_failures(.failures))]
    Bundling { failures: Vec<BundlingFailure> },

    /// A previously persisted manifest could not be parsed.
    #[error("manifest parse error: {0}")]
    ManifestParse(String),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PackError {
    pub fn config(msg: impl Into<String>) -> Self {
        PackError::Configuration(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PackError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error aborts a run. Missing middleware and unreadable
    /// manifests degrade instead.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            PackError::ResourceUnavailable(_) | PackError::ManifestParse(_)
        )
    }
}

/// A single function that did not make it through the bundler.
#[derive(Debug, Clone)]
pub struct BundlingFailure {
    pub source_path: PathBuf,
    pub role: FunctionRole,
    pub message: String,
}

impl fmt::Display for BundlingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {}",
            self.role,
            self.source_path.display(),
            self.message
        )
    }
}

fn render_failures(failures: &[BundlingFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("  - {f}"))
        .collect::<Vec<_>>()
        .join("\n")
}
