//! Errors raised by the template merge engine

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure of a single engine operation.
///
/// Every variant names the path it failed on so the CLI can report it
/// without extra context.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A placeholder in a template has no substitution value
    #[error("Missing substitution for placeholder '{name}' in {}", template.display())]
    MissingSubstitution { name: String, template: PathBuf },

    /// The filesystem refused the operation
    #[error("Permission denied: {}", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Any other I/O failure
    #[error("I/O failure on {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Existing content could not be read as the expected document format
    #[error("Invalid structured document {}: {reason}", path.display())]
    InvalidStructuredDocument { path: PathBuf, reason: String },

    /// Target path escapes the project root
    #[error("Invalid target path '{}': must be relative and stay inside the project", path.display())]
    InvalidPath { path: PathBuf },
}

impl EngineError {
    /// Classify an I/O error for `path`
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        if source.kind() == io::ErrorKind::PermissionDenied {
            Self::PermissionDenied { path, source }
        } else {
            Self::IoFailure { path, source }
        }
    }

    pub fn invalid_document(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        Self::InvalidStructuredDocument {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Path the failure refers to
    pub fn path(&self) -> &Path {
        match self {
            Self::MissingSubstitution { template, .. } => template,
            Self::PermissionDenied { path, .. }
            | Self::IoFailure { path, .. }
            | Self::InvalidStructuredDocument { path, .. }
            | Self::InvalidPath { path } => path,
        }
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
