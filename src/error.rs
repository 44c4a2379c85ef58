//! Error types shared by parsers, generators and the profile registry.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Coarse classification of a [`ConvertError`], for callers that need to
/// branch on the failure without looking at the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    UnsupportedFormat,
    MalformedDocument,
    Io,
    InvalidState,
}

/// Errors that can occur while parsing, resolving or generating presets.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Input file or directory does not exist.
    #[error("{what} not found: {}", path.display())]
    NotFound { what: &'static str, path: PathBuf },

    /// Recognized container but unhandled extension or sub-format.
    #[error("Unsupported {what}: {detail}")]
    UnsupportedFormat { what: &'static str, detail: String },

    /// Descriptor bytes are not an object, or required fields are missing.
    #[error("{message}: {}", path.display())]
    MalformedDocument { message: String, path: PathBuf },

    /// Read or write failed at the transport level.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Operation attempted on a preset that is not usable.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl ConvertError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::MalformedDocument { .. } => ErrorKind::MalformedDocument,
            Self::Io { .. } => ErrorKind::Io,
            Self::InvalidState(_) => ErrorKind::InvalidState,
        }
    }

    /// Create a not-found error for `path`.
    pub fn not_found(what: &'static str, path: impl AsRef<Path>) -> Self {
        Self::NotFound {
            what,
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create an unsupported-format error.
    pub fn unsupported(what: &'static str, detail: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            what,
            detail: detail.into(),
        }
    }

    /// Create a malformed-document error naming the offending file.
    pub fn malformed(message: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self::MalformedDocument {
            message: message.into(),
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Wrap an I/O error with a description of what was being done.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;
