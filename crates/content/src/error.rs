use quill_core::CompileError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while locating, reading or compiling collection documents.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No file backs the requested id.
    #[error("No document with id '{id}'")]
    MissingDocument {
        /// Requested id.
        id: String,
    },
    /// The collection root directory does not exist.
    #[error("Content root does not exist: {}", path.display())]
    MissingRoot {
        /// Configured root.
        path: PathBuf,
    },
    /// Reading a file or directory failed.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// A document was read but failed to compile.
    #[error("Failed to compile '{id}': {source}")]
    Compile {
        /// Document id.
        id: String,
        /// Underlying compile error.
        source: CompileError,
    },
    /// Content configuration is unreadable or invalid.
    #[error("Invalid content configuration: {0}")]
    Config(String),
}

impl LoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for [`LoadError::MissingDocument`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MissingDocument { .. })
    }
}
