use std::path::{Path, PathBuf};

/// A document's source text as read from storage.
///
/// Immutable once read; created per build step and dropped after compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    source_text: String,
    source_path: PathBuf,
}

impl RawDocument {
    /// Wraps source text read from `source_path`.
    pub fn new(source_text: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_text: source_text.into(),
            source_path: source_path.into(),
        }
    }

    /// Full source, frontmatter included.
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Where the source was read from.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }
}
