use crate::frontmatter::FrontmatterError;
use thiserror::Error;

/// Source location information for error reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Optional file path
    pub file: Option<String>,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            file: None,
            line,
            column,
        }
    }

    /// Create a source location with file information
    pub fn with_file(file: String, line: usize, column: usize) -> Self {
        Self {
            file: Some(file),
            line,
            column,
        }
    }

    /// Moves a body-relative location into the coordinates of the full source file.
    pub fn relocate(&mut self, file: Option<&str>, line_offset: usize) {
        if self.file.is_none() {
            self.file = file.map(str::to_string);
        }
        self.line += line_offset;
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:{}:{}", file, self.line, self.column)
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

/// Errors that abort compilation of a single document.
///
/// None of these are recoverable per node: a document either compiles
/// completely or the whole call fails.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Frontmatter block is absent, unterminated, or does not match the schema.
    #[error("Malformed frontmatter: {0}")]
    MalformedFrontmatter(#[from] FrontmatterError),
    /// A block could not be parsed or transformed (e.g. unterminated fence).
    #[error("Malformed block at {location}: {message}")]
    MalformedBlock {
        /// Error message
        message: String,
        /// Source location
        location: SourceLocation,
    },
    /// The body references a component tag missing from the registry.
    #[error("Unresolved component at {location}: <{name}>")]
    UnresolvedComponent {
        /// Component name
        name: String,
        /// Source location
        location: SourceLocation,
    },
    /// Stage list violates the raw-code ordering contract.
    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),
    /// Compile options reference something that does not exist (e.g. a theme).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// Internal logic error (unexpected state).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CompileError {
    /// Create a malformed block error with location
    pub fn malformed_block(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::MalformedBlock {
            message: message.into(),
            location: SourceLocation::new(line, column),
        }
    }

    /// Create an unresolved component error with location
    pub fn unresolved_component(name: impl Into<String>, location: SourceLocation) -> Self {
        Self::UnresolvedComponent {
            name: name.into(),
            location,
        }
    }

    /// Returns the source location carried by this error, if any.
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::MalformedBlock { location, .. } | Self::UnresolvedComponent { location, .. } => {
                Some(location)
            }
            _ => None,
        }
    }

    /// Attaches a file path and shifts line numbers by the frontmatter height.
    pub fn relocate(mut self, file: Option<&str>, line_offset: usize) -> Self {
        match &mut self {
            Self::MalformedBlock { location, .. } | Self::UnresolvedComponent { location, .. } => {
                location.relocate(file, line_offset);
            }
            _ => {}
        }
        self
    }
}
