#![deny(missing_docs)]
//! quill core: slugs, frontmatter, table of contents, fence scanning and markdown parsing.

/// Fenced code block line tracking.
pub mod code_fence;
/// Raw document input.
pub mod document;
/// Core error types.
pub mod error;
/// YAML frontmatter extraction helpers.
pub mod frontmatter;
/// Markdown parsing adapter.
pub mod parse;
/// Typed frontmatter records.
pub mod schema;
/// Slug generation.
pub mod slug;
/// Text-derived table of contents.
pub mod toc;

pub use code_fence::{
    FencePhase, FenceState, LineParseOutcome, advance_fence_state, fence_interior,
};
pub use document::RawDocument;
pub use error::{CompileError, SourceLocation};
pub use frontmatter::{
    FrontmatterError, FrontmatterExtraction, ParsedDocument, extract_frontmatter,
    parse_frontmatter,
};
pub use parse::{ParseOptions, parse_mdast};
pub use schema::{Author, DocFrontmatter, FrontmatterSchema, PostFrontmatter};
pub use slug::slug;
pub use toc::{HeadingEntry, TocSource, extract_toc};
