//! Compile options.

use quill_core::{ParseOptions, TocSource};
use serde::{Deserialize, Serialize};

/// Default syntect theme for highlighted code.
pub const DEFAULT_THEME: &str = "base16-ocean.dark";

/// How heading self-links are attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AutolinkBehavior {
    /// Wrap the heading content in the anchor.
    #[default]
    Wrap,
    /// Insert an empty anchor before the content.
    Prepend,
    /// Insert an empty anchor after the content.
    Append,
    /// Assign ids only.
    Off,
}

/// Options for the standard pipeline and assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOptions {
    /// Whether code blocks are tokenized by the highlight stage.
    #[serde(default = "default_true")]
    pub highlight: bool,
    /// Syntect theme used for token colours.
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Heading self-link placement.
    #[serde(default)]
    pub autolink: AutolinkBehavior,
    /// Where the document TOC is derived from.
    #[serde(default)]
    pub toc_source: TocSource,
    /// Markdown constructs accepted in the body.
    #[serde(default)]
    pub parse: ParseOptions,
}

fn default_true() -> bool {
    true
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            highlight: default_true(),
            theme: default_theme(),
            autolink: AutolinkBehavior::default(),
            toc_source: TocSource::default(),
            parse: ParseOptions::default(),
        }
    }
}
