//! Table of contents derived from raw body text.
//!
//! This scan never looks at the parsed tree, so stage changes in the AST
//! pipeline cannot change the TOC.

use crate::code_fence::{FenceState, advance_fence_state};
use crate::slug::slug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static HEADING_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{2,4}) (.+)$").expect("heading pattern is valid"));

/// One TOC row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingEntry {
    /// Heading level, always within 2..=4.
    pub level: u8,
    /// Heading text as written.
    pub text: String,
    /// `#` followed by the slug of `text`.
    pub href: String,
}

impl HeadingEntry {
    /// Builds an entry whose anchor is derived from `text`.
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        let text = text.into();
        let href = format!("#{}", slug(&text));
        Self { level, text, href }
    }
}

/// Where a compiled document's TOC comes from.
///
/// The two sources agree for plain-text headings but not in general. `Text`
/// slugs the heading line as written, so inline markup and closing `#`s end
/// up in the href: `## See [docs](/docs)` yields `#see-docsdocs` and
/// `## Intro ##` yields `#intro-`, while the tree ids are `see-docs` and
/// `intro`. Pick `Tree` when every href must resolve to a rendered heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TocSource {
    /// Re-scan the body text line by line (`extract_toc`).
    #[default]
    Text,
    /// Read heading ids back from the compiled tree.
    Tree,
}

/// Collects `##`–`####` heading lines from `body`, in document order.
///
/// Lines inside fenced code blocks are skipped. Text and href come from the
/// source line, not the rendered heading; see [`TocSource`].
pub fn extract_toc(body: &str) -> Vec<HeadingEntry> {
    let mut fence = FenceState::default();
    let mut entries = Vec::new();

    for line in body.lines() {
        let outcome = advance_fence_state(line, fence);
        fence = outcome.next_state;
        if outcome.in_fence {
            continue;
        }

        let line = line.trim_end_matches('\r');
        if let Some(caps) = HEADING_LINE.captures(line) {
            let level = caps[1].len() as u8;
            let text = caps[2].trim_end();
            if !text.is_empty() {
                entries.push(HeadingEntry::new(level, text));
            }
        }
    }

    entries
}
