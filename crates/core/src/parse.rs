//! markdown-rs adapter.

use crate::{CompileError, SourceLocation};
use markdown::mdast::Node;
use markdown::message::{Message, Place};
use serde::{Deserialize, Serialize};

/// Which markdown constructs the body parser accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOptions {
    /// Enable GitHub Flavored Markdown constructs.
    #[serde(default = "default_true")]
    pub gfm: bool,
    /// Enable JSX component tags (`<Callout>` …).
    #[serde(default = "default_true")]
    pub jsx: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            jsx: true,
        }
    }
}

impl ParseOptions {
    /// Convert to markdown-rs `ParseOptions`.
    ///
    /// Indented code is off: component children are routinely indented and
    /// must stay prose. Raw HTML, MDX expressions and ESM are never enabled,
    /// the body is prose plus registered tags only. Frontmatter is stripped
    /// before parsing, so that construct is off too.
    pub fn to_markdown(self) -> markdown::ParseOptions {
        let mut constructs = markdown::Constructs {
            code_indented: false,
            frontmatter: false,
            html_flow: false,
            html_text: false,
            ..Default::default()
        };

        if self.gfm {
            constructs.gfm_autolink_literal = true;
            constructs.gfm_footnote_definition = true;
            constructs.gfm_label_start_footnote = true;
            constructs.gfm_strikethrough = true;
            constructs.gfm_table = true;
            constructs.gfm_task_list_item = true;
        }

        if self.jsx {
            constructs.mdx_jsx_flow = true;
            constructs.mdx_jsx_text = true;
        }

        markdown::ParseOptions {
            constructs,
            ..markdown::ParseOptions::default()
        }
    }
}

/// Parse a markdown body into an MDAST tree.
pub fn parse_mdast(input: &str, options: &ParseOptions) -> Result<Node, CompileError> {
    markdown::to_mdast(input, &options.to_markdown()).map_err(|err| CompileError::MalformedBlock {
        message: err.reason.clone(),
        location: message_location(&err),
    })
}

fn message_location(message: &Message) -> SourceLocation {
    match &message.place {
        Some(place) => match place.as_ref() {
            Place::Point(point) => SourceLocation::new(point.line, point.column),
            Place::Position(position) => {
                SourceLocation::new(position.start.line, position.start.column)
            }
        },
        None => SourceLocation::new(1, 1),
    }
}
