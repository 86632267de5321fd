use crate::pipeline::{Stage, StageRole};
use crate::tree::{Element, Node, Tree};
use once_cell::sync::Lazy;
use quill_core::{CompileError, SourceLocation};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Color, FontStyle, Style, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// Tokenizes code blocks into coloured spans.
///
/// Each source line becomes `span.line[data-line]` holding one span per
/// token, with the newlines kept as text between rows so the block's text
/// content is unchanged. Languages syntect does not know fall back to plain
/// text.
#[derive(Debug, Clone, Copy)]
pub struct Highlight {
    theme: &'static Theme,
}

impl Highlight {
    /// Looks up `theme` among syntect's bundled themes.
    pub fn new(theme: &str) -> Result<Self, CompileError> {
        let theme = THEME_SET.themes.get(theme).ok_or_else(|| {
            let mut known: Vec<_> = THEME_SET.themes.keys().map(String::as_str).collect();
            known.sort_unstable();
            CompileError::InvalidConfig(format!(
                "unknown highlight theme '{theme}' (available: {})",
                known.join(", ")
            ))
        })?;
        Ok(Self { theme })
    }

    fn highlight_block(&self, pre: &mut Element) -> Result<(), CompileError> {
        let location = pre
            .position
            .clone()
            .unwrap_or_else(|| SourceLocation::new(1, 1));
        let Some(code) = pre.code_child_mut() else {
            return Ok(());
        };

        let token = language_of(code);
        let syntax = token
            .as_deref()
            .and_then(find_syntax)
            .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());
        if let Some(token) = &token
            && syntax.name == "Plain Text"
        {
            log::debug!("No syntax for '{}', highlighting as plain text", token);
        }

        let text = code.text_content();
        let mut highlighter = HighlightLines::new(syntax, self.theme);
        let mut rows = Vec::new();
        for (index, line) in LinesWithEndings::from(&text).enumerate() {
            let ranges = highlighter
                .highlight_line(line, &SYNTAX_SET)
                .map_err(|err| CompileError::MalformedBlock {
                    message: format!("failed to highlight code: {err}"),
                    location: location.clone(),
                })?;

            let tokens = ranges
                .into_iter()
                .filter_map(|(style, piece)| {
                    let piece = piece.trim_end_matches(['\n', '\r']);
                    (!piece.is_empty()).then(|| token_span(style, piece))
                })
                .collect();
            rows.push(Node::Element(
                Element::new("span")
                    .with_property("class", "line")
                    .with_property("data-line", (index + 1).to_string())
                    .with_children(tokens),
            ));
            if let Some(ending) = line_ending(line) {
                rows.push(Node::text(ending));
            }
        }
        code.children = rows;

        let language = token.unwrap_or_else(|| "plaintext".to_string());
        pre.properties.insert("data-language".to_string(), language);
        if let Some(background) = self.theme.settings.background {
            pre.properties.insert(
                "style".to_string(),
                format!("background-color:{}", hex(background)),
            );
        }
        Ok(())
    }
}

impl Stage for Highlight {
    fn name(&self) -> &'static str {
        "highlight"
    }

    fn role(&self) -> StageRole {
        StageRole::Highlight
    }

    fn apply(&self, mut tree: Tree) -> Result<Tree, CompileError> {
        tree.try_for_each_element_mut(|el| {
            if el.is_code_block() {
                self.highlight_block(el)?;
            }
            Ok(())
        })?;
        Ok(tree)
    }
}

fn language_of(code: &Element) -> Option<String> {
    code.property("class")?
        .split_whitespace()
        .find_map(|class| class.strip_prefix("language-"))
        .map(str::to_string)
}

fn find_syntax(token: &str) -> Option<&'static SyntaxReference> {
    SYNTAX_SET.find_syntax_by_token(token).or_else(|| {
        // Common aliases the default syntax set lacks.
        match token {
            "ts" | "tsx" | "jsx" | "mjs" => SYNTAX_SET.find_syntax_by_name("JavaScript"),
            "toml" => SYNTAX_SET.find_syntax_by_name("YAML"),
            "shell" | "zsh" | "console" => SYNTAX_SET.find_syntax_by_token("sh"),
            _ => None,
        }
    })
}

fn line_ending(line: &str) -> Option<&str> {
    if line.ends_with("\r\n") {
        Some("\r\n")
    } else if line.ends_with('\n') {
        Some("\n")
    } else {
        None
    }
}

fn token_span(style: Style, piece: &str) -> Node {
    let mut css = format!("color:{}", hex(style.foreground));
    if style.font_style.contains(FontStyle::BOLD) {
        css.push_str(";font-weight:bold");
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        css.push_str(";font-style:italic");
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        css.push_str(";text-decoration:underline");
    }
    Node::Element(
        Element::new("span")
            .with_property("style", css)
            .with_children(vec![Node::text(piece)]),
    )
}

fn hex(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DEFAULT_THEME;
    use crate::stages::{AttachRawCode, PreserveRawCode, compile_with};

    fn highlighted(body: &str) -> Tree {
        compile_with(
            vec![
                Box::new(PreserveRawCode),
                Box::new(Highlight::new(DEFAULT_THEME).unwrap()),
                Box::new(AttachRawCode),
            ],
            body,
        )
    }

    #[test]
    fn unknown_theme_is_config_error() {
        let err = Highlight::new("no-such-theme").unwrap_err();
        assert!(matches!(err, CompileError::InvalidConfig(ref m) if m.contains("no-such-theme")));
    }

    #[test]
    fn rows_per_line_and_text_preserved() {
        let tree = highlighted("```rust\nfn main() {\n    println!(\"hi\");\n}\n```\n");
        let block = &tree.code_blocks()[0];
        let rows: Vec<_> = block.body.iter().filter_map(Node::as_element).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].property("data-line"), Some("2"));
        assert_eq!(
            crate::tree::text_content(block.body),
            "fn main() {\n    println!(\"hi\");\n}\n"
        );
        assert_eq!(block.raw, Some("fn main() {\n    println!(\"hi\");\n}\n"));
        assert_eq!(block.language, Some("rust"));
    }

    #[test]
    fn tokens_carry_colours() {
        let tree = highlighted("```js\nconst x = 1;\n```\n");
        let spans: Vec<_> = tree
            .elements()
            .into_iter()
            .filter(|el| el.tag == "span" && el.property("style").is_some())
            .collect();
        assert!(!spans.is_empty());
        assert!(spans.iter().all(|s| s.property("style").unwrap().starts_with("color:#")));
    }

    #[test]
    fn unknown_language_falls_back() {
        let tree = highlighted("```nosuchlang\nhello\n```\n");
        let block = &tree.code_blocks()[0];
        assert_eq!(block.language, Some("nosuchlang"));
        assert_eq!(block.raw, Some("hello\n"));
        assert_eq!(crate::tree::text_content(block.body), "hello\n");
    }

    #[test]
    fn pre_gets_theme_background() {
        let tree = highlighted("```\nplain\n```\n");
        let pre = tree.elements().into_iter().find(|el| el.tag == "pre").unwrap();
        assert!(pre.property("style").unwrap().starts_with("background-color:#"));
        assert_eq!(pre.property("data-language"), Some("plaintext"));
    }
}
