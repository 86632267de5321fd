use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Raw frontmatter mapping plus the offset where the body begins.
#[derive(Debug)]
pub struct FrontmatterExtraction {
    /// Parsed frontmatter as a JSON value (always an object).
    pub value: JsonValue,
    /// Byte offset inside the original document where Markdown content begins.
    pub body_start: usize,
}

impl FrontmatterExtraction {
    fn empty() -> Self {
        Self {
            value: JsonValue::Object(Default::default()),
            body_start: 0,
        }
    }
}

/// A document split into its decoded frontmatter and its body text.
#[derive(Debug)]
pub struct ParsedDocument<'a, F> {
    /// Typed frontmatter record.
    pub frontmatter: F,
    /// Markdown body following the frontmatter block.
    pub body: &'a str,
    /// Byte offset of `body` inside the original input.
    pub body_start: usize,
}

impl<F> ParsedDocument<'_, F> {
    /// Number of source lines consumed by the frontmatter block.
    pub fn body_line_offset(&self, input: &str) -> usize {
        input[..self.body_start].matches('\n').count()
    }
}

/// Errors emitted while parsing or extracting frontmatter.
#[derive(Debug, Error)]
pub enum FrontmatterError {
    /// Unclosed YAML fence (e.g., missing terminating `---`).
    #[error("Unterminated YAML frontmatter block: expected closing '---'")]
    Unterminated,
    /// YAML failed to parse.
    #[error("Frontmatter parse error: {0}")]
    Parse(String),
    /// Top-level YAML node was not a mapping.
    #[error("Frontmatter must be a YAML mapping at the top level")]
    InvalidRootType,
    /// The mapping does not match the declared schema (missing key, wrong type).
    #[error("Frontmatter does not match schema: {0}")]
    Schema(String),
}

/// Extracts YAML frontmatter from an input document.
pub fn extract_frontmatter(input: &str) -> Result<FrontmatterExtraction, FrontmatterError> {
    match find_yaml_block(input)? {
        Some((block, body_start)) => {
            let value = parse_yaml_block(&block)?;
            Ok(FrontmatterExtraction { value, body_start })
        }
        None => Ok(FrontmatterExtraction::empty()),
    }
}

/// Splits `input` and decodes its frontmatter into `F`.
///
/// A document without a frontmatter block decodes from an empty mapping, so
/// any schema with required keys rejects it.
pub fn parse_frontmatter<F: DeserializeOwned>(
    input: &str,
) -> Result<ParsedDocument<'_, F>, FrontmatterError> {
    let FrontmatterExtraction { value, body_start } = extract_frontmatter(input)?;
    let frontmatter =
        serde_json::from_value(value).map_err(|err| FrontmatterError::Schema(err.to_string()))?;
    Ok(ParsedDocument {
        frontmatter,
        body: &input[body_start..],
        body_start,
    })
}

fn parse_yaml_block(block: &str) -> Result<JsonValue, FrontmatterError> {
    if block.trim().is_empty() {
        return Ok(JsonValue::Object(Default::default()));
    }

    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(block).map_err(|err| FrontmatterError::Parse(err.to_string()))?;
    let json_value =
        serde_json::to_value(yaml_value).map_err(|err| FrontmatterError::Parse(err.to_string()))?;

    match json_value {
        JsonValue::Null => Ok(JsonValue::Object(Default::default())),
        JsonValue::Object(_) => Ok(json_value),
        _ => Err(FrontmatterError::InvalidRootType),
    }
}

fn find_yaml_block(input: &str) -> Result<Option<(String, usize)>, FrontmatterError> {
    let bom_len = if input.starts_with(BOM) { BOM.len_utf8() } else { 0 };
    let text = &input[bom_len..];
    let mut lines = lines_with_ends(text).skip_while(|(line, _)| line.trim().is_empty());

    let block_start = match lines.next() {
        Some((opener, end)) if opener == FENCE => end,
        _ => return Ok(None),
    };

    let mut block_end = block_start;
    for (line, end) in lines {
        if line == FENCE {
            let block = text[block_start..block_end].trim_end_matches(['\r', '\n']);
            return Ok(Some((block.to_string(), bom_len + end)));
        }
        block_end = end;
    }
    Err(FrontmatterError::Unterminated)
}

const BOM: char = '\u{feff}';
const FENCE: &str = "---";

/// Each line without its terminator, paired with the offset just past it.
fn lines_with_ends(text: &str) -> impl Iterator<Item = (&str, usize)> {
    text.split_inclusive('\n').scan(0, |offset, line| {
        *offset += line.len();
        Some((line.trim_end_matches(['\n', '\r']), *offset))
    })
}
