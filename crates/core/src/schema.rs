//! Typed frontmatter records for the two content kinds.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

/// Keys every document must declare.
pub trait FrontmatterSchema {
    /// Document title.
    fn title(&self) -> &str;
    /// One-line summary.
    fn description(&self) -> &str;
}

/// Frontmatter of a docs page. Unknown keys are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocFrontmatter {
    /// Page title.
    pub title: String,
    /// Page summary.
    pub description: String,
    /// Any additional keys, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl FrontmatterSchema for DocFrontmatter {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Frontmatter of a blog post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostFrontmatter {
    /// Post title.
    pub title: String,
    /// Post summary.
    pub description: String,
    /// Publication date.
    #[serde(deserialize_with = "deserialize_date", serialize_with = "serialize_date")]
    pub date: NaiveDate,
    /// Post authors, in byline order.
    pub authors: Vec<Author>,
}

impl FrontmatterSchema for PostFrontmatter {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// A post author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    /// Avatar image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Public handle (e.g. `@someone`).
    pub handle: String,
    /// Display name.
    pub username: String,
    /// Profile link for the handle.
    pub handle_url: String,
}

/// Parses `YYYY-MM-DD` or an RFC 3339 timestamp (keeping its calendar date).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unparseable date '{raw}'")))
}

fn serialize_date<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&date.format("%Y-%m-%d"))
}
