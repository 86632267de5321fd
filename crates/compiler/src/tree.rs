//! The compiled document tree.
//!
//! A small hast-like structure: HTML elements, registered components and
//! text. Stages rewrite it; the renderer and the "copy code" consumer read it.

use quill_core::{CompileError, HeadingEntry, SourceLocation};
use serde::Serialize;
use std::collections::BTreeMap;

/// A component prop value - either a literal string or a JS expression.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PropValue {
    /// A literal string value (from key="value").
    Literal {
        /// Attribute text.
        value: String,
    },
    /// An expression (from key={expression}), kept as source text.
    Expression {
        /// Expression source.
        value: String,
    },
}

impl PropValue {
    /// Creates a literal string prop value.
    pub fn literal(value: impl Into<String>) -> Self {
        PropValue::Literal {
            value: value.into(),
        }
    }

    /// Creates an expression prop value.
    pub fn expression(value: impl Into<String>) -> Self {
        PropValue::Expression {
            value: value.into(),
        }
    }

    /// Returns the raw value regardless of type.
    pub fn value(&self) -> &str {
        match self {
            PropValue::Literal { value } | PropValue::Expression { value } => value,
        }
    }

    /// Returns true if this is an expression.
    pub fn is_expression(&self) -> bool {
        matches!(self, PropValue::Expression { .. })
    }
}

/// Stage-private annotations. Never serialized or rendered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeData {
    /// Fence interior exactly as written in the body, set during lowering.
    pub fence_source: Option<String>,
    /// Literal code text captured before highlighting.
    pub raw_text: Option<String>,
}

/// An HTML element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    /// Tag name (`p`, `h2`, `pre`, …).
    pub tag: String,
    /// Attributes, rendered in key order.
    pub properties: BTreeMap<String, String>,
    /// Child nodes.
    pub children: Vec<Node>,
    /// Side channel for stages.
    #[serde(skip)]
    pub data: NodeData,
    /// Where the element starts in the body.
    #[serde(skip)]
    pub position: Option<SourceLocation>,
}

impl Element {
    /// Creates an element with no attributes or children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            properties: BTreeMap::new(),
            children: Vec::new(),
            data: NodeData::default(),
            position: None,
        }
    }

    /// Builder-style attribute setter.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Builder-style child list setter.
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Returns an attribute value.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Heading level for `h1`..`h6`.
    pub fn heading_level(&self) -> Option<u8> {
        match self.tag.as_str() {
            "h1" => Some(1),
            "h2" => Some(2),
            "h3" => Some(3),
            "h4" => Some(4),
            "h5" => Some(5),
            "h6" => Some(6),
            _ => None,
        }
    }

    /// A fenced code block is a `pre` whose first element child is `code`.
    pub fn is_code_block(&self) -> bool {
        self.tag == "pre" && self.code_child().is_some()
    }

    /// The `code` child of a `pre`.
    pub fn code_child(&self) -> Option<&Element> {
        self.children.iter().find_map(|child| match child {
            Node::Element(el) if el.tag == "code" => Some(el),
            _ => None,
        })
    }

    /// Mutable access to the `code` child of a `pre`.
    pub fn code_child_mut(&mut self) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|child| match child {
            Node::Element(el) if el.tag == "code" => Some(el),
            _ => None,
        })
    }

    /// Concatenated text of every descendant.
    pub fn text_content(&self) -> String {
        text_content(&self.children)
    }
}

/// A reference to a registered interactive component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    /// Tag name as written (e.g. `Callout`, `Tabs.Item`).
    pub name: String,
    /// Props from the tag's attributes.
    pub props: BTreeMap<String, PropValue>,
    /// Slot content.
    pub children: Vec<Node>,
    /// Where the tag starts in the body.
    #[serde(skip)]
    pub position: Option<SourceLocation>,
}

/// A node in the compiled tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    /// HTML element.
    Element(Element),
    /// Registered component.
    Component(Component),
    /// Text, unescaped.
    Text {
        /// Text value.
        value: String,
    },
}

impl Node {
    /// Creates a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text {
            value: value.into(),
        }
    }

    /// Returns the element if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Element(el) => Some(&mut el.children),
            Node::Component(c) => Some(&mut c.children),
            Node::Text { .. } => None,
        }
    }
}

/// Concatenated text of a node list.
pub fn text_content(nodes: &[Node]) -> String {
    let mut out = String::new();
    collect_text(nodes, &mut out);
    out
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text { value } => out.push_str(value),
            Node::Element(el) => collect_text(&el.children, out),
            Node::Component(c) => collect_text(&c.children, out),
        }
    }
}

/// Read-only view of one compiled fenced code block.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlockView<'a> {
    /// Language token, if any.
    pub language: Option<&'a str>,
    /// Title lifted from the fence annotation.
    pub title: Option<&'a str>,
    /// Exact fence interior, as exposed through the `raw` property.
    pub raw: Option<&'a str>,
    /// Rendered body of the `code` element (possibly tokenized).
    pub body: &'a [Node],
}

/// Root of a compiled document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tree {
    /// Top-level nodes.
    pub children: Vec<Node>,
}

impl Tree {
    /// Creates a tree from top-level nodes.
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    /// Visits every element pre-order, including those inside components.
    ///
    /// The callback may rewrite the element's children; the walk descends
    /// into whatever children are present after the callback returns.
    pub fn try_for_each_element_mut<F>(&mut self, mut f: F) -> Result<(), CompileError>
    where
        F: FnMut(&mut Element) -> Result<(), CompileError>,
    {
        fn walk<F>(nodes: &mut [Node], f: &mut F) -> Result<(), CompileError>
        where
            F: FnMut(&mut Element) -> Result<(), CompileError>,
        {
            for node in nodes {
                if let Node::Element(el) = node {
                    f(el)?;
                }
                if let Some(children) = node.children_mut() {
                    walk(children, f)?;
                }
            }
            Ok(())
        }
        walk(&mut self.children, &mut f)
    }

    /// Visits every node pre-order.
    pub fn try_for_each_node<F>(&self, mut f: F) -> Result<(), CompileError>
    where
        F: FnMut(&Node) -> Result<(), CompileError>,
    {
        fn walk<F>(nodes: &[Node], f: &mut F) -> Result<(), CompileError>
        where
            F: FnMut(&Node) -> Result<(), CompileError>,
        {
            for node in nodes {
                f(node)?;
                match node {
                    Node::Element(el) => walk(&el.children, f)?,
                    Node::Component(c) => walk(&c.children, f)?,
                    Node::Text { .. } => {}
                }
            }
            Ok(())
        }
        walk(&self.children, &mut f)
    }

    /// All elements, pre-order.
    pub fn elements(&self) -> Vec<&Element> {
        fn walk<'a>(nodes: &'a [Node], out: &mut Vec<&'a Element>) {
            for node in nodes {
                match node {
                    Node::Element(el) => {
                        out.push(el);
                        walk(&el.children, out);
                    }
                    Node::Component(c) => walk(&c.children, out),
                    Node::Text { .. } => {}
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.children, &mut out);
        out
    }

    /// Every fenced code block in document order.
    pub fn code_blocks(&self) -> Vec<CodeBlockView<'_>> {
        self.elements()
            .into_iter()
            .filter(|el| el.is_code_block())
            .filter_map(|pre| {
                let code = pre.code_child()?;
                let language = pre.property("data-language").or_else(|| {
                    code.property("class")
                        .and_then(|class| class.split_whitespace().find_map(|c| c.strip_prefix("language-")))
                });
                Some(CodeBlockView {
                    language,
                    title: pre.property("data-title"),
                    raw: pre.property("raw"),
                    body: &code.children,
                })
            })
            .collect()
    }

    /// Headings with an assigned id whose level falls in 2..=4.
    ///
    /// This reads the tree after the heading-id stage and is independent of
    /// the text scan in `quill_core::toc`.
    pub fn headings(&self) -> Vec<HeadingEntry> {
        self.elements()
            .into_iter()
            .filter_map(|el| {
                let level = el.heading_level().filter(|l| (2..=4).contains(l))?;
                let id = el.property("id")?;
                Some(HeadingEntry {
                    level,
                    text: el.text_content().trim().to_string(),
                    href: format!("#{id}"),
                })
            })
            .collect()
    }
}
