//! HTML serialization of a compiled tree.

use crate::registry::ComponentRegistry;
use crate::tree::{Component, Element, Node, PropValue, Tree};
use quill_core::{CompileError, SourceLocation};
use std::collections::BTreeMap;

const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input"];

const BLOCK_ELEMENTS: &[&str] = &[
    "blockquote", "div", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "ol", "p", "pre",
    "section", "table", "tbody", "thead", "tr", "ul",
];

/// Serializes `tree` to HTML.
///
/// Components render as the element their binding names, with the tag name
/// in `data-component`; literal props become attributes and expression props
/// become `data-expr-*` attributes holding the expression source. The
/// preserved-raw side channel is never written out.
pub fn to_html(tree: &Tree, registry: &ComponentRegistry) -> Result<String, CompileError> {
    let mut renderer = Renderer {
        registry,
        output: String::with_capacity(256),
    };
    renderer.render_nodes(&tree.children)?;
    Ok(renderer.output)
}

struct Renderer<'a> {
    registry: &'a ComponentRegistry,
    output: String,
}

impl Renderer<'_> {
    fn render_nodes(&mut self, nodes: &[Node]) -> Result<(), CompileError> {
        for node in nodes {
            match node {
                Node::Text { value } => self.output.push_str(&html_escape::encode_text(value)),
                Node::Element(el) => self.render_element(el)?,
                Node::Component(component) => self.render_component(component)?,
            }
        }
        Ok(())
    }

    fn render_element(&mut self, el: &Element) -> Result<(), CompileError> {
        self.open_tag(&el.tag, el.properties.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if VOID_ELEMENTS.contains(&el.tag.as_str()) {
            self.block_break(&el.tag);
            return Ok(());
        }
        self.render_nodes(&el.children)?;
        self.close_tag(&el.tag);
        Ok(())
    }

    fn render_component(&mut self, component: &Component) -> Result<(), CompileError> {
        let Some(binding) = self.registry.resolve(&component.name) else {
            let location = component
                .position
                .clone()
                .unwrap_or_else(|| SourceLocation::new(1, 1));
            return Err(CompileError::unresolved_component(&component.name, location));
        };

        let mut attrs = BTreeMap::new();
        attrs.insert("data-component".to_string(), component.name.clone());
        for (name, value) in &component.props {
            match value {
                PropValue::Literal { value } => attrs.insert(name.clone(), value.clone()),
                PropValue::Expression { value } => {
                    attrs.insert(format!("data-expr-{name}"), value.clone())
                }
            };
        }

        let tag = binding.element.clone();
        self.open_tag(&tag, attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        self.render_nodes(&component.children)?;
        self.output.push_str("</");
        self.output.push_str(&tag);
        self.output.push_str(">\n");
        Ok(())
    }

    fn open_tag<'p>(&mut self, tag: &str, attrs: impl Iterator<Item = (&'p str, &'p str)>) {
        self.output.push('<');
        self.output.push_str(tag);
        for (name, value) in attrs {
            self.output.push(' ');
            self.output.push_str(name);
            if !value.is_empty() {
                self.output.push_str("=\"");
                self.output
                    .push_str(&html_escape::encode_double_quoted_attribute(value));
                self.output.push('"');
            }
        }
        self.output.push('>');
    }

    fn close_tag(&mut self, tag: &str) {
        self.output.push_str("</");
        self.output.push_str(tag);
        self.output.push('>');
        self.block_break(tag);
    }

    fn block_break(&mut self, tag: &str) {
        if BLOCK_ELEMENTS.contains(&tag) {
            self.output.push('\n');
        }
    }
}
