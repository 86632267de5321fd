//! Lowers a markdown-rs MDAST into the compiled [`Tree`].

use crate::tree::{Component, Element, Node, PropValue, Tree};
use markdown::mdast::{self, AlignKind, AttributeContent, AttributeValue, Node as Md};
use quill_core::{CompileError, SourceLocation, fence_interior};
use std::collections::{BTreeMap, HashMap};

/// Converts a parsed body into the element tree the stages operate on.
///
/// `source` must be the text `root` was parsed from. Fenced code becomes
/// `pre > code` with the block's text plus a final newline. The language goes
/// in a `language-*` class and the meta string in `data-meta` on the `pre`;
/// the interior as written in `source` is kept in
/// [`NodeData::fence_source`](crate::tree::NodeData).
///
/// Fails with `MalformedBlock` when a fence is closed only by the end of its
/// list item, block quote, or the document.
pub fn lower(root: &Md, source: &str) -> Result<Tree, CompileError> {
    let mut lowering = Lowering::new(source);
    lowering.collect_definitions(root);

    let mut children = match root {
        Md::Root(root) => lowering.lower_all(&root.children),
        other => lowering.lower_node(other),
    };
    if let Some(section) = lowering.footnote_section() {
        children.push(Node::Element(section));
    }
    match lowering.unclosed {
        Some(err) => Err(err),
        None => Ok(Tree::new(children)),
    }
}

struct Lowering<'a> {
    source: &'a str,
    definitions: HashMap<String, (String, Option<String>)>,
    footnote_defs: HashMap<String, &'a mdast::FootnoteDefinition>,
    footnote_order: Vec<String>,
    /// Bytes of list item and block quote prefix on each line of the
    /// content currently being lowered.
    container: usize,
    /// First fence found without a closing delimiter.
    unclosed: Option<CompileError>,
}

impl<'a> Lowering<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            definitions: HashMap::new(),
            footnote_defs: HashMap::new(),
            footnote_order: Vec::new(),
            container: 0,
            unclosed: None,
        }
    }

    fn collect_definitions(&mut self, node: &'a Md) {
        match node {
            Md::Definition(def) => {
                self.definitions
                    .entry(def.identifier.clone())
                    .or_insert_with(|| (def.url.clone(), def.title.clone()));
            }
            Md::FootnoteDefinition(def) => {
                self.footnote_defs.entry(def.identifier.clone()).or_insert(def);
            }
            _ => {}
        }
        if let Some(children) = node.children() {
            for child in children {
                self.collect_definitions(child);
            }
        }
    }

    fn lower_all(&mut self, nodes: &'a [Md]) -> Vec<Node> {
        nodes.iter().flat_map(|node| self.lower_node(node)).collect()
    }

    fn lower_node(&mut self, node: &'a Md) -> Vec<Node> {
        let position = location_of(node);
        let element_position = position.clone();
        let element = move |tag: &str, children: Vec<Node>| {
            let mut el = Element::new(tag).with_children(children);
            el.position = element_position.clone();
            vec![Node::Element(el)]
        };

        match node {
            Md::Root(root) => self.lower_all(&root.children),
            Md::Text(text) => vec![Node::text(&text.value)],
            Md::Paragraph(p) => {
                let children = self.lower_all(&p.children);
                element("p", children)
            }
            Md::Heading(h) => {
                let tag = format!("h{}", h.depth.clamp(1, 6));
                let children = self.lower_all(&h.children);
                element(&tag, children)
            }
            Md::Strong(n) => {
                let children = self.lower_all(&n.children);
                element("strong", children)
            }
            Md::Emphasis(n) => {
                let children = self.lower_all(&n.children);
                element("em", children)
            }
            Md::Delete(n) => {
                let children = self.lower_all(&n.children);
                element("del", children)
            }
            Md::InlineCode(code) => element("code", vec![Node::text(&code.value)]),
            Md::Break(_) => element("br", Vec::new()),
            Md::ThematicBreak(_) => element("hr", Vec::new()),
            Md::Blockquote(q) => {
                let outer = self.container;
                if let Some(width) = self.quote_width(q) {
                    self.container = width;
                }
                let children = self.lower_all(&q.children);
                self.container = outer;
                element("blockquote", children)
            }
            Md::Code(code) => vec![Node::Element(self.lower_code(code, position))],
            Md::List(list) => vec![Node::Element(self.lower_list(list, position))],
            Md::ListItem(item) => vec![Node::Element(self.lower_list_item(item, true))],
            Md::Link(link) => {
                let children = self.lower_all(&link.children);
                let mut a = Element::new("a")
                    .with_property("href", &link.url)
                    .with_children(children);
                if let Some(title) = &link.title {
                    a.properties.insert("title".into(), title.clone());
                }
                a.position = position;
                vec![Node::Element(a)]
            }
            Md::LinkReference(link) => {
                let children = self.lower_all(&link.children);
                match self.definitions.get(&link.identifier) {
                    Some((url, title)) => {
                        let mut a = Element::new("a")
                            .with_property("href", url)
                            .with_children(children);
                        if let Some(title) = title {
                            a.properties.insert("title".into(), title.clone());
                        }
                        vec![Node::Element(a)]
                    }
                    None => children,
                }
            }
            Md::Image(img) => vec![Node::Element(image(&img.url, &img.alt, img.title.as_deref()))],
            Md::ImageReference(img) => match self.definitions.get(&img.identifier) {
                Some((url, title)) => vec![Node::Element(image(url, &img.alt, title.as_deref()))],
                None => vec![Node::text(&img.alt)],
            },
            Md::Table(table) => vec![Node::Element(self.lower_table(table))],
            Md::FootnoteReference(fnref) => vec![Node::Element(self.footnote_ref(fnref))],
            Md::MdxJsxFlowElement(el) => {
                self.lower_jsx(el.name.as_deref(), &el.attributes, &el.children, position)
            }
            Md::MdxJsxTextElement(el) => {
                self.lower_jsx(el.name.as_deref(), &el.attributes, &el.children, position)
            }
            // Collected up front; rendered where referenced.
            Md::Definition(_) | Md::FootnoteDefinition(_) => Vec::new(),
            Md::Yaml(_) | Md::Toml(_) => Vec::new(),
            other => {
                log::warn!("Unhandled markdown node type: {:?}", other);
                Vec::new()
            }
        }
    }

    fn lower_list(&mut self, list: &'a mdast::List, position: Option<SourceLocation>) -> Element {
        let loose = list.spread
            || list
                .children
                .iter()
                .any(|child| matches!(child, Md::ListItem(item) if item.spread));

        let mut el = Element::new(if list.ordered { "ol" } else { "ul" });
        if list.ordered
            && let Some(start) = list.start
            && start != 1
        {
            el.properties.insert("start".into(), start.to_string());
        }
        el.children = list
            .children
            .iter()
            .map(|child| match child {
                Md::ListItem(item) => Node::Element(self.lower_list_item(item, loose)),
                other => Node::Element(Element::new("li").with_children(self.lower_node(other))),
            })
            .collect();
        el.position = position;
        el
    }

    fn lower_list_item(&mut self, item: &'a mdast::ListItem, loose: bool) -> Element {
        let mut children = Vec::new();
        let mut li = Element::new("li");

        if let Some(checked) = item.checked {
            li.properties.insert("class".into(), "task-list-item".into());
            let mut input = Element::new("input")
                .with_property("type", "checkbox")
                .with_property("disabled", "");
            if checked {
                input.properties.insert("checked".into(), String::new());
            }
            children.push(Node::Element(input));
            children.push(Node::text(" "));
        }

        let outer = self.container;
        if let Some(width) = self.item_width(item) {
            self.container = width;
        }
        for child in &item.children {
            match child {
                // Tight lists render paragraph content directly inside the <li>.
                Md::Paragraph(p) if !loose => children.extend(self.lower_all(&p.children)),
                other => children.extend(self.lower_node(other)),
            }
        }
        self.container = outer;

        li.children = children;
        li.position = location_of_item(item);
        li
    }

    fn lower_table(&mut self, table: &'a mdast::Table) -> Element {
        let mut rows = table.children.iter().filter_map(|row| match row {
            Md::TableRow(row) => Some(row),
            _ => None,
        });

        let mut table_el = Element::new("table");
        if let Some(head) = rows.next() {
            let tr = self.lower_row(head, "th", &table.align);
            table_el.children.push(Node::Element(
                Element::new("thead").with_children(vec![Node::Element(tr)]),
            ));
        }
        let body: Vec<Node> = rows
            .map(|row| Node::Element(self.lower_row(row, "td", &table.align)))
            .collect();
        if !body.is_empty() {
            table_el
                .children
                .push(Node::Element(Element::new("tbody").with_children(body)));
        }
        table_el
    }

    fn lower_row(&mut self, row: &'a mdast::TableRow, cell_tag: &str, align: &[AlignKind]) -> Element {
        let cells = row
            .children
            .iter()
            .enumerate()
            .map(|(index, cell)| {
                let mut el = Element::new(cell_tag);
                if let Md::TableCell(cell) = cell {
                    el.children = self.lower_all(&cell.children);
                }
                match align.get(index) {
                    Some(AlignKind::Left) => {
                        el.properties.insert("align".into(), "left".into());
                    }
                    Some(AlignKind::Right) => {
                        el.properties.insert("align".into(), "right".into());
                    }
                    Some(AlignKind::Center) => {
                        el.properties.insert("align".into(), "center".into());
                    }
                    _ => {}
                }
                Node::Element(el)
            })
            .collect();
        Element::new("tr").with_children(cells)
    }

    fn footnote_ref(&mut self, fnref: &mdast::FootnoteReference) -> Element {
        let id = &fnref.identifier;
        let number = match self.footnote_order.iter().position(|known| known == id) {
            Some(index) => index + 1,
            None => {
                self.footnote_order.push(id.clone());
                self.footnote_order.len()
            }
        };
        let a = Element::new("a")
            .with_property("href", format!("#fn-{id}"))
            .with_property("id", format!("fnref-{id}"))
            .with_property("data-footnote-ref", "")
            .with_children(vec![Node::text(number.to_string())]);
        Element::new("sup").with_children(vec![Node::Element(a)])
    }

    fn footnote_section(&mut self) -> Option<Element> {
        if self.footnote_order.is_empty() {
            return None;
        }

        let mut items = Vec::new();
        // Definitions may reference further footnotes; the order list can grow.
        let mut index = 0;
        while index < self.footnote_order.len() {
            let id = self.footnote_order[index].clone();
            index += 1;
            let Some(def) = self.footnote_defs.get(&id).copied() else {
                continue;
            };
            let mut children = self.lower_all(&def.children);
            let backref = Element::new("a")
                .with_property("href", format!("#fnref-{id}"))
                .with_property("data-footnote-backref", "")
                .with_children(vec![Node::text("↩")]);
            children.push(Node::Element(backref));
            items.push(Node::Element(
                Element::new("li")
                    .with_property("id", format!("fn-{id}"))
                    .with_children(children),
            ));
        }

        let ol = Element::new("ol").with_children(items);
        Some(
            Element::new("section")
                .with_property("class", "footnotes")
                .with_property("data-footnotes", "")
                .with_children(vec![Node::Element(ol)]),
        )
    }

    fn lower_jsx(
        &mut self,
        name: Option<&str>,
        attributes: &[AttributeContent],
        children: &'a [Md],
        position: Option<SourceLocation>,
    ) -> Vec<Node> {
        let children = self.lower_all(children);

        // Fragment `<>…</>`: keep only the children.
        let Some(name) = name else {
            return children;
        };

        let mut props = BTreeMap::new();
        for attr in attributes {
            match attr {
                AttributeContent::Property(prop) => {
                    let value = match &prop.value {
                        Some(AttributeValue::Literal(s)) => PropValue::literal(s.clone()),
                        Some(AttributeValue::Expression(expr)) => {
                            PropValue::expression(expr.value.clone())
                        }
                        None => PropValue::literal(String::new()),
                    };
                    props.insert(prop.name.clone(), value);
                }
                AttributeContent::Expression(_) => {
                    log::debug!("Ignoring spread attribute on <{}>", name);
                }
            }
        }

        if is_component_name(name) {
            return vec![Node::Component(Component {
                name: name.to_string(),
                props,
                children,
                position,
            })];
        }

        let mut el = Element::new(name).with_children(children);
        el.properties = props
            .into_iter()
            .map(|(key, value)| (key, value.value().to_string()))
            .collect();
        el.position = position;
        vec![Node::Element(el)]
    }

    fn lower_code(&mut self, code: &mdast::Code, position: Option<SourceLocation>) -> Element {
        let mut code_el = Element::new("code");
        if let Some(lang) = &code.lang {
            code_el
                .properties
                .insert("class".into(), format!("language-{lang}"));
        }
        if !code.value.is_empty() {
            code_el.children.push(Node::text(format!("{}\n", code.value)));
        }

        let mut pre = Element::new("pre").with_children(vec![Node::Element(code_el)]);
        if let Some(meta) = &code.meta {
            pre.properties.insert("data-meta".into(), meta.clone());
        }
        pre.data.fence_source = self.fence_source(code);
        pre.position = position;
        pre
    }

    /// Cuts the block's interior out of the source, recording an error when
    /// the block has no closing fence.
    fn fence_source(&mut self, code: &mdast::Code) -> Option<String> {
        let span = code.position.as_ref()?;
        let block = self.source.get(span.start.offset..span.end.offset)?;

        let interior = fence_interior(block, self.container);
        if interior.is_none() && self.unclosed.is_none() {
            let marker = block.chars().next().unwrap_or('`');
            self.unclosed = Some(CompileError::malformed_block(
                format!("code fence opened with '{marker}' is never closed"),
                span.start.line,
                span.start.column,
            ));
        }
        interior
    }

    /// Byte column of `offset` within its line.
    fn column_of(&self, offset: usize) -> usize {
        let line_start = self
            .source
            .get(..offset)
            .and_then(|before| before.rfind('\n'))
            .map_or(0, |at| at + 1);
        offset.saturating_sub(line_start)
    }

    /// Indent, `>`, and one optional space.
    fn quote_width(&self, quote: &mdast::Blockquote) -> Option<usize> {
        let start = quote.position.as_ref()?.start.offset;
        let line = self.source.get(start..)?;
        let indent = leading_blanks(line);
        let rest = line[indent..].strip_prefix('>')?;
        let space = usize::from(rest.starts_with([' ', '\t']));
        Some(self.column_of(start) + indent + 1 + space)
    }

    /// Indent, marker, and the 1 to 4 spaces that set the item's content column.
    fn item_width(&self, item: &mdast::ListItem) -> Option<usize> {
        let start = item.position.as_ref()?.start.offset;
        let line = self.source.get(start..)?.lines().next()?;
        let indent = leading_blanks(line);
        let line = &line[indent..];
        let marker = line.bytes().take_while(u8::is_ascii_digit).count() + 1;
        let after = line.get(marker..)?;
        let spaces = after.bytes().take_while(|b| *b == b' ').count();
        let gap = if spaces == 0 || spaces > 4 || spaces == after.len() {
            1
        } else {
            spaces
        };
        Some(self.column_of(start) + indent + marker + gap)
    }
}

fn leading_blanks(line: &str) -> usize {
    line.bytes().take_while(|b| matches!(b, b' ' | b'\t')).count()
}

/// Lowercase tags are plain HTML; anything else names a registered component.
fn is_component_name(name: &str) -> bool {
    !name.starts_with(|c: char| c.is_ascii_lowercase()) || name.contains('.')
}

fn image(url: &str, alt: &str, title: Option<&str>) -> Element {
    let mut img = Element::new("img")
        .with_property("src", url)
        .with_property("alt", alt);
    if let Some(title) = title {
        img.properties.insert("title".into(), title.to_string());
    }
    img
}

fn location_of(node: &Md) -> Option<SourceLocation> {
    node.position()
        .map(|p| SourceLocation::new(p.start.line, p.start.column))
}

fn location_of_item(item: &mdast::ListItem) -> Option<SourceLocation> {
    item.position
        .as_ref()
        .map(|p| SourceLocation::new(p.start.line, p.start.column))
}
