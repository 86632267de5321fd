use crate::options::AutolinkBehavior;
use crate::pipeline::{Stage, StageRole};
use crate::tree::{Element, Node, Tree};
use quill_core::{CompileError, slug};

/// Gives every heading without an `id` the slug of its text.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadingIds;

impl Stage for HeadingIds {
    fn name(&self) -> &'static str {
        "heading-ids"
    }

    fn role(&self) -> StageRole {
        StageRole::Annotate
    }

    fn apply(&self, mut tree: Tree) -> Result<Tree, CompileError> {
        tree.try_for_each_element_mut(|el| {
            if el.heading_level().is_some() && !el.properties.contains_key("id") {
                let id = slug(el.text_content().trim());
                el.properties.insert("id".to_string(), id);
            }
            Ok(())
        })?;
        Ok(tree)
    }
}

/// Adds a self-link to each heading that has an id.
#[derive(Debug, Clone, Copy)]
pub struct HeadingAutolinks {
    behavior: AutolinkBehavior,
}

impl HeadingAutolinks {
    /// Autolinks placed according to `behavior`.
    pub fn new(behavior: AutolinkBehavior) -> Self {
        Self { behavior }
    }
}

impl Stage for HeadingAutolinks {
    fn name(&self) -> &'static str {
        "heading-autolinks"
    }

    fn role(&self) -> StageRole {
        StageRole::Annotate
    }

    fn apply(&self, mut tree: Tree) -> Result<Tree, CompileError> {
        if self.behavior == AutolinkBehavior::Off {
            return Ok(tree);
        }
        tree.try_for_each_element_mut(|el| {
            if el.heading_level().is_none() {
                return Ok(());
            }
            let Some(id) = el.property("id").map(str::to_string) else {
                return Ok(());
            };
            let href = format!("#{id}");
            match self.behavior {
                AutolinkBehavior::Wrap => {
                    // Nested anchors are invalid HTML.
                    if !contains_anchor(&el.children) {
                        let children = std::mem::take(&mut el.children);
                        let anchor = Element::new("a")
                            .with_property("href", href)
                            .with_children(children);
                        el.children = vec![Node::Element(anchor)];
                    }
                }
                AutolinkBehavior::Prepend => el.children.insert(0, icon_anchor(href)),
                AutolinkBehavior::Append => el.children.push(icon_anchor(href)),
                AutolinkBehavior::Off => {}
            }
            Ok(())
        })?;
        Ok(tree)
    }
}

fn icon_anchor(href: String) -> Node {
    Node::Element(
        Element::new("a")
            .with_property("href", href)
            .with_property("aria-hidden", "true")
            .with_property("tabindex", "-1")
            .with_property("class", "heading-anchor"),
    )
}

fn contains_anchor(nodes: &[Node]) -> bool {
    nodes.iter().any(|node| match node {
        Node::Element(el) => el.tag == "a" || contains_anchor(&el.children),
        Node::Component(c) => contains_anchor(&c.children),
        Node::Text { .. } => false,
    })
}
