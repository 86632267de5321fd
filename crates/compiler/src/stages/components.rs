use crate::pipeline::{Stage, StageRole};
use crate::registry::ComponentRegistry;
use crate::tree::{Node, Tree};
use quill_core::{CompileError, SourceLocation};
use std::sync::Arc;

/// Fails on the first component tag the registry does not know.
#[derive(Debug, Clone)]
pub struct ResolveComponents {
    registry: Arc<ComponentRegistry>,
}

impl ResolveComponents {
    /// Checks tags against `registry`.
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self { registry }
    }
}

impl Stage for ResolveComponents {
    fn name(&self) -> &'static str {
        "resolve-components"
    }

    fn role(&self) -> StageRole {
        StageRole::Annotate
    }

    fn apply(&self, tree: Tree) -> Result<Tree, CompileError> {
        tree.try_for_each_node(|node| {
            if let Node::Component(component) = node
                && self.registry.resolve(&component.name).is_none()
            {
                let location = component
                    .position
                    .clone()
                    .unwrap_or_else(|| SourceLocation::new(1, 1));
                return Err(CompileError::unresolved_component(&component.name, location));
            }
            Ok(())
        })?;
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ComponentBinding;
    use crate::stages::compile_with;

    fn registry() -> Arc<ComponentRegistry> {
        Arc::new([ComponentBinding::new("Callout")].into_iter().collect())
    }

    #[test]
    fn known_tags_pass() {
        let tree = compile_with(vec![], "<Callout>\nhello\n</Callout>\n");
        let stage = ResolveComponents::new(registry());
        assert!(stage.apply(tree).is_ok());
    }

    #[test]
    fn nested_unknown_tag_reports_position() {
        let tree = compile_with(vec![], "# Title\n\n<Callout>\n<Widget />\n</Callout>\n");
        let err = ResolveComponents::new(registry()).apply(tree).unwrap_err();
        match err {
            CompileError::UnresolvedComponent { name, location } => {
                assert_eq!(name, "Widget");
                assert_eq!(location.line, 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn lowercase_tags_are_not_components() {
        let tree = compile_with(vec![], "<div>\nplain\n</div>\n");
        assert!(ResolveComponents::new(Arc::new(ComponentRegistry::empty())).apply(tree).is_ok());
    }
}
