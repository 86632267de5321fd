//! Built-in bindings for the components docs pages use most.

use super::types::{ComponentBinding, ComponentRegistry};

const DOCS_MODULE: &str = "@quill/docs-components";

/// Tags the built-in registry resolves.
pub const DOCS_COMPONENTS: &[&str] = &[
    "Callout",
    "Tabs",
    "TabItem",
    "Steps",
    "ComponentPreview",
    "ComponentSource",
];

/// Creates the default docs registry.
///
/// # Example
///
/// ```
/// use quill_compiler::registry::defaults::docs_registry;
///
/// let registry = docs_registry();
/// assert_eq!(registry.resolve("Callout").map(|b| b.element.as_str()), Some("x-callout"));
/// ```
pub fn docs_registry() -> ComponentRegistry {
    DOCS_COMPONENTS
        .iter()
        .map(|name| ComponentBinding::new(*name).with_module(DOCS_MODULE))
        .collect()
}
