//! Registry type definitions for tag-to-widget bindings.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Serialized registry, as read from a JSON or YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    /// Available components.
    pub components: Vec<ComponentBinding>,
}

/// Binds a component tag to the widget that renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentBinding {
    /// Tag name used in documents (e.g., "Callout", "Tabs").
    pub name: String,
    /// Element the HTML renderer emits for this tag (e.g., "quill-callout").
    pub element: String,
    /// Module that provides the widget, for hosts that import it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_path: Option<String>,
}

impl ComponentBinding {
    /// Binding whose element is the kebab-cased tag name with an `x-` prefix.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let element = format!("x-{}", kebab_case(&name));
        Self {
            name,
            element,
            module_path: None,
        }
    }

    /// Sets the providing module.
    pub fn with_module(mut self, module_path: impl Into<String>) -> Self {
        self.module_path = Some(module_path.into());
        self
    }
}

fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (index, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if index > 0 && !out.ends_with('-') {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else if ch == '.' || ch == '_' {
            out.push('-');
        } else {
            out.push(ch);
        }
    }
    out
}

/// Immutable tag → binding lookup handed to the pipeline and renderer.
///
/// Built once and shared through `Arc`; there is no way to add bindings
/// after construction.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    bindings: HashMap<String, ComponentBinding>,
}

impl ComponentRegistry {
    /// Registry with no bindings; every component tag fails to resolve.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a registry from its serialized form. Later duplicates win.
    pub fn from_config(config: RegistryConfig) -> Self {
        config.components.into_iter().collect()
    }

    /// Parses a JSON registry document.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RegistryConfig>(input).map(Self::from_config)
    }

    /// Parses a YAML registry document.
    pub fn from_yaml(input: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str::<RegistryConfig>(input).map(Self::from_config)
    }

    /// Looks up the binding for a tag.
    pub fn resolve(&self, tag: &str) -> Option<&ComponentBinding> {
        self.bindings.get(tag)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the registry has no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl FromIterator<ComponentBinding> for ComponentRegistry {
    fn from_iter<I: IntoIterator<Item = ComponentBinding>>(iter: I) -> Self {
        Self {
            bindings: iter
                .into_iter()
                .map(|binding| (binding.name.clone(), binding))
                .collect(),
        }
    }
}
