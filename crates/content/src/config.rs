//! Content configuration.

use crate::error::LoadError;
use quill_compiler::registry::defaults::docs_registry;
use quill_compiler::{CompileOptions, ComponentBinding, ComponentRegistry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The two collections a site carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentKind {
    /// Nested documentation pages.
    Docs,
    /// Flat, dated blog posts.
    Posts,
}

/// Where content lives and how it is compiled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentConfig {
    /// Root of the docs collection.
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,
    /// Root of the posts collection.
    #[serde(default = "default_posts_dir")]
    pub posts_dir: PathBuf,
    /// File extensions treated as documents, without the dot.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Worker threads for batch loads. `None` uses rayon's global pool.
    #[serde(default)]
    pub max_threads: Option<usize>,
    /// Component bindings. Empty means the built-in docs components.
    #[serde(default)]
    pub components: Vec<ComponentBinding>,
    /// Pipeline and TOC options.
    #[serde(default)]
    pub compile: CompileOptions,
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("content/docs")
}

fn default_posts_dir() -> PathBuf {
    PathBuf::from("content/blog")
}

fn default_extensions() -> Vec<String> {
    vec!["md".to_string(), "mdx".to_string()]
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            posts_dir: default_posts_dir(),
            extensions: default_extensions(),
            max_threads: None,
            components: Vec::new(),
            compile: CompileOptions::default(),
        }
    }
}

impl ContentConfig {
    /// Parses a YAML config document.
    pub fn from_yaml(input: &str) -> Result<Self, LoadError> {
        let config: Self =
            serde_yaml::from_str(input).map_err(|err| LoadError::Config(err.to_string()))?;
        config.validated()
    }

    /// Parses a JSON config document.
    pub fn from_json(input: &str) -> Result<Self, LoadError> {
        let config: Self =
            serde_json::from_str(input).map_err(|err| LoadError::Config(err.to_string()))?;
        config.validated()
    }

    /// Reads a config file; `.json` is parsed as JSON, anything else as YAML.
    ///
    /// Relative collection roots are resolved against the file's directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|err| LoadError::io(path, err))?;
        let mut config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&input)?,
            _ => Self::from_yaml(&input)?,
        };
        if let Some(base) = path.parent() {
            config.docs_dir = base.join(&config.docs_dir);
            config.posts_dir = base.join(&config.posts_dir);
        }
        log::debug!("Loaded content config from {}", path.display());
        Ok(config)
    }

    /// Root directory for `kind`.
    pub fn root(&self, kind: ContentKind) -> &Path {
        match kind {
            ContentKind::Docs => &self.docs_dir,
            ContentKind::Posts => &self.posts_dir,
        }
    }

    /// Builds the component registry this config describes.
    pub fn registry(&self) -> ComponentRegistry {
        if self.components.is_empty() {
            docs_registry()
        } else {
            self.components.iter().cloned().collect()
        }
    }

    fn validated(mut self) -> Result<Self, LoadError> {
        for ext in &mut self.extensions {
            *ext = ext.trim_start_matches('.').to_ascii_lowercase();
        }
        self.extensions.retain(|ext| !ext.is_empty());
        if self.extensions.is_empty() {
            return Err(LoadError::Config(
                "at least one document extension is required".to_string(),
            ));
        }
        if self.max_threads == Some(0) {
            return Err(LoadError::Config("maxThreads must be at least 1".to_string()));
        }
        Ok(self)
    }
}
