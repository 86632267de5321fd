//! Filesystem-backed collection loading.

use crate::config::{ContentConfig, ContentKind};
use crate::error::LoadError;
use quill_core::RawDocument;
use rayon::prelude::*;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// A document read from disk together with its id.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Collection-relative id (`guides/setup`, `hello-world`).
    pub id: String,
    /// File contents and path.
    pub document: RawDocument,
}

/// Resolves ids to files under one collection root.
///
/// Docs roots are walked recursively and keyed by their path without the
/// extension; an `index` file stands for its directory. Posts roots are flat
/// and keyed by file stem.
#[derive(Debug, Clone)]
pub struct CollectionLoader {
    root: PathBuf,
    kind: ContentKind,
    extensions: Vec<String>,
}

impl CollectionLoader {
    /// Loader for `root` accepting `.md` and `.mdx` files.
    pub fn new(root: impl Into<PathBuf>, kind: ContentKind) -> Self {
        Self {
            root: root.into(),
            kind,
            extensions: vec!["md".to_string(), "mdx".to_string()],
        }
    }

    /// Loader for one collection of `config`.
    pub fn from_config(config: &ContentConfig, kind: ContentKind) -> Self {
        Self::new(config.root(kind), kind).with_extensions(config.extensions.clone())
    }

    /// Replaces the accepted extensions (without dots).
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Collection root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Collection kind.
    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Every document id, sorted. A missing root yields an empty list.
    pub fn list_ids(&self) -> Result<Vec<String>, LoadError> {
        if !self.root.is_dir() {
            log::debug!("Content root {} not found, no documents", self.root.display());
            return Ok(Vec::new());
        }

        let walker = match self.kind {
            ContentKind::Docs => WalkDir::new(&self.root),
            ContentKind::Posts => WalkDir::new(&self.root).max_depth(1),
        };

        let mut ids = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|err| {
                let path = err.path().unwrap_or(self.root.as_path()).to_path_buf();
                LoadError::io(path, err.into())
            })?;
            if !entry.file_type().is_file() || !self.is_document(entry.path()) {
                continue;
            }
            if let Some(id) = self.id_for(entry.path()) {
                ids.push(id);
            }
        }

        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// Reads the document backing `id`.
    pub fn load(&self, id: &str) -> Result<RawDocument, LoadError> {
        let missing = || LoadError::MissingDocument { id: id.to_string() };
        if !is_safe_id(id) || (self.kind == ContentKind::Posts && id.contains('/')) {
            return Err(missing());
        }

        let path = self.candidates(id).find(|path| path.is_file()).ok_or_else(missing)?;
        log::debug!("Loading {} from {}", id, path.display());
        let text = std::fs::read_to_string(&path).map_err(|err| LoadError::io(&path, err))?;
        Ok(RawDocument::new(text, path))
    }

    /// Reads every document in parallel.
    ///
    /// The first failure aborts the batch. Result order is unspecified.
    pub fn load_many(&self) -> Result<Vec<LoadedDocument>, LoadError> {
        if !self.root.is_dir() {
            return Err(LoadError::MissingRoot {
                path: self.root.clone(),
            });
        }

        let ids = self.list_ids()?;
        ids.into_par_iter()
            .map(|id| {
                let document = self.load(&id)?;
                Ok(LoadedDocument { id, document })
            })
            .collect::<Result<Vec<_>, LoadError>>()
            .inspect_err(|err| log::error!("Batch load of {} aborted: {}", self.root.display(), err))
    }

    fn is_document(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
    }

    fn id_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?.with_extension("");
        let mut parts: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        if self.kind == ContentKind::Docs && parts.len() > 1 && parts.last() == Some(&"index") {
            parts.pop();
        }
        Some(parts.join("/"))
    }

    fn candidates<'a>(&'a self, id: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
        let direct = self
            .extensions
            .iter()
            .map(move |ext| self.root.join(format!("{id}.{ext}")));
        let index = self
            .extensions
            .iter()
            .filter(move |_| self.kind == ContentKind::Docs)
            .map(move |ext| self.root.join(id).join(format!("index.{ext}")));
        direct.chain(index)
    }
}

/// Ids are relative, forward-slash paths that never leave the root.
fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && !id.contains('\\')
        && Path::new(id)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn docs_fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.mdx", "home");
        write(dir.path(), "guides/setup.md", "setup");
        write(dir.path(), "guides/index.mdx", "guides");
        write(dir.path(), "guides/notes.txt", "not a doc");
        dir
    }

    #[test]
    fn docs_ids_are_nested_and_sorted() {
        let dir = docs_fixture();
        let loader = CollectionLoader::new(dir.path(), ContentKind::Docs);
        assert_eq!(loader.list_ids().unwrap(), vec!["guides", "guides/setup", "index"]);
    }

    #[test]
    fn posts_ignore_subdirectories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "hello.md", "hi");
        write(dir.path(), "drafts/wip.md", "wip");
        let loader = CollectionLoader::new(dir.path(), ContentKind::Posts);
        assert_eq!(loader.list_ids().unwrap(), vec!["hello"]);
    }

    #[test]
    fn index_file_loads_for_directory_id() {
        let dir = docs_fixture();
        let loader = CollectionLoader::new(dir.path(), ContentKind::Docs);
        let doc = loader.load("guides").unwrap();
        assert_eq!(doc.source_text(), "guides");
        assert!(doc.source_path().ends_with("guides/index.mdx"));
    }

    #[test]
    fn missing_root_lists_nothing_but_fails_batch() {
        let dir = TempDir::new().unwrap();
        let loader = CollectionLoader::new(dir.path().join("nope"), ContentKind::Docs);
        assert!(loader.list_ids().unwrap().is_empty());
        assert!(matches!(loader.load_many(), Err(LoadError::MissingRoot { .. })));
    }

    #[test]
    fn unknown_and_escaping_ids_are_missing() {
        let dir = docs_fixture();
        let loader = CollectionLoader::new(dir.path().join("guides"), ContentKind::Docs);
        for id in ["nope", "../index", "/etc/passwd", "", "a/./b"] {
            assert!(loader.load(id).unwrap_err().is_not_found(), "{id}");
        }
    }

    #[test]
    fn load_many_reads_everything() {
        let dir = docs_fixture();
        let loader = CollectionLoader::new(dir.path(), ContentKind::Docs);
        let mut loaded = loader.load_many().unwrap();
        loaded.sort_by(|a, b| a.id.cmp(&b.id));
        let texts: Vec<_> = loaded.iter().map(|d| d.document.source_text()).collect();
        assert_eq!(texts, vec!["guides", "setup", "home"]);
    }
}
