//! Compiled collections.

use crate::config::{ContentConfig, ContentKind};
use crate::error::LoadError;
use crate::loader::{CollectionLoader, LoadedDocument};
use quill_compiler::{Assembler, CompiledDocument};
use quill_core::{DocFrontmatter, PostFrontmatter};
use rayon::prelude::*;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

/// One compiled document and its id.
#[derive(Debug, Clone, Serialize)]
pub struct Entry<F> {
    /// Collection-relative id.
    pub id: String,
    /// Compiled output.
    pub document: CompiledDocument<F>,
}

/// A loader paired with the assembler that compiles its documents into `F`.
pub struct Collection<F> {
    loader: CollectionLoader,
    assembler: Arc<Assembler>,
    pool: Option<Arc<rayon::ThreadPool>>,
    schema: PhantomData<fn() -> F>,
}

impl<F> std::fmt::Debug for Collection<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("loader", &self.loader)
            .field("threads", &self.pool.as_ref().map(|p| p.current_num_threads()))
            .finish()
    }
}

impl Collection<DocFrontmatter> {
    /// The docs collection described by `config`.
    pub fn docs(config: &ContentConfig, assembler: Arc<Assembler>) -> Result<Self, LoadError> {
        Self::from_config(config, ContentKind::Docs, assembler)
    }
}

impl Collection<PostFrontmatter> {
    /// The posts collection described by `config`.
    pub fn posts(config: &ContentConfig, assembler: Arc<Assembler>) -> Result<Self, LoadError> {
        Self::from_config(config, ContentKind::Posts, assembler)
    }
}

impl<F> Collection<F>
where
    F: DeserializeOwned + Send,
{
    /// Pairs `loader` with a shared assembler.
    pub fn new(loader: CollectionLoader, assembler: Arc<Assembler>) -> Self {
        Self {
            loader,
            assembler,
            pool: None,
            schema: PhantomData,
        }
    }

    fn from_config(
        config: &ContentConfig,
        kind: ContentKind,
        assembler: Arc<Assembler>,
    ) -> Result<Self, LoadError> {
        let collection = Self::new(CollectionLoader::from_config(config, kind), assembler);
        match config.max_threads {
            Some(threads) => collection.with_max_threads(threads),
            None => Ok(collection),
        }
    }

    /// Runs batch work on a dedicated pool of `threads` workers.
    pub fn with_max_threads(mut self, threads: usize) -> Result<Self, LoadError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|err| LoadError::Config(format!("cannot build thread pool: {err}")))?;
        self.pool = Some(Arc::new(pool));
        Ok(self)
    }

    /// The underlying loader.
    pub fn loader(&self) -> &CollectionLoader {
        &self.loader
    }

    /// Sorted document ids.
    pub fn ids(&self) -> Result<Vec<String>, LoadError> {
        self.loader.list_ids()
    }

    /// Compiles one document.
    ///
    /// An id with no backing file is `Ok(None)`; every other failure is an
    /// error.
    pub fn find(&self, id: &str) -> Result<Option<CompiledDocument<F>>, LoadError> {
        let document = match self.loader.load(id) {
            Ok(document) => document,
            Err(err) if err.is_not_found() => {
                log::warn!("{}", err);
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        self.assembler
            .assemble(&document)
            .map(Some)
            .map_err(|source| LoadError::Compile {
                id: id.to_string(),
                source,
            })
    }

    /// Loads and compiles every document in parallel.
    ///
    /// One failing document fails the whole batch. Entries come back in no
    /// particular order.
    pub fn compile_all(&self) -> Result<Vec<Entry<F>>, LoadError> {
        let run = || {
            let loaded = self.loader.load_many()?;
            loaded
                .into_par_iter()
                .map(|LoadedDocument { id, document }| {
                    match self.assembler.assemble(&document) {
                        Ok(document) => Ok(Entry { id, document }),
                        Err(source) => Err(LoadError::Compile { id, source }),
                    }
                })
                .collect::<Result<Vec<Entry<F>>, LoadError>>()
        };

        let result = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        };
        result.inspect_err(|err| {
            log::error!(
                "Compiling collection {} aborted: {}",
                self.loader.root().display(),
                err
            )
        })
    }
}

/// Newest first; posts sharing a date fall back to id order.
pub fn sort_by_date_desc(entries: &mut [Entry<PostFrontmatter>]) {
    entries.sort_by(|a, b| {
        b.document
            .frontmatter
            .date
            .cmp(&a.document.frontmatter.date)
            .then_with(|| a.id.cmp(&b.id))
    });
}
