//! Frontmatter + body → compiled document.

use crate::options::CompileOptions;
use crate::pipeline::Pipeline;
use crate::registry::ComponentRegistry;
use crate::render::to_html;
use crate::tree::Tree;
use quill_core::{
    CompileError, HeadingEntry, RawDocument, TocSource, extract_toc, parse_frontmatter,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// A fully compiled document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledDocument<F> {
    /// Typed frontmatter record.
    pub frontmatter: F,
    /// Body tree after every stage ran.
    pub tree: Tree,
    /// Level 2–4 headings in document order.
    pub toc: Vec<HeadingEntry>,
}

/// Splits a raw document, compiles its body and derives its TOC.
///
/// Holds no per-document state, so one assembler can be shared across
/// threads and reused for any number of documents.
#[derive(Debug)]
pub struct Assembler {
    pipeline: Pipeline,
    registry: Arc<ComponentRegistry>,
    toc_source: TocSource,
}

impl Assembler {
    /// Assembler running the standard pipeline.
    pub fn new(
        registry: Arc<ComponentRegistry>,
        options: &CompileOptions,
    ) -> Result<Self, CompileError> {
        let pipeline = Pipeline::standard(Arc::clone(&registry), options)?;
        Ok(Self::with_pipeline(pipeline, registry, options.toc_source))
    }

    /// Assembler running a caller-built pipeline.
    pub fn with_pipeline(
        pipeline: Pipeline,
        registry: Arc<ComponentRegistry>,
        toc_source: TocSource,
    ) -> Self {
        Self {
            pipeline,
            registry,
            toc_source,
        }
    }

    /// The registry components resolve against.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Compiles one document.
    ///
    /// Errors carrying a location are reported against the full source file,
    /// frontmatter lines included.
    pub fn assemble<F: DeserializeOwned>(
        &self,
        document: &RawDocument,
    ) -> Result<CompiledDocument<F>, CompileError> {
        let source = document.source_text();
        let path = document.source_path().display().to_string();
        log::debug!("Assembling {}", path);

        let parsed = parse_frontmatter::<F>(source)?;
        let line_offset = parsed.body_line_offset(source);

        let tree = self
            .pipeline
            .compile(parsed.body)
            .map_err(|err| err.relocate(Some(&path), line_offset))?;

        let toc = match self.toc_source {
            TocSource::Text => extract_toc(parsed.body),
            TocSource::Tree => tree.headings(),
        };

        Ok(CompiledDocument {
            frontmatter: parsed.frontmatter,
            tree,
            toc,
        })
    }

    /// Renders a compiled document's tree to HTML.
    pub fn render<F>(&self, document: &CompiledDocument<F>) -> Result<String, CompileError> {
        to_html(&document.tree, &self.registry)
    }
}
