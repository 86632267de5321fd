//! Raw code capture and publication.
//!
//! `PreserveRawCode` copies each block's fence interior, as lowering cut it
//! from the source, into [`NodeData::raw_text`](crate::tree::NodeData) before
//! anything can rewrite it; `AttachRawCode` exposes that copy as the `raw` property once the
//! rewriting stages are done. The pipeline refuses any order that puts a
//! highlight stage outside this pair.

use crate::pipeline::{Stage, StageRole};
use crate::tree::Tree;
use quill_core::CompileError;

/// Captures the exact fence interior of every code block.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreserveRawCode;

impl Stage for PreserveRawCode {
    fn name(&self) -> &'static str {
        "preserve-raw-code"
    }

    fn role(&self) -> StageRole {
        StageRole::PreserveRaw
    }

    fn apply(&self, mut tree: Tree) -> Result<Tree, CompileError> {
        tree.try_for_each_element_mut(|el| {
            if el.is_code_block() {
                let raw = match &el.data.fence_source {
                    Some(source) => source.clone(),
                    // Blocks built outside lowering have no source to cut from.
                    None => el.text_content(),
                };
                el.data.raw_text = Some(raw);
            }
            Ok(())
        })?;
        Ok(tree)
    }
}

/// Publishes the captured text as the `raw` property of each `pre`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttachRawCode;

impl Stage for AttachRawCode {
    fn name(&self) -> &'static str {
        "attach-raw-code"
    }

    fn role(&self) -> StageRole {
        StageRole::AttachRaw
    }

    fn apply(&self, mut tree: Tree) -> Result<Tree, CompileError> {
        tree.try_for_each_element_mut(|el| {
            if !el.is_code_block() {
                return Ok(());
            }
            let Some(raw) = el.data.raw_text.clone() else {
                let at = el
                    .position
                    .as_ref()
                    .map(|p| format!(" at {p}"))
                    .unwrap_or_default();
                return Err(CompileError::Internal(format!(
                    "code block{at} has no preserved raw text"
                )));
            };
            el.properties.insert("raw".to_string(), raw);
            Ok(())
        })?;
        Ok(tree)
    }
}
