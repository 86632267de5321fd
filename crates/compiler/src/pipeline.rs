//! Ordered AST stage pipeline.

use crate::lower::lower;
use crate::options::CompileOptions;
use crate::registry::ComponentRegistry;
use crate::stages::{
    AttachRawCode, CodeTitle, HeadingAutolinks, HeadingIds, Highlight, PreserveRawCode,
    ResolveComponents,
};
use crate::tree::Tree;
use quill_core::{CompileError, ParseOptions, parse_mdast};
use std::sync::Arc;

/// What a stage is allowed to do to code blocks.
///
/// The pipeline checks these roles at construction so that highlighting can
/// never run without its raw text being captured first and re-attached after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageRole {
    /// Copies each code block's literal text into the side channel.
    PreserveRaw,
    /// Touches nodes other than code text (ids, links, titles, checks).
    Annotate,
    /// Rewrites code block children.
    Highlight,
    /// Publishes the side-channel text as the visible `raw` property.
    AttachRaw,
}

/// One tree transform.
pub trait Stage: Send + Sync {
    /// Stable name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Role used for ordering validation.
    fn role(&self) -> StageRole;

    /// Consumes a tree and returns the transformed tree.
    fn apply(&self, tree: Tree) -> Result<Tree, CompileError>;
}

/// An ordered, validated list of stages plus the parser settings feeding it.
pub struct Pipeline {
    parse: ParseOptions,
    stages: Vec<Box<dyn Stage>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("parse", &self.parse)
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl Pipeline {
    /// Validates stage order and builds a pipeline.
    pub fn new(parse: ParseOptions, stages: Vec<Box<dyn Stage>>) -> Result<Self, CompileError> {
        validate_order(&stages)?;
        Ok(Self { parse, stages })
    }

    /// The default stage list:
    /// components → preserve raw → code title → heading ids → autolinks →
    /// highlight (optional) → attach raw.
    pub fn standard(
        registry: Arc<ComponentRegistry>,
        options: &CompileOptions,
    ) -> Result<Self, CompileError> {
        let mut stages: Vec<Box<dyn Stage>> = vec![
            Box::new(ResolveComponents::new(registry)),
            Box::new(PreserveRawCode),
            Box::new(CodeTitle),
            Box::new(HeadingIds),
            Box::new(HeadingAutolinks::new(options.autolink)),
        ];
        if options.highlight {
            stages.push(Box::new(Highlight::new(&options.theme)?));
        }
        stages.push(Box::new(AttachRawCode));
        Self::new(options.parse, stages)
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Parses `body` and runs every stage in order.
    ///
    /// A fence closed only by the end of the document or of its container
    /// fails lowering with `MalformedBlock`. The first failing stage fails the
    /// whole call.
    pub fn compile(&self, body: &str) -> Result<Tree, CompileError> {
        let mdast = parse_mdast(body, &self.parse)?;
        let mut tree = lower(&mdast, body)?;
        for stage in &self.stages {
            log::debug!("Running stage {}", stage.name());
            tree = stage.apply(tree)?;
        }
        Ok(tree)
    }
}

fn validate_order(stages: &[Box<dyn Stage>]) -> Result<(), CompileError> {
    let first = |role: StageRole| stages.iter().position(|s| s.role() == role);
    let last = |role: StageRole| stages.iter().rposition(|s| s.role() == role);

    let preserve = first(StageRole::PreserveRaw);
    let attach = last(StageRole::AttachRaw);

    if let Some(attach_at) = first(StageRole::AttachRaw)
        && preserve.is_none_or(|p| p > attach_at)
    {
        return Err(CompileError::InvalidPipeline(format!(
            "stage '{}' attaches raw code text that no earlier stage preserved",
            stages[attach_at].name()
        )));
    }

    for (index, stage) in stages.iter().enumerate() {
        if stage.role() != StageRole::Highlight {
            continue;
        }
        if preserve.is_none_or(|p| p > index) {
            return Err(CompileError::InvalidPipeline(format!(
                "stage '{}' rewrites code before its raw text is preserved",
                stage.name()
            )));
        }
        if attach.is_none_or(|a| a < index) {
            return Err(CompileError::InvalidPipeline(format!(
                "stage '{}' rewrites code but no later stage attaches the raw text",
                stage.name()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::AutolinkBehavior;
    use crate::registry::defaults::docs_registry;

    fn boxed(stages: Vec<Box<dyn Stage>>) -> Result<Pipeline, CompileError> {
        Pipeline::new(ParseOptions::default(), stages)
    }

    fn highlight() -> Box<dyn Stage> {
        Box::new(Highlight::new(crate::options::DEFAULT_THEME).unwrap())
    }

    #[test]
    fn standard_order() {
        let pipeline =
            Pipeline::standard(Arc::new(docs_registry()), &CompileOptions::default()).unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec![
                "resolve-components",
                "preserve-raw-code",
                "code-title",
                "heading-ids",
                "heading-autolinks",
                "highlight",
                "attach-raw-code",
            ]
        );
    }

    #[test]
    fn highlight_before_preserve_rejected() {
        let err = boxed(vec![highlight(), Box::new(PreserveRawCode), Box::new(AttachRawCode)])
            .unwrap_err();
        assert!(matches!(err, CompileError::InvalidPipeline(_)), "{err:?}");
    }

    #[test]
    fn highlight_without_attach_rejected() {
        let err = boxed(vec![Box::new(PreserveRawCode), highlight()]).unwrap_err();
        assert!(matches!(err, CompileError::InvalidPipeline(ref m) if m.contains("attaches")));
    }

    #[test]
    fn attach_without_preserve_rejected() {
        let err = boxed(vec![Box::new(AttachRawCode)]).unwrap_err();
        assert!(matches!(err, CompileError::InvalidPipeline(_)));
    }

    #[test]
    fn heading_stages_may_move_freely() {
        let pipeline = boxed(vec![
            Box::new(HeadingAutolinks::new(AutolinkBehavior::Wrap)),
            Box::new(PreserveRawCode),
            highlight(),
            Box::new(HeadingIds),
            Box::new(AttachRawCode),
        ]);
        assert!(pipeline.is_ok());
    }

    #[test]
    fn unclosed_fence_fails_compile() {
        let pipeline =
            Pipeline::standard(Arc::new(docs_registry()), &CompileOptions::default()).unwrap();
        let err = pipeline.compile("## Intro\n\n```js\nconst x = 1;\n").unwrap_err();
        match err {
            CompileError::MalformedBlock { location, message } => {
                assert_eq!(location.line, 3);
                assert!(message.contains("never closed"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn fence_left_open_in_list_fails_compile() {
        let pipeline =
            Pipeline::standard(Arc::new(docs_registry()), &CompileOptions::default()).unwrap();
        let err = pipeline.compile("Intro.\n\n- ```js\n  const x = 1;\n").unwrap_err();
        assert!(
            matches!(err, CompileError::MalformedBlock { ref location, .. } if location.line == 3),
            "{err:?}"
        );
        assert!(pipeline.compile("- ```js\n  const x = 1;\n  ```\n").is_ok());
    }
}
