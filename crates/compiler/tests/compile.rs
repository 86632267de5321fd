use proptest::prelude::*;
use quill_compiler::registry::defaults::docs_registry;
use quill_compiler::stages::{AttachRawCode, PreserveRawCode};
use quill_compiler::{
    Assembler, CompileOptions, CompiledDocument, ComponentBinding, ComponentRegistry, Node,
    Pipeline, Stage, StageRole, Tree,
};
use quill_core::{
    CompileError, DocFrontmatter, FrontmatterError, HeadingEntry, ParseOptions, RawDocument,
    TocSource, extract_toc,
};
use std::sync::Arc;

fn assembler(highlight: bool) -> Assembler {
    let options = CompileOptions {
        highlight,
        ..CompileOptions::default()
    };
    Assembler::new(Arc::new(docs_registry()), &options).unwrap()
}

fn doc(body: &str) -> RawDocument {
    RawDocument::new(
        format!("---\ntitle: Test\ndescription: A test page\n---\n{body}"),
        "docs/test.mdx",
    )
}

fn compile(highlight: bool, body: &str) -> CompiledDocument<DocFrontmatter> {
    assembler(highlight).assemble(&doc(body)).unwrap()
}

#[test]
fn js_block_keeps_raw_while_tokenized() {
    let compiled = compile(true, "```js\nconst x = 1;\n```\n");
    let blocks = compiled.tree.code_blocks();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].raw, Some("const x = 1;\n"));
    assert_eq!(blocks[0].language, Some("js"));
    assert!(
        blocks[0]
            .body
            .iter()
            .any(|node| matches!(node, Node::Element(el) if el.tag == "span")),
        "body should be tokenized: {:?}",
        blocks[0].body
    );
}

#[test]
fn raw_identical_with_and_without_highlighting() {
    let body = "Text.\n\n```rust title=\"main.rs\"\nfn main() {\n    let s = \"<&>\";\n}\n```\n\n<Tabs>\n<TabItem>\n\n```sh\nnpm i\n```\n\n</TabItem>\n</Tabs>\n";
    let plain = compile(false, body);
    let highlighted = compile(true, body);

    let raws = |tree: &Tree| -> Vec<String> {
        tree.code_blocks()
            .iter()
            .map(|b| b.raw.unwrap_or_default().to_string())
            .collect()
    };
    assert_eq!(
        raws(&plain.tree),
        vec!["fn main() {\n    let s = \"<&>\";\n}\n", "npm i\n"]
    );
    assert_eq!(raws(&plain.tree), raws(&highlighted.tree));
    assert_eq!(highlighted.tree.code_blocks()[0].title, Some("main.rs"));
}

#[test]
fn missing_title_produces_no_document() {
    let raw = RawDocument::new("---\ndescription: only\n---\n## Intro\n", "docs/x.md");
    let result = assembler(true).assemble::<DocFrontmatter>(&raw);
    match result {
        Err(CompileError::MalformedFrontmatter(FrontmatterError::Schema(message))) => {
            assert!(message.contains("title"), "{message}");
        }
        other => panic!("expected frontmatter error, got {other:?}"),
    }
}

#[test]
fn missing_frontmatter_block_rejected() {
    let raw = RawDocument::new("## Intro\n", "docs/x.md");
    let err = assembler(true).assemble::<DocFrontmatter>(&raw).unwrap_err();
    assert!(matches!(err, CompileError::MalformedFrontmatter(_)));
}

#[test]
fn unregistered_tag_fails() {
    let registry: ComponentRegistry = [ComponentBinding::new("Callout")].into_iter().collect();
    let assembler =
        Assembler::new(Arc::new(registry), &CompileOptions::default()).unwrap();
    let err = assembler
        .assemble::<DocFrontmatter>(&doc("<Callout>\n<Tabs />\n</Callout>\n"))
        .unwrap_err();
    match err {
        CompileError::UnresolvedComponent { name, location } => {
            assert_eq!(name, "Tabs");
            assert_eq!(location.file.as_deref(), Some("docs/test.mdx"));
            assert_eq!(location.line, 6);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn intro_details_toc() {
    let body = "## Intro\n\ntext\n\n### Details\n";
    let expected = vec![HeadingEntry::new(2, "Intro"), HeadingEntry::new(3, "Details")];
    assert_eq!(extract_toc(body), expected);
    assert_eq!(expected[0].href, "#intro");
    assert_eq!(expected[1].href, "#details");
    assert_eq!(compile(true, body).toc, expected);
}

#[test]
fn tree_toc_follows_rendered_heading_ids() {
    let body = "## See [docs](/docs)\n\n## Intro ##\n";
    let hrefs = |toc_source| -> Vec<String> {
        let options = CompileOptions {
            toc_source,
            ..CompileOptions::default()
        };
        let compiled: CompiledDocument<DocFrontmatter> =
            Assembler::new(Arc::new(docs_registry()), &options)
                .unwrap()
                .assemble(&doc(body))
                .unwrap();
        compiled.toc.into_iter().map(|entry| entry.href).collect()
    };
    assert_eq!(hrefs(TocSource::Text), vec!["#see-docsdocs", "#intro-"]);
    assert_eq!(hrefs(TocSource::Tree), vec!["#see-docs", "#intro"]);
}

#[test]
fn duplicate_headings_share_anchor() {
    let compiled = compile(true, "## Setup\n\nfirst\n\n## Setup\n\nsecond\n");
    let hrefs: Vec<_> = compiled.toc.iter().map(|h| h.href.as_str()).collect();
    assert_eq!(hrefs, vec!["#setup", "#setup"]);
    let ids: Vec<_> = compiled
        .tree
        .elements()
        .into_iter()
        .filter_map(|el| el.property("id"))
        .collect();
    assert_eq!(ids, vec!["setup", "setup"]);
}

#[test]
fn raw_is_byte_exact_fence_interior() {
    let cases = [
        ("```js\r\na\r\nb\r\n```\r\n", "a\r\nb\r\n"),
        ("```\n\n```\n", "\n"),
        ("  ```\n  a\n    b\n  ```\n", "  a\n    b\n"),
        ("> ```sh\n> npm i\n> ```\n", "npm i\n"),
    ];
    for (body, expected) in cases {
        for highlight in [false, true] {
            let compiled = compile(highlight, body);
            assert_eq!(compiled.tree.code_blocks()[0].raw, Some(expected), "{body:?}");
        }
    }
}

#[test]
fn fence_closed_only_by_container_is_malformed_block() {
    for body in ["- ```js\n  const x = 1;\n", "> ```js\n> const x = 1;\n\nafter\n"] {
        let err = assembler(true)
            .assemble::<DocFrontmatter>(&doc(body))
            .unwrap_err();
        match err {
            CompileError::MalformedBlock { location, .. } => {
                assert_eq!(location.to_string(), "docs/test.mdx:5:3");
            }
            other => panic!("unexpected error for {body:?}: {other:?}"),
        }
    }
}

#[test]
fn unclosed_fence_is_malformed_block() {
    let err = assembler(true)
        .assemble::<DocFrontmatter>(&doc("## Intro\n\n```js\nconst x = 1;\n"))
        .unwrap_err();
    match err {
        CompileError::MalformedBlock { location, .. } => {
            assert_eq!(location.line, 7);
            assert_eq!(location.to_string(), "docs/test.mdx:7:1");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

struct Uppercase;

impl Stage for Uppercase {
    fn name(&self) -> &'static str {
        "uppercase-code"
    }

    fn role(&self) -> StageRole {
        StageRole::Highlight
    }

    fn apply(&self, mut tree: Tree) -> Result<Tree, CompileError> {
        tree.try_for_each_element_mut(|el| {
            if let Some(code) = el.code_child_mut() {
                let upper = code.text_content().to_uppercase();
                code.children = vec![Node::text(upper)];
            }
            Ok(())
        })?;
        Ok(tree)
    }
}

#[test]
fn custom_rewriting_stage_must_sit_between_raw_stages() {
    let err = Pipeline::new(
        ParseOptions::default(),
        vec![Box::new(Uppercase), Box::new(PreserveRawCode), Box::new(AttachRawCode)],
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::InvalidPipeline(_)));

    let pipeline = Pipeline::new(
        ParseOptions::default(),
        vec![Box::new(PreserveRawCode), Box::new(Uppercase), Box::new(AttachRawCode)],
    )
    .unwrap();
    let tree = pipeline.compile("```\nabc\n```\n").unwrap();
    let block = &tree.code_blocks()[0];
    assert_eq!(block.raw, Some("abc\n"));
    assert_eq!(quill_compiler::tree::text_content(block.body), "ABC\n");
}

#[test]
fn unknown_theme_rejected_at_construction() {
    let options = CompileOptions {
        theme: "solarized-nope".into(),
        ..CompileOptions::default()
    };
    let err = Assembler::new(Arc::new(docs_registry()), &options).unwrap_err();
    assert!(matches!(err, CompileError::InvalidConfig(_)));
}

#[test]
fn compiled_document_serializes_without_side_channel() {
    let compiled = compile(true, "```js\nconst x = 1;\n```\n");
    let json = serde_json::to_value(&compiled).unwrap();
    assert_eq!(json["frontmatter"]["title"], "Test");
    assert!(json["toc"].as_array().unwrap().is_empty());
    let text = json.to_string();
    assert!(text.contains("\"raw\":\"const x = 1;\\n\""));
    assert!(!text.contains("raw_text"));
}

fn content_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[ \t]{1,4}[a-z0-9 =;(){}]{0,12}",
        "[a-z][a-z0-9 =;(){}.+*/-]{0,24}",
    ]
}

proptest! {
    #[test]
    fn raw_round_trips_regardless_of_highlighting(
        lines in prop::collection::vec(content_line(), 1..6),
        eol in prop::sample::select(vec!["\n", "\r\n"]),
        indent in prop::sample::select(vec!["", " ", "  ", "   "]),
        language in prop::sample::select(vec!["js", "rust", "python", "txt", "nosuch"]),
    ) {
        let opener = format!("{indent}```{language}{eol}");
        let closer = format!("{indent}```{eol}");
        let interior: String = lines.iter().map(|line| format!("{line}{eol}")).collect();
        let body = format!("{opener}{interior}{closer}");
        let expected = &body[opener.len()..body.len() - closer.len()];

        for highlight in [false, true] {
            let compiled = compile(highlight, &body);
            let blocks = compiled.tree.code_blocks();
            prop_assert_eq!(blocks.len(), 1);
            prop_assert_eq!(blocks[0].raw, Some(expected));
        }
    }
}
