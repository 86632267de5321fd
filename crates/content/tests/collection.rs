use quill_compiler::Assembler;
use quill_content::{
    Collection, CollectionLoader, ContentConfig, ContentKind, LoadError, sort_by_date_desc,
};
use quill_core::{CompileError, DocFrontmatter};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn page(title: &str, body: &str) -> String {
    format!("---\ntitle: {title}\ndescription: About {title}\n---\n{body}")
}

fn post(title: &str, date: &str) -> String {
    format!(
        "---\ntitle: {title}\ndescription: d\ndate: {date}\nauthors:\n  - handle: '@ada'\n    username: Ada\n    handleUrl: https://example.com/ada\n---\nBody of {title}\n"
    )
}

fn site() -> (TempDir, ContentConfig) {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "content/docs/index.mdx",
        &page("Home", "## Welcome\n\n<Callout>\nRead this.\n</Callout>\n"),
    );
    write(
        root,
        "content/docs/guides/install.md",
        &page("Install", "## Setup\n\n```sh\nnpm install quill\n```\n\n## Setup\n"),
    );
    write(root, "content/blog/first.md", &post("First", "2024-01-05"));
    write(root, "content/blog/second.md", &post("Second", "2024-06-01"));
    write(
        root,
        "quill.yaml",
        "docsDir: content/docs\npostsDir: content/blog\nmaxThreads: 2\n",
    );
    let config = ContentConfig::from_path(root.join("quill.yaml")).unwrap();
    (dir, config)
}

fn assembler(config: &ContentConfig) -> Arc<Assembler> {
    Arc::new(Assembler::new(Arc::new(config.registry()), &config.compile).unwrap())
}

#[test]
fn config_paths_resolve_against_file() {
    let (dir, config) = site();
    assert_eq!(config.docs_dir, dir.path().join("content/docs"));
    assert_eq!(config.max_threads, Some(2));
}

#[test]
fn find_compiles_nested_doc() {
    let (_dir, config) = site();
    let docs = Collection::docs(&config, assembler(&config)).unwrap();
    assert_eq!(docs.ids().unwrap(), vec!["guides/install", "index"]);

    let install = docs.find("guides/install").unwrap().unwrap();
    assert_eq!(install.frontmatter.title, "Install");
    let hrefs: Vec<_> = install.toc.iter().map(|h| h.href.as_str()).collect();
    assert_eq!(hrefs, vec!["#setup", "#setup"]);
    assert_eq!(install.tree.code_blocks()[0].raw, Some("npm install quill\n"));
}

#[test]
fn find_missing_is_none() {
    let (_dir, config) = site();
    let docs = Collection::docs(&config, assembler(&config)).unwrap();
    assert!(docs.find("guides/missing").unwrap().is_none());
    assert!(docs.find("../quill").unwrap().is_none());
}

#[test]
fn compile_error_propagates_from_find() {
    let (dir, config) = site();
    write(dir.path(), "content/docs/bad.md", "---\ndescription: no title\n---\n");
    let docs = Collection::docs(&config, assembler(&config)).unwrap();
    let err = docs.find("bad").unwrap_err();
    assert!(matches!(
        err,
        LoadError::Compile {
            source: CompileError::MalformedFrontmatter(_),
            ..
        }
    ));
}

#[test]
fn compile_all_is_all_or_nothing() {
    let (dir, config) = site();
    let docs = Collection::docs(&config, assembler(&config)).unwrap();
    assert_eq!(docs.compile_all().unwrap().len(), 2);

    write(
        dir.path(),
        "content/docs/broken.mdx",
        &page("Broken", "<NotRegistered />\n"),
    );
    match docs.compile_all() {
        Err(LoadError::Compile { id, source }) => {
            assert_eq!(id, "broken");
            assert!(matches!(source, CompileError::UnresolvedComponent { .. }));
        }
        other => panic!("expected compile failure, got {other:?}"),
    }
}

#[test]
fn posts_sorted_newest_first() {
    let (_dir, config) = site();
    let posts = Collection::posts(&config, assembler(&config)).unwrap();
    let mut entries = posts.compile_all().unwrap();
    sort_by_date_desc(&mut entries);
    let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["second", "first"]);
}

#[test]
fn missing_root_fails_batch_but_lists_empty() {
    let dir = TempDir::new().unwrap();
    let config = ContentConfig::default();
    let loader = CollectionLoader::new(dir.path().join("absent"), ContentKind::Docs);
    let docs = Collection::<DocFrontmatter>::new(loader, assembler(&config));
    assert!(docs.ids().unwrap().is_empty());
    assert!(matches!(docs.compile_all(), Err(LoadError::MissingRoot { .. })));
    assert!(docs.find("anything").unwrap().is_none());
}
