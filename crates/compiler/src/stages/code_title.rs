use crate::pipeline::{Stage, StageRole};
use crate::tree::{Element, Tree};
use once_cell::sync::Lazy;
use quill_core::CompileError;
use regex::Regex;

static META_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:^|\s)title=(?:"([^"]*)"|'([^']*)')"#).expect("valid title regex")
});

/// Lifts a file title off the fence annotation into `data-title`.
///
/// Two spellings are accepted: ```` ```js title="app.js" ```` and
/// ```` ```js:app.js ````. Only attributes change; the code text and the
/// preserved raw copy are left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeTitle;

impl Stage for CodeTitle {
    fn name(&self) -> &'static str {
        "code-title"
    }

    fn role(&self) -> StageRole {
        StageRole::Annotate
    }

    fn apply(&self, mut tree: Tree) -> Result<Tree, CompileError> {
        tree.try_for_each_element_mut(|el| {
            if el.is_code_block()
                && let Some(title) = take_meta_title(el).or_else(|| take_language_title(el))
            {
                el.properties.insert("data-title".to_string(), title);
            }
            Ok(())
        })?;
        Ok(tree)
    }
}

fn take_meta_title(pre: &mut Element) -> Option<String> {
    let meta = pre.property("data-meta")?;
    let caps = META_TITLE.captures(meta)?;
    let title = caps.get(1).or_else(|| caps.get(2))?.as_str().to_string();
    let whole = caps.get(0)?.range();

    let mut rest = meta.to_string();
    rest.replace_range(whole, " ");
    let rest = rest.trim();
    if rest.is_empty() {
        pre.properties.remove("data-meta");
    } else {
        pre.properties.insert("data-meta".to_string(), rest.to_string());
    }
    Some(title)
}

fn take_language_title(pre: &mut Element) -> Option<String> {
    let code = pre.code_child_mut()?;
    let class = code.property("class")?;
    let (language, title) = class.strip_prefix("language-")?.split_once(':')?;
    if title.is_empty() {
        return None;
    }
    let title = title.to_string();
    let class = format!("language-{language}");
    code.properties.insert("class".to_string(), class);
    Some(title)
}
