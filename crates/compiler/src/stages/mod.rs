//! Built-in tree stages.

mod code_title;
mod components;
mod headings;
mod highlight;
mod raw_code;

pub use code_title::CodeTitle;
pub use components::ResolveComponents;
pub use headings::{HeadingAutolinks, HeadingIds};
pub use highlight::Highlight;
pub use raw_code::{AttachRawCode, PreserveRawCode};

#[cfg(test)]
pub(crate) fn compile_with(
    stages: Vec<Box<dyn crate::pipeline::Stage>>,
    body: &str,
) -> crate::tree::Tree {
    let mdast = quill_core::parse_mdast(body, &quill_core::ParseOptions::default()).unwrap();
    let mut tree = crate::lower::lower(&mdast, body).unwrap();
    for stage in stages {
        tree = stage.apply(tree).unwrap();
    }
    tree
}
