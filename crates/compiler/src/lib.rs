#![deny(missing_docs)]
//! quill compiler: document tree, stage pipeline, component registry and HTML output.

/// Frontmatter + body assembly.
pub mod assemble;
/// MDAST to tree lowering.
pub mod lower;
/// Compile options.
pub mod options;
/// Stage trait and ordered pipeline.
pub mod pipeline;
/// Component tag registry.
pub mod registry;
/// HTML serialization.
pub mod render;
/// Built-in stages.
pub mod stages;
/// Compiled tree types.
pub mod tree;

pub use assemble::{Assembler, CompiledDocument};
pub use lower::lower;
pub use options::{AutolinkBehavior, CompileOptions, DEFAULT_THEME};
pub use pipeline::{Pipeline, Stage, StageRole};
pub use registry::{ComponentBinding, ComponentRegistry, RegistryConfig};
pub use render::to_html;
pub use tree::{CodeBlockView, Component, Element, Node, NodeData, PropValue, Tree};
