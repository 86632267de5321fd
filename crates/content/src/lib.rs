#![deny(missing_docs)]
//! quill content: docs and posts collections on disk, loaded and compiled in batches.

/// Compiled collections.
pub mod collection;
/// Content configuration.
pub mod config;
/// Load errors.
pub mod error;
/// Filesystem loader.
pub mod loader;

pub use collection::{Collection, Entry, sort_by_date_desc};
pub use config::{ContentConfig, ContentKind};
pub use error::LoadError;
pub use loader::{CollectionLoader, LoadedDocument};
