//! Component binding registry.

/// Built-in bindings.
pub mod defaults;
/// Registry types.
pub mod types;

pub use types::{ComponentBinding, ComponentRegistry, RegistryConfig};
