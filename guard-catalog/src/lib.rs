//! Tool catalog for the CapGuard capability engine.
//!
//! The catalog describes the tools available to an agent and exclusively
//! owns their executable implementations. Classification strategies
//! enumerate it to build grant mappings; the enforcement gate resolves
//! invocations against it.

#![warn(missing_docs, clippy::pedantic)]

mod binding;
mod catalog;

/// Explicit setup-time registration helper.
pub use binding::ToolBinding;
/// Catalog, tool trait, and invocation handle.
pub use catalog::{Arguments, Tool, ToolCatalog, ToolHandle};
