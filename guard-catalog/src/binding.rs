//! Explicit registration helper pairing a definition with its implementation.

use std::sync::Arc;

use guard_primitives::{Result, ToolDefinition};

use crate::catalog::{Tool, ToolCatalog};

/// Declarative pairing of a tool definition and an executor, registered at
/// setup time.
///
/// Bindings decouple where a tool function is written from where it is
/// registered: integration code builds the binding next to the function and
/// hands it to whichever catalog the application wires up.
#[derive(Clone)]
pub struct ToolBinding {
    definition: ToolDefinition,
    executor: Arc<dyn Tool>,
}

impl ToolBinding {
    /// Creates a new binding from a definition and an executor.
    #[must_use]
    pub fn new<T>(definition: ToolDefinition, tool: T) -> Self
    where
        T: Tool + 'static,
    {
        Self {
            definition,
            executor: Arc::new(tool),
        }
    }

    /// Returns the definition associated with this binding.
    #[must_use]
    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    /// Registers the binding with the provided catalog.
    ///
    /// # Errors
    ///
    /// Propagates [`guard_primitives::Error::ToolAlreadyRegistered`] if a
    /// tool with the same name already exists.
    pub fn register(self, catalog: &ToolCatalog) -> Result<()> {
        let ToolBinding {
            definition,
            executor,
        } = self;
        catalog.register_dyn(definition, executor)
    }

    /// Registers the binding with the process-wide shared catalog.
    ///
    /// # Errors
    ///
    /// Propagates [`guard_primitives::Error::ToolAlreadyRegistered`] if a
    /// tool with the same name already exists.
    pub fn register_shared(self) -> Result<()> {
        self.register(&ToolCatalog::shared())
    }
}
