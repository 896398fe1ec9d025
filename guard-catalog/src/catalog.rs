//! Runtime catalog pairing tool definitions with their implementations.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, OnceLock, RwLock};

use async_trait::async_trait;
use guard_primitives::{Error, Result, ToolDefinition};
use serde_json::{Map, Value};
use tracing::debug;

/// Named arguments supplied to a tool invocation.
pub type Arguments = Map<String, Value>;

/// Trait implemented by tool executors.
///
/// Implementations are supplied by the embedding application and invoked by
/// the enforcement gate, never inspected.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Invokes the tool with the given named arguments, returning JSON output.
    async fn invoke(&self, arguments: Arguments) -> Result<Value>;
}

#[async_trait]
impl<F, Fut> Tool for F
where
    F: Send + Sync + Fn(Arguments) -> Fut,
    Fut: Future<Output = Result<Value>> + Send,
{
    async fn invoke(&self, arguments: Arguments) -> Result<Value> {
        (self)(arguments).await
    }
}

/// Handle pairing one definition with exactly one implementation.
#[derive(Clone)]
pub struct ToolHandle {
    definition: ToolDefinition,
    executor: Arc<dyn Tool>,
}

impl ToolHandle {
    /// Returns the associated definition.
    #[must_use]
    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    /// Executes the underlying tool implementation.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by the implementation.
    pub async fn invoke(&self, arguments: Arguments) -> Result<Value> {
        self.executor.invoke(arguments).await
    }
}

/// Catalog of available tools, keyed by globally unique name.
///
/// Registration happens during setup; lookups are safe for concurrent
/// readers once setup completes. Classifiers enumerate the catalog to build
/// their grant-mapping universe, so every tool must be registered before the
/// first classification against this catalog.
#[derive(Default)]
pub struct ToolCatalog {
    inner: RwLock<HashMap<String, ToolHandle>>,
}

impl std::fmt::Debug for ToolCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().expect("tool catalog poisoned");
        let mut names: Vec<_> = inner.keys().cloned().collect();
        names.sort_unstable();
        f.debug_struct("ToolCatalog")
            .field("registered", &names)
            .finish()
    }
}

impl ToolCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide shared catalog, created on first use.
    ///
    /// A convenience for integrations that register tools from unrelated
    /// setup sites. The core contract supports any number of independent
    /// catalogs; prefer passing an explicit catalog through the call chain.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<ToolCatalog>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(Self::new())).clone()
    }

    /// Registers a tool definition together with its implementation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolAlreadyRegistered`] if the name is already
    /// present; the first registration is left intact.
    ///
    /// # Panics
    ///
    /// Panics if the internal catalog lock is poisoned.
    pub fn register<T>(&self, definition: ToolDefinition, tool: T) -> Result<()>
    where
        T: Tool + 'static,
    {
        self.register_dyn(definition, Arc::new(tool))
    }

    pub(crate) fn register_dyn(
        &self,
        definition: ToolDefinition,
        executor: Arc<dyn Tool>,
    ) -> Result<()> {
        let mut inner = self.inner.write().expect("tool catalog poisoned");
        let name = definition.name().to_owned();
        if inner.contains_key(&name) {
            return Err(Error::ToolAlreadyRegistered { name });
        }

        debug!(tool = %name, risk = %definition.risk_level(), "tool registered");
        inner.insert(
            name,
            ToolHandle {
                definition,
                executor,
            },
        );

        Ok(())
    }

    /// Returns a handle to the tool matching the supplied name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ToolHandle> {
        let inner = self.inner.read().ok()?;
        inner.get(name).cloned()
    }

    /// Returns the definition registered under the supplied name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolNotFound`] when the tool is not registered.
    pub fn definition(&self, name: &str) -> Result<ToolDefinition> {
        self.get(name)
            .map(|handle| handle.definition.clone())
            .ok_or_else(|| Error::ToolNotFound {
                name: name.to_owned(),
            })
    }

    /// Returns the full name-to-definition mapping, ordered by name.
    ///
    /// # Panics
    ///
    /// Panics if the internal catalog lock is poisoned.
    #[must_use]
    pub fn definitions(&self) -> BTreeMap<String, ToolDefinition> {
        let inner = self.inner.read().expect("tool catalog poisoned");
        inner
            .iter()
            .map(|(name, handle)| (name.clone(), handle.definition.clone()))
            .collect()
    }

    /// Returns the count of registered tools.
    ///
    /// # Panics
    ///
    /// Panics if the internal catalog lock is poisoned.
    #[must_use]
    pub fn size(&self) -> usize {
        self.inner.read().expect("tool catalog poisoned").len()
    }

    /// Returns whether the catalog holds no tools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guard_primitives::{ParameterType, RiskLevel, ToolParameter};
    use serde_json::json;

    fn definition(name: &str) -> ToolDefinition {
        ToolDefinition::builder(name)
            .unwrap()
            .description("Echo incoming arguments")
            .unwrap()
            .risk_level(RiskLevel::READ_ONLY)
            .add_parameter(
                ToolParameter::new("message", ParameterType::String, "Payload")
                    .unwrap()
                    .required(),
            )
            .unwrap()
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn register_and_invoke() {
        let catalog = ToolCatalog::new();
        catalog
            .register(definition("echo"), |arguments: Arguments| async move {
                Ok(Value::Object(arguments))
            })
            .unwrap();

        let handle = catalog.get("echo").expect("registered");
        let mut arguments = Arguments::new();
        arguments.insert("message".into(), json!("hello"));
        let output = handle.invoke(arguments.clone()).await.unwrap();
        assert_eq!(output, Value::Object(arguments));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let catalog = ToolCatalog::new();
        catalog
            .register(definition("echo"), |_: Arguments| async { Ok(Value::Null) })
            .unwrap();

        let err = catalog
            .register(definition("echo"), |_: Arguments| async { Ok(Value::Null) })
            .expect_err("duplicate registration should fail");

        assert!(matches!(err, Error::ToolAlreadyRegistered { name } if name == "echo"));
        assert_eq!(catalog.size(), 1);
    }

    #[test]
    fn missing_definition_errors() {
        let catalog = ToolCatalog::new();
        let err = catalog.definition("missing").expect_err("unknown tool");
        assert!(matches!(err, Error::ToolNotFound { name } if name == "missing"));
    }

    #[test]
    fn definitions_are_ordered_by_name() {
        let catalog = ToolCatalog::new();
        for name in ["zeta", "alpha", "mid"] {
            catalog
                .register(definition(name), |_: Arguments| async { Ok(Value::Null) })
                .unwrap();
        }

        let names: Vec<_> = catalog.definitions().into_keys().collect();
        assert_eq!(names, ["alpha", "mid", "zeta"]);
    }
}
