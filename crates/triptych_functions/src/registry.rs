//! In-memory function registry.

use std::collections::BTreeMap;
use triptych_core::FunctionDefinition;
use triptych_interface::FunctionRegistry;

/// Function definitions keyed by name.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFunctionRegistry {
    functions: BTreeMap<String, FunctionDefinition>,
}

impl InMemoryFunctionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, builder style.
    pub fn with(mut self, definition: FunctionDefinition) -> Self {
        self.register(definition);
        self
    }

    /// Register a definition, replacing any previous one with the same name.
    pub fn register(&mut self, definition: FunctionDefinition) -> Option<FunctionDefinition> {
        tracing::debug!(
            function = %definition.name,
            mode = %definition.mode,
            "Registering function"
        );
        self.functions.insert(definition.name.clone(), definition)
    }

    /// Number of registered functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether no functions are registered.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl FromIterator<FunctionDefinition> for InMemoryFunctionRegistry {
    fn from_iter<T: IntoIterator<Item = FunctionDefinition>>(iter: T) -> Self {
        let mut registry = Self::new();
        for definition in iter {
            registry.register(definition);
        }
        registry
    }
}

impl FunctionRegistry for InMemoryFunctionRegistry {
    fn get_function_definition(&self, name: &str) -> Option<FunctionDefinition> {
        self.functions.get(name).cloned()
    }

    fn definitions(&self) -> Vec<FunctionDefinition> {
        self.functions.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_replaces_by_name() {
        let mut registry = InMemoryFunctionRegistry::new()
            .with(FunctionDefinition::mock("lookup", json!(1)));
        let previous = registry.register(FunctionDefinition::mock("lookup", json!(2)));
        assert!(previous.is_some());
        assert_eq!(registry.len(), 1);
        let def = registry.get_function_definition("lookup").unwrap();
        assert_eq!(def.mock_response, Some(json!(2)));
        assert!(registry.get_function_definition("missing").is_none());
    }
}
