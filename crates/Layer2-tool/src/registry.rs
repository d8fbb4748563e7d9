//! Tool Registry - registration and dispatch
//!
//! Holds every tool the agent can use and routes tool calls to them.
//!
//! ## Dispatch contract
//! `dispatch` never returns an error. Unknown tool names, malformed
//! arguments, and tool failures all surface as a `ToolResult` with
//! `success == false`, so the conversation loop can always hand the model
//! something to read.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::debug;

use moon_foundation::{Error, Result, Tool, ToolContext, ToolResult, ToolSchema};

use crate::builtin;

/// Tool registry
///
/// ```ignore
/// let registry = ToolRegistry::with_builtins();
///
/// let result = registry
///     .dispatch("run_shell_command", json!({"command": "ls"}), &ctx)
///     .await;
/// ```
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Create a registry with all builtin tools registered
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        for tool in builtin::all_tools() {
            // Builtin names are distinct by construction
            let _ = registry.register(tool);
        }

        registry
    }

    /// Register a tool. Fails if the name is already taken.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(Error::DuplicateTool(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Register several tools at once
    pub fn register_all(&mut self, tools: Vec<Arc<dyn Tool>>) -> Result<()> {
        for tool in tools {
            self.register(tool)?;
        }
        Ok(())
    }

    /// Look up a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Whether a tool with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Remove a tool
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.remove(name)
    }

    /// All registered tool names
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Schemas of every registered tool, for advertising to the model
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|tool| tool.schema()).collect()
    }

    /// Execute a tool call, converting every failure mode into a failed
    /// `ToolResult`.
    pub async fn dispatch(&self, name: &str, args: Value, ctx: &ToolContext) -> ToolResult {
        let start = Instant::now();

        let result = match self.get(name) {
            Some(tool) => match tool.execute(args, ctx).await {
                Ok(result) => result,
                Err(e) => ToolResult::err(format!("Tool '{}' failed: {}", name, e)),
            },
            None => ToolResult::err(format!("Tool not found: {}", name)),
        };

        debug!(
            "Tool '{}' executed in {}ms, success: {}",
            name,
            start.elapsed().as_millis(),
            result.success
        );

        result
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed;

    #[async_trait]
    impl Tool for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema::new("fixed", "Returns a fixed payload")
        }

        async fn execute(&self, _args: Value, _ctx: &ToolContext) -> Result<ToolResult> {
            Ok(ToolResult::ok(serde_json::json!({"value": 42})))
        }
    }

    struct Broken;

    #[async_trait]
    impl Tool for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema::new("broken", "Always errors")
        }

        async fn execute(&self, _args: Value, _ctx: &ToolContext) -> Result<ToolResult> {
            Err(Error::Internal("infrastructure fault".into()))
        }
    }

    #[test]
    fn test_registry_new() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_with_builtins() {
        let registry = ToolRegistry::with_builtins();
        assert!(!registry.is_empty());
        assert!(registry.contains("run_shell_command"));
        assert!(registry.contains("file_tool"));
        assert!(registry.contains("search_tool"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Fixed)).unwrap();
        let err = registry.register(Arc::new(Fixed)).unwrap_err();
        assert!(matches!(err, Error::DuplicateTool(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_schemas() {
        let registry = ToolRegistry::with_builtins();
        let schemas = registry.schemas();
        assert_eq!(schemas.len(), registry.len());

        for schema in schemas {
            assert!(!schema.name.is_empty());
            assert_eq!(schema.parameters.schema_type, "object");
        }
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool_is_failed_result() {
        let registry = ToolRegistry::new();
        let ctx = ToolContext::default();
        let result = registry.dispatch("nope", serde_json::json!({}), &ctx).await;
        assert!(!result.success);
        assert!(result.error.as_ref().unwrap().contains("Tool not found"));
    }

    #[tokio::test]
    async fn test_dispatch_tool_error_is_failed_result() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Broken)).unwrap();
        let ctx = ToolContext::default();
        let result = registry
            .dispatch("broken", serde_json::json!({}), &ctx)
            .await;
        assert!(!result.success);
        assert!(result.error.as_ref().unwrap().contains("infrastructure fault"));
    }

    #[tokio::test]
    async fn test_dispatch_success_passes_through() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Fixed)).unwrap();
        let ctx = ToolContext::default();
        let result = registry.dispatch("fixed", serde_json::json!({}), &ctx).await;
        assert!(result.success);
        assert_eq!(result.data.as_ref().unwrap()["value"], 42);
    }
}
