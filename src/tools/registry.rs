use crate::tools::types::{ToolContext, ToolDefinition, ToolResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait that all tools must implement
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool definition for the AI API
    fn definition(&self) -> ToolDefinition;

    /// Executes the tool with the given parameters
    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult;

    /// Returns the tool's name
    fn name(&self) -> String {
        self.definition().name
    }
}

/// Registry that holds all available tools, keyed by name.
/// Uses interior mutability (RwLock) so tools can be registered at runtime
/// without requiring &mut self.
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        ToolRegistry {
            tools: RwLock::new(HashMap::new()),
        }
    }

    /// Register a tool (thread-safe, takes &self via interior mutability)
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        self.tools.write().insert(name, tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().get(name).cloned()
    }

    /// List all registered tools
    pub fn list(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.read().is_empty()
    }

    /// Tool definitions for binding into a model request, sorted by name so
    /// the catalogue order is stable across runs
    pub fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> =
            self.tools.read().values().map(|t| t.definition()).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Execute a named tool. Unknown names and missing user context come
    /// back as error results, never as panics or propagated errors, so one
    /// bad call cannot take down a batch.
    pub async fn execute(&self, name: &str, params: Value, context: &ToolContext) -> ToolResult {
        if context.user_id.is_none() {
            log::error!("Tool '{}' invoked with no acting user in context", name);
            return ToolResult::missing_user();
        }

        let tool = match self.get(name) {
            Some(tool) => tool,
            None => {
                log::warn!("Unknown tool requested: {}", name);
                return ToolResult::error(format!("Unknown tool: {}", name));
            }
        };

        tool.execute(params, context).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::tools::types::ToolInputSchema;
    use std::collections::HashMap;
    use uuid::Uuid;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "echo".to_string(),
                description: "Echo the input".to_string(),
                input_schema: ToolInputSchema::object(HashMap::new(), &[]),
            }
        }

        async fn execute(&self, params: Value, _context: &ToolContext) -> ToolResult {
            ToolResult::success(params.to_string())
        }
    }

    fn context_with_user() -> ToolContext {
        let db = Arc::new(Database::new(":memory:").unwrap());
        ToolContext::new(db).with_user(Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_execute_registered_tool() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        assert_eq!(registry.len(), 1);

        let result = registry
            .execute("echo", serde_json::json!({"x": 1}), &context_with_user())
            .await;
        assert!(result.success);
        assert!(result.content.contains("\"x\":1"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error_result() {
        let registry = ToolRegistry::new();
        let result = registry
            .execute("nope", Value::Null, &context_with_user())
            .await;
        assert!(!result.success);
        assert!(result.content.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_execute_without_user_refuses() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        let db = Arc::new(Database::new(":memory:").unwrap());
        let context = ToolContext::new(db);
        let result = registry.execute("echo", Value::Null, &context).await;
        assert!(result.is_missing_user());
    }

    #[test]
    fn test_definitions_are_sorted() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        let defs = registry.get_tool_definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
    }
}
