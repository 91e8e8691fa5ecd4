//! Remove task tool - deletes a task after an ownership check

use crate::tools::builtin::lookup_owned_task;
use crate::tools::registry::Tool;
use crate::tools::types::{PropertySchema, ToolContext, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

pub struct RemoveTaskTool {
    definition: ToolDefinition,
}

impl RemoveTaskTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "task_id".to_string(),
            PropertySchema::string("ID of the task to remove."),
        );

        RemoveTaskTool {
            definition: ToolDefinition {
                name: "remove_task".to_string(),
                description: "Delete one of the current user's tasks by ID.".to_string(),
                input_schema: ToolInputSchema::object(properties, &["task_id"]),
            },
        }
    }
}

impl Default for RemoveTaskTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct RemoveTaskParams {
    task_id: String,
}

#[async_trait]
impl Tool for RemoveTaskTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let user_id = match context.require_user() {
            Ok(id) => id,
            Err(_) => return ToolResult::missing_user(),
        };

        let params: RemoveTaskParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        let task = match lookup_owned_task(context, user_id, &params.task_id) {
            Ok(task) => task,
            Err(message) => return ToolResult::error(message),
        };

        match context.db.delete_task(task.id) {
            Ok(true) => ToolResult::success(format!("Task {} removed successfully", task.id)),
            Ok(false) => ToolResult::error(format!("Task {} not found", task.id)),
            Err(e) => ToolResult::error(format!("Error removing task: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskPriority;
    use crate::tools::builtin::test_support::{context_for, other_user, seed_task};
    use serde_json::json;

    #[tokio::test]
    async fn test_remove_own_task() {
        let (db, context, user_id) = context_for("alice");
        let task = seed_task(&db, user_id, "To Delete", TaskPriority::Medium);

        let tool = RemoveTaskTool::new();
        let result = tool
            .execute(json!({"task_id": task.id.to_string()}), &context)
            .await;

        assert!(result.success);
        assert!(result.content.contains("removed successfully"));
        assert!(db.get_task(task.id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_nonexistent_task() {
        let (_db, context, _user_id) = context_for("alice");
        let tool = RemoveTaskTool::new();

        let result = tool
            .execute(json!({"task_id": uuid::Uuid::new_v4().to_string()}), &context)
            .await;
        assert!(!result.success);
        assert!(result.content.contains("not found"));
    }

    #[tokio::test]
    async fn test_remove_someone_elses_task_is_refused() {
        let (db, _alice_context, alice_id) = context_for("alice");
        let task = seed_task(&db, alice_id, "Alice's", TaskPriority::Medium);
        let (bob_context, _bob_id) = other_user(&db, "bob");

        let tool = RemoveTaskTool::new();
        let result = tool
            .execute(json!({"task_id": task.id.to_string()}), &bob_context)
            .await;

        assert!(!result.success);
        assert!(result.content.contains("does not belong"));
        // Mutation never happened
        assert!(db.get_task(task.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_remove_garbage_id() {
        let (_db, context, _user_id) = context_for("alice");
        let tool = RemoveTaskTool::new();

        let result = tool.execute(json!({"task_id": "not-a-uuid"}), &context).await;
        assert!(!result.success);
        assert!(result.content.contains("not a valid task ID"));
    }
}
