//! Complete task tool - marks a task completed after an ownership check

use crate::models::{TaskStatus, UpdateTaskRequest};
use crate::tools::builtin::lookup_owned_task;
use crate::tools::registry::Tool;
use crate::tools::types::{PropertySchema, ToolContext, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

pub struct CompleteTaskTool {
    definition: ToolDefinition,
}

impl CompleteTaskTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "task_id".to_string(),
            PropertySchema::string("ID of the task to mark as completed."),
        );

        CompleteTaskTool {
            definition: ToolDefinition {
                name: "complete_task".to_string(),
                description: "Mark one of the current user's tasks as completed.".to_string(),
                input_schema: ToolInputSchema::object(properties, &["task_id"]),
            },
        }
    }
}

impl Default for CompleteTaskTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct CompleteTaskParams {
    task_id: String,
}

#[async_trait]
impl Tool for CompleteTaskTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let user_id = match context.require_user() {
            Ok(id) => id,
            Err(_) => return ToolResult::missing_user(),
        };

        let params: CompleteTaskParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        let task = match lookup_owned_task(context, user_id, &params.task_id) {
            Ok(task) => task,
            Err(message) => return ToolResult::error(message),
        };

        if task.status == TaskStatus::Completed {
            return ToolResult::success(format!("Task '{}' is already completed", task.name));
        }

        let request = UpdateTaskRequest {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };

        match context.db.update_task(task.id, &request) {
            Ok(Some(updated)) => {
                ToolResult::success(format!("Task '{}' marked as completed", updated.name))
            }
            Ok(None) => ToolResult::error(format!("Task {} not found", task.id)),
            Err(e) => ToolResult::error(format!("Error completing task: {}", e)),
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
    async fn test_complete_own_task() {
        let (db, context, user_id) = context_for("alice");
        let task = seed_task(&db, user_id, "Finish report", TaskPriority::High);

        let tool = CompleteTaskTool::new();
        let result = tool
            .execute(json!({"task_id": task.id.to_string()}), &context)
            .await;

        assert!(result.success);
        assert!(result.content.contains("marked as completed"));

        let stored = db.get_task(task.id).unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Completed);
        assert!(stored.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_complete_random_id_reports_not_found() {
        let (_db, context, _user_id) = context_for("alice");
        let tool = CompleteTaskTool::new();

        let result = tool
            .execute(json!({"task_id": uuid::Uuid::new_v4().to_string()}), &context)
            .await;
        assert!(!result.success);
        assert!(result.content.contains("not found"));
    }

    #[tokio::test]
    async fn test_complete_someone_elses_task_leaves_it_untouched() {
        let (db, _alice_context, alice_id) = context_for("alice");
        let task = seed_task(&db, alice_id, "Alice's", TaskPriority::Medium);
        let (bob_context, _bob_id) = other_user(&db, "bob");

        let tool = CompleteTaskTool::new();
        let result = tool
            .execute(json!({"task_id": task.id.to_string()}), &bob_context)
            .await;

        assert!(!result.success);
        assert!(result.content.contains("does not belong"));
        assert_eq!(db.get_task(task.id).unwrap().unwrap().status, TaskStatus::Pending);
    }
}
