//! List tasks tool - enumerate the acting user's tasks

use crate::models::TaskStatus;
use crate::tools::builtin::format_task_line;
use crate::tools::registry::Tool;
use crate::tools::types::{PropertySchema, ToolContext, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

const DEFAULT_LIST_LIMIT: i64 = 50;

pub struct ListTasksTool {
    definition: ToolDefinition,
}

impl ListTasksTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "status".to_string(),
            PropertySchema::string_enum(
                "Only list tasks with this status.",
                &["pending", "in_progress", "completed", "cancelled"],
            ),
        );
        properties.insert(
            "limit".to_string(),
            PropertySchema::integer("Maximum number of tasks to return (default 50)."),
        );

        ListTasksTool {
            definition: ToolDefinition {
                name: "list_tasks".to_string(),
                description: "List the current user's tasks, optionally filtered by status."
                    .to_string(),
                input_schema: ToolInputSchema::object(properties, &[]),
            },
        }
    }
}

impl Default for ListTasksTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ListTasksParams {
    status: Option<String>,
    limit: Option<i64>,
}

#[async_trait]
impl Tool for ListTasksTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let user_id = match context.require_user() {
            Ok(id) => id,
            Err(_) => return ToolResult::missing_user(),
        };

        let params: ListTasksParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        let status = match params.status.as_deref() {
            Some(raw) => match TaskStatus::from_str(raw) {
                Some(s) => Some(s),
                None => {
                    return ToolResult::error(format!(
                        "Invalid status '{}'. Must be pending, in_progress, completed, or cancelled.",
                        raw
                    ))
                }
            },
            None => None,
        };

        let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, 200);

        let tasks = match context.db.list_tasks_for_user(user_id, status, None, limit, 0) {
            Ok(tasks) => tasks,
            Err(e) => return ToolResult::error(format!("Error retrieving tasks: {}", e)),
        };

        if tasks.is_empty() {
            return ToolResult::success("No tasks found for current user");
        }

        let lines: Vec<String> = tasks.iter().map(format_task_line).collect();
        ToolResult::success(format!(
            "Found {} task(s):\n{}",
            tasks.len(),
            lines.join("\n")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskPriority, UpdateTaskRequest};
    use crate::tools::builtin::test_support::{context_for, seed_task};
    use serde_json::json;

    #[tokio::test]
    async fn test_list_empty() {
        let (_db, context, _user_id) = context_for("alice");
        let tool = ListTasksTool::new();

        let result = tool.execute(json!({}), &context).await;
        assert!(result.success);
        assert!(result.content.contains("No tasks found"));
    }

    #[tokio::test]
    async fn test_list_all_tasks() {
        let (db, context, user_id) = context_for("alice");
        seed_task(&db, user_id, "Task 1", TaskPriority::High);
        seed_task(&db, user_id, "Task 2", TaskPriority::Medium);
        seed_task(&db, user_id, "Task 3", TaskPriority::Low);

        let tool = ListTasksTool::new();
        let result = tool.execute(json!({}), &context).await;

        assert!(result.success);
        assert!(result.content.contains("Found 3 task(s)"));
        assert!(result.content.contains("Task 1"));
        assert!(result.content.contains("Task 3"));
    }

    #[tokio::test]
    async fn test_list_with_status_filter() {
        let (db, context, user_id) = context_for("alice");
        seed_task(&db, user_id, "Task 1", TaskPriority::Medium);
        let second = seed_task(&db, user_id, "Task 2", TaskPriority::Medium);
        db.update_task(
            second.id,
            &UpdateTaskRequest {
                status: Some(TaskStatus::InProgress),
                ..Default::default()
            },
        )
        .unwrap();

        let tool = ListTasksTool::new();
        let result = tool.execute(json!({"status": "in_progress"}), &context).await;

        assert!(result.success);
        assert!(result.content.contains("Found 1 task(s)"));
        assert!(result.content.contains("Task 2"));
        assert!(!result.content.contains("Task 1"));
    }

    #[tokio::test]
    async fn test_list_respects_limit() {
        let (db, context, user_id) = context_for("alice");
        for i in 0..5 {
            seed_task(&db, user_id, &format!("Task {}", i), TaskPriority::Medium);
        }

        let tool = ListTasksTool::new();
        let result = tool.execute(json!({"limit": 2}), &context).await;

        assert!(result.success);
        assert!(result.content.contains("Found 2 task(s)"));
    }

    #[tokio::test]
    async fn test_list_invalid_status() {
        let (_db, context, _user_id) = context_for("alice");
        let tool = ListTasksTool::new();

        let result = tool.execute(json!({"status": "finished"}), &context).await;
        assert!(!result.success);
        assert!(result.content.contains("Invalid status"));
    }
}
