//! Add task tool - creates a new task for the acting user

use crate::models::{CreateTaskRequest, TaskPriority};
use crate::tools::builtin::parse_due_date;
use crate::tools::registry::Tool;
use crate::tools::types::{PropertySchema, ToolContext, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

pub struct AddTaskTool {
    definition: ToolDefinition,
}

impl AddTaskTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "name".to_string(),
            PropertySchema::string("Name of the task to create."),
        );
        properties.insert(
            "description".to_string(),
            PropertySchema::string("Optional longer description of the task."),
        );
        properties.insert("priority".to_string(), {
            let mut schema = PropertySchema::string_enum(
                "Task priority. Defaults to 'medium'.",
                &["low", "medium", "high"],
            );
            schema.default = Some(json!("medium"));
            schema
        });
        properties.insert(
            "tags".to_string(),
            PropertySchema::string_array("Optional tags to attach to the task."),
        );
        properties.insert(
            "due_date".to_string(),
            PropertySchema::string(
                "Optional due date: YYYY-MM-DD, YYYY-MM-DD HH:MM, or RFC 3339.",
            ),
        );

        AddTaskTool {
            definition: ToolDefinition {
                name: "add_task".to_string(),
                description: "Create a new task for the current user. Returns the new task's ID."
                    .to_string(),
                input_schema: ToolInputSchema::object(properties, &["name"]),
            },
        }
    }
}

impl Default for AddTaskTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct AddTaskParams {
    name: String,
    description: Option<String>,
    #[serde(default = "default_priority")]
    priority: String,
    #[serde(default)]
    tags: Vec<String>,
    due_date: Option<String>,
}

fn default_priority() -> String {
    "medium".to_string()
}

#[async_trait]
impl Tool for AddTaskTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let user_id = match context.require_user() {
            Ok(id) => id,
            Err(_) => return ToolResult::missing_user(),
        };

        let params: AddTaskParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        if params.name.trim().is_empty() {
            return ToolResult::error("Task name cannot be empty.");
        }

        let priority = match TaskPriority::from_str(&params.priority) {
            Some(p) => p,
            None => {
                return ToolResult::error(format!(
                    "Invalid priority '{}'. Must be low, medium, or high.",
                    params.priority
                ))
            }
        };

        let due_at = match params.due_date.as_deref() {
            Some(raw) => match parse_due_date(raw) {
                Ok(dt) => Some(dt),
                Err(e) => return ToolResult::error(format!("Error creating task: {}", e)),
            },
            None => None,
        };

        let request = CreateTaskRequest {
            name: params.name.trim().to_string(),
            description: params.description,
            priority,
            tags: params.tags,
            due_at,
        };

        match context.db.create_task(user_id, &request) {
            Ok(task) => ToolResult::success(format!(
                "Task '{}' created successfully with ID: {}",
                task.name, task.id
            )),
            Err(e) => ToolResult::error(format!("Error creating task: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::test_support::context_for;

    #[test]
    fn test_definition() {
        let tool = AddTaskTool::new();
        let def = tool.definition();
        assert_eq!(def.name, "add_task");
        assert!(def.input_schema.required.contains(&"name".to_string()));
    }

    #[tokio::test]
    async fn test_add_task_with_details() {
        let (db, context, user_id) = context_for("alice");
        let tool = AddTaskTool::new();

        let result = tool
            .execute(
                json!({
                    "name": "Test Task",
                    "description": "Test description",
                    "priority": "high",
                    "tags": ["test", "urgent"]
                }),
                &context,
            )
            .await;

        assert!(result.success);
        assert!(result.content.contains("created successfully"));
        assert!(result.content.contains("Test Task"));

        let tasks = db.list_tasks_for_user(user_id, None, None, 10, 0).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].priority, crate::models::TaskPriority::High);
        assert_eq!(tasks[0].tags, vec!["test".to_string(), "urgent".to_string()]);
    }

    #[tokio::test]
    async fn test_add_task_defaults_to_medium_priority() {
        let (db, context, user_id) = context_for("alice");
        let tool = AddTaskTool::new();

        let result = tool.execute(json!({"name": "Plain"}), &context).await;
        assert!(result.success);

        let tasks = db.list_tasks_for_user(user_id, None, None, 10, 0).unwrap();
        assert_eq!(tasks[0].priority, crate::models::TaskPriority::Medium);
    }

    #[tokio::test]
    async fn test_add_task_bad_due_date_creates_nothing() {
        let (db, context, user_id) = context_for("alice");
        let tool = AddTaskTool::new();

        let result = tool
            .execute(json!({"name": "Dated", "due_date": "whenever"}), &context)
            .await;

        assert!(!result.success);
        assert!(result.content.contains("Could not parse due date"));
        assert!(db.list_tasks_for_user(user_id, None, None, 10, 0).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_task_bad_priority() {
        let (_db, context, _user_id) = context_for("alice");
        let tool = AddTaskTool::new();

        let result = tool
            .execute(json!({"name": "X", "priority": "urgent"}), &context)
            .await;
        assert!(!result.success);
        assert!(result.content.contains("Invalid priority"));
    }

    #[tokio::test]
    async fn test_add_task_without_user_context() {
        let db = std::sync::Arc::new(crate::db::Database::new(":memory:").unwrap());
        let context = ToolContext::new(db);
        let tool = AddTaskTool::new();

        let result = tool.execute(json!({"name": "X"}), &context).await;
        assert!(result.is_missing_user());
    }
}
