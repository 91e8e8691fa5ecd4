//! Update task tool - partial edits to a task after an ownership check

use crate::models::{TaskPriority, TaskStatus, UpdateTaskRequest};
use crate::tools::builtin::{lookup_owned_task, parse_due_date};
use crate::tools::registry::Tool;
use crate::tools::types::{PropertySchema, ToolContext, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

pub struct UpdateTaskTool {
    definition: ToolDefinition,
}

impl UpdateTaskTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "task_id".to_string(),
            PropertySchema::string("ID of the task to update."),
        );
        properties.insert(
            "name".to_string(),
            PropertySchema::string("New name for the task."),
        );
        properties.insert(
            "description".to_string(),
            PropertySchema::string("New description for the task."),
        );
        properties.insert(
            "priority".to_string(),
            PropertySchema::string_enum("New priority.", &["low", "medium", "high"]),
        );
        properties.insert(
            "status".to_string(),
            PropertySchema::string_enum(
                "New status.",
                &["pending", "in_progress", "completed", "cancelled"],
            ),
        );
        properties.insert(
            "tags".to_string(),
            PropertySchema::string_array("Replacement tag list."),
        );
        properties.insert(
            "due_date".to_string(),
            PropertySchema::string("New due date: YYYY-MM-DD, YYYY-MM-DD HH:MM, or RFC 3339."),
        );

        UpdateTaskTool {
            definition: ToolDefinition {
                name: "update_task".to_string(),
                description:
                    "Update fields of one of the current user's tasks. Only supplied fields change."
                        .to_string(),
                input_schema: ToolInputSchema::object(properties, &["task_id"]),
            },
        }
    }
}

impl Default for UpdateTaskTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct UpdateTaskParams {
    task_id: String,
    name: Option<String>,
    description: Option<String>,
    priority: Option<String>,
    status: Option<String>,
    tags: Option<Vec<String>>,
    due_date: Option<String>,
}

#[async_trait]
impl Tool for UpdateTaskTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let user_id = match context.require_user() {
            Ok(id) => id,
            Err(_) => return ToolResult::missing_user(),
        };

        let params: UpdateTaskParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        let task = match lookup_owned_task(context, user_id, &params.task_id) {
            Ok(task) => task,
            Err(message) => return ToolResult::error(message),
        };

        let priority = match params.priority.as_deref() {
            Some(raw) => match TaskPriority::from_str(raw) {
                Some(p) => Some(p),
                None => {
                    return ToolResult::error(format!(
                        "Invalid priority '{}'. Must be low, medium, or high.",
                        raw
                    ))
                }
            },
            None => None,
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

        let due_at = match params.due_date.as_deref() {
            Some(raw) => match parse_due_date(raw) {
                Ok(dt) => Some(dt),
                Err(e) => return ToolResult::error(format!("Error updating task: {}", e)),
            },
            None => None,
        };

        let request = UpdateTaskRequest {
            name: params.name,
            description: params.description,
            priority,
            status,
            tags: params.tags,
            due_at,
        };

        match context.db.update_task(task.id, &request) {
            Ok(Some(updated)) => {
                ToolResult::success(format!("Task '{}' updated successfully", updated.name))
            }
            Ok(None) => ToolResult::error(format!("Task {} not found", task.id)),
            Err(e) => ToolResult::error(format!("Error updating task: {}", e)),
        }
    }
}
