//! Grouping tools - bucket the acting user's tasks by priority or status.
//! Buckets render in a fixed order; empty buckets are omitted entirely.

use crate::models::{Task, TaskPriority, TaskStatus};
use crate::tools::registry::Tool;
use crate::tools::types::{ToolContext, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

const GROUP_FETCH_LIMIT: i64 = 500;

fn fetch_all_tasks(context: &ToolContext, user_id: Uuid) -> Result<Vec<Task>, String> {
    context
        .db
        .list_tasks_for_user(user_id, None, None, GROUP_FETCH_LIMIT, 0)
        .map_err(|e| format!("Error retrieving tasks: {}", e))
}

fn render_bucket(header: &str, tasks: &[&Task]) -> String {
    let mut lines = vec![format!("{} ({}):", header, tasks.len())];
    lines.extend(tasks.iter().map(|t| format!("  - {}", t.name)));
    lines.join("\n")
}

pub struct GroupTasksByPriorityTool {
    definition: ToolDefinition,
}

impl GroupTasksByPriorityTool {
    pub fn new() -> Self {
        GroupTasksByPriorityTool {
            definition: ToolDefinition {
                name: "group_tasks_by_priority".to_string(),
                description:
                    "Group the current user's tasks by priority (high, medium, low).".to_string(),
                input_schema: ToolInputSchema::object(HashMap::new(), &[]),
            },
        }
    }
}

impl Default for GroupTasksByPriorityTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for GroupTasksByPriorityTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, _params: Value, context: &ToolContext) -> ToolResult {
        let user_id = match context.require_user() {
            Ok(id) => id,
            Err(_) => return ToolResult::missing_user(),
        };

        let tasks = match fetch_all_tasks(context, user_id) {
            Ok(tasks) => tasks,
            Err(e) => return ToolResult::error(e),
        };

        let mut sections = Vec::new();
        for priority in TaskPriority::DISPLAY_ORDER {
            let bucket: Vec<&Task> = tasks.iter().filter(|t| t.priority == priority).collect();
            if bucket.is_empty() {
                continue;
            }
            sections.push(render_bucket(
                &format!("{} Priority", priority.as_str().to_uppercase()),
                &bucket,
            ));
        }

        if sections.is_empty() {
            return ToolResult::success("No tasks found for current user");
        }
        ToolResult::success(sections.join("\n\n"))
    }
}

pub struct GroupTasksByStatusTool {
    definition: ToolDefinition,
}

impl GroupTasksByStatusTool {
    pub fn new() -> Self {
        GroupTasksByStatusTool {
            definition: ToolDefinition {
                name: "group_tasks_by_status".to_string(),
                description:
                    "Group the current user's tasks by status (pending, in_progress, completed, cancelled)."
                        .to_string(),
                input_schema: ToolInputSchema::object(HashMap::new(), &[]),
            },
        }
    }
}

impl Default for GroupTasksByStatusTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for GroupTasksByStatusTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, _params: Value, context: &ToolContext) -> ToolResult {
        let user_id = match context.require_user() {
            Ok(id) => id,
            Err(_) => return ToolResult::missing_user(),
        };

        let tasks = match fetch_all_tasks(context, user_id) {
            Ok(tasks) => tasks,
            Err(e) => return ToolResult::error(e),
        };

        let mut sections = Vec::new();
        for status in TaskStatus::DISPLAY_ORDER {
            let bucket: Vec<&Task> = tasks.iter().filter(|t| t.status == status).collect();
            if bucket.is_empty() {
                continue;
            }
            sections.push(render_bucket(&status.as_str().to_uppercase(), &bucket));
        }

        if sections.is_empty() {
            return ToolResult::success("No tasks found for current user");
        }
        ToolResult::success(sections.join("\n\n"))
    }
}
