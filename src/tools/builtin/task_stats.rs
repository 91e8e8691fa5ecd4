//! Task statistics tool - per-status counts and completion percentage

use crate::tools::registry::Tool;
use crate::tools::types::{ToolContext, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

pub struct TaskStatisticsTool {
    definition: ToolDefinition,
}

impl TaskStatisticsTool {
    pub fn new() -> Self {
        TaskStatisticsTool {
            definition: ToolDefinition {
                name: "task_statistics".to_string(),
                description:
                    "Show task counts per status and the completion percentage for the current user."
                        .to_string(),
                input_schema: ToolInputSchema::object(HashMap::new(), &[]),
            },
        }
    }
}

impl Default for TaskStatisticsTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for TaskStatisticsTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, _params: Value, context: &ToolContext) -> ToolResult {
        let user_id = match context.require_user() {
            Ok(id) => id,
            Err(_) => return ToolResult::missing_user(),
        };

        let stats = match context.db.task_statistics(user_id) {
            Ok(stats) => stats,
            Err(e) => return ToolResult::error(format!("Error retrieving statistics: {}", e)),
        };

        let mut lines = vec![
            "Task statistics:".to_string(),
            format!("- Total: {}", stats.total),
            format!("- Pending: {}", stats.pending),
            format!("- In progress: {}", stats.in_progress),
            format!("- Completed: {}", stats.completed),
            format!("- Cancelled: {}", stats.cancelled),
        ];
        if let Some(pct) = stats.completion_percentage() {
            lines.push(format!("- Completion: {}%", pct));
        }

        ToolResult::success(lines.join("\n"))
    }
}
