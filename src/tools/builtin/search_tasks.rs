//! Search tasks tool - substring match over the acting user's tasks

use crate::tools::builtin::format_task_line;
use crate::tools::registry::Tool;
use crate::tools::types::{PropertySchema, ToolContext, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

const DEFAULT_SEARCH_LIMIT: i64 = 50;

pub struct SearchTasksTool {
    definition: ToolDefinition,
}

impl SearchTasksTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "query".to_string(),
            PropertySchema::string("Text to search for in task names and descriptions."),
        );

        SearchTasksTool {
            definition: ToolDefinition {
                name: "search_tasks".to_string(),
                description:
                    "Search the current user's tasks by name or description (case-insensitive)."
                        .to_string(),
                input_schema: ToolInputSchema::object(properties, &["query"]),
            },
        }
    }
}

impl Default for SearchTasksTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct SearchTasksParams {
    query: String,
}

#[async_trait]
impl Tool for SearchTasksTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let user_id = match context.require_user() {
            Ok(id) => id,
            Err(_) => return ToolResult::missing_user(),
        };

        let params: SearchTasksParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        if params.query.trim().is_empty() {
            return ToolResult::error("Search query cannot be empty.");
        }

        let tasks = match context
            .db
            .search_tasks(user_id, params.query.trim(), DEFAULT_SEARCH_LIMIT)
        {
            Ok(tasks) => tasks,
            Err(e) => return ToolResult::error(format!("Error searching tasks: {}", e)),
        };

        if tasks.is_empty() {
            return ToolResult::success(format!("No tasks matching '{}'", params.query.trim()));
        }

        let lines: Vec<String> = tasks.iter().map(format_task_line).collect();
        ToolResult::success(format!(
            "Found {} task(s) matching '{}':\n{}",
            tasks.len(),
            params.query.trim(),
            lines.join("\n")
        ))
    }
}
