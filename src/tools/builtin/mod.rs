//! Built-in task management tools
//!
//! Every tool here is scoped to the acting user carried by the
//! `ToolContext`; ownership of a task is checked before any mutation.

pub mod add_task;
pub mod complete_task;
pub mod group_tasks;
pub mod list_tasks;
pub mod remove_task;
pub mod search_tasks;
pub mod task_stats;
pub mod update_task;

pub use add_task::AddTaskTool;
pub use complete_task::CompleteTaskTool;
pub use group_tasks::{GroupTasksByPriorityTool, GroupTasksByStatusTool};
pub use list_tasks::ListTasksTool;
pub use remove_task::RemoveTaskTool;
pub use search_tasks::SearchTasksTool;
pub use task_stats::TaskStatisticsTool;
pub use update_task::UpdateTaskTool;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::models::Task;
use crate::tools::types::ToolContext;

/// Parse a due date supplied by the model. Accepts RFC 3339, a date with a
/// time (`YYYY-MM-DD HH:MM`), or a bare date (midnight UTC).
pub(crate) fn parse_due_date(input: &str) -> Result<DateTime<Utc>, String> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).unwrap().and_utc());
    }
    Err(format!(
        "Could not parse due date '{}'. Use YYYY-MM-DD, YYYY-MM-DD HH:MM, or RFC 3339.",
        input
    ))
}

/// Standard one-line rendering of a task for tool output
pub(crate) fn format_task_line(task: &Task) -> String {
    format!(
        "- [{}] {} (Priority: {}, ID: {})",
        task.status, task.name, task.priority, task.id
    )
}

/// Look up a task and verify it belongs to `user_id`. The Err side is the
/// message to hand back to the model; mutation never happens on Err.
pub(crate) fn lookup_owned_task(
    context: &ToolContext,
    user_id: Uuid,
    task_id: &str,
) -> Result<Task, String> {
    let id = match Uuid::parse_str(task_id.trim()) {
        Ok(id) => id,
        Err(_) => return Err(format!("'{}' is not a valid task ID", task_id)),
    };

    let task = match context.db.get_task(id) {
        Ok(Some(task)) => task,
        Ok(None) => return Err(format!("Task {} not found", id)),
        Err(e) => return Err(format!("Error looking up task {}: {}", id, e)),
    };

    if task.user_id != user_id {
        return Err(format!("Task {} does not belong to the current user", id));
    }

    Ok(task)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_due_date_formats() {
        assert!(parse_due_date("2026-03-01").is_ok());
        assert!(parse_due_date("2026-03-01 14:30").is_ok());
        assert!(parse_due_date("2026-03-01T14:30:00Z").is_ok());
        assert!(parse_due_date("next tuesday").is_err());
        assert!(parse_due_date("03/01/2026").is_err());
    }

    #[test]
    fn test_parse_due_date_bare_date_is_midnight() {
        let dt = parse_due_date("2026-03-01").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-03-01T00:00:00+00:00");
    }
}
