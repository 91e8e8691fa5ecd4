//! Task store operations (tasks)
//!
//! This is the narrow persistence interface the tool layer and the HTTP
//! controllers call through: create / get / list / update / delete /
//! search / overdue / statistics. Every query is scoped by owning user
//! except `get_task`, whose callers enforce ownership themselves.

use chrono::{DateTime, Timelike, Utc};
use rusqlite::{OptionalExtension, Result as SqliteResult};
use uuid::Uuid;

use super::super::Database;
use super::users::parse_utc;
use crate::models::{CreateTaskRequest, Task, TaskPriority, TaskStatistics, TaskStatus, UpdateTaskRequest};

const TASK_COLUMNS: &str =
    "id, user_id, name, description, priority, status, tags, due_at, created_at, completed_at";

impl Database {
    /// Create a new task for `user_id`
    pub fn create_task(&self, user_id: Uuid, request: &CreateTaskRequest) -> SqliteResult<Task> {
        let conn = self.conn();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let tags_json = serde_json::to_string(&request.tags).unwrap_or_else(|_| "[]".to_string());

        conn.execute(
            "INSERT INTO tasks (id, user_id, name, description, priority, status, tags, due_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                id.to_string(),
                user_id.to_string(),
                &request.name,
                request.description.as_deref(),
                request.priority.as_str(),
                TaskStatus::Pending.as_str(),
                tags_json,
                request.due_at.map(|d| d.to_rfc3339()),
                now.to_rfc3339(),
            ],
        )?;

        log::info!("Task created: {} for user {}", request.name, user_id);

        Ok(Task {
            id,
            user_id,
            name: request.name.clone(),
            description: request.description.clone(),
            priority: request.priority,
            status: TaskStatus::Pending,
            tags: request.tags.clone(),
            due_at: request.due_at,
            created_at: now,
            completed_at: None,
        })
    }

    /// Get a task by ID regardless of owner
    pub fn get_task(&self, id: Uuid) -> SqliteResult<Option<Task>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
            [id.to_string()],
            Self::row_to_task,
        )
        .optional()
    }

    /// List a user's tasks, newest first, with optional status/priority filters
    pub fn list_tasks_for_user(
        &self,
        user_id: Uuid,
        status: Option<TaskStatus>,
        priority: Option<TaskPriority>,
        limit: i64,
        offset: i64,
    ) -> SqliteResult<Vec<Task>> {
        let conn = self.conn();
        let mut sql = format!("SELECT {} FROM tasks WHERE user_id = ?1", TASK_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id.to_string())];

        if let Some(status) = status {
            params.push(Box::new(status.as_str()));
            sql.push_str(&format!(" AND status = ?{}", params.len()));
        }
        if let Some(priority) = priority {
            params.push(Box::new(priority.as_str()));
            sql.push_str(&format!(" AND priority = ?{}", params.len()));
        }

        params.push(Box::new(limit));
        sql.push_str(&format!(" ORDER BY created_at DESC LIMIT ?{}", params.len()));
        params.push(Box::new(offset));
        sql.push_str(&format!(" OFFSET ?{}", params.len()));

        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params_ref.as_slice(), Self::row_to_task)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(tasks)
    }

    /// Apply a partial update. Returns the updated task, or `None` when the
    /// task does not exist. Moving a task to completed stamps `completed_at`
    /// the first time.
    pub fn update_task(&self, id: Uuid, request: &UpdateTaskRequest) -> SqliteResult<Option<Task>> {
        let existing = match self.get_task(id)? {
            Some(task) => task,
            None => return Ok(None),
        };

        let mut task = existing;
        if let Some(ref name) = request.name {
            task.name = name.clone();
        }
        if let Some(ref description) = request.description {
            task.description = Some(description.clone());
        }
        if let Some(priority) = request.priority {
            task.priority = priority;
        }
        if let Some(status) = request.status {
            task.status = status;
            if status == TaskStatus::Completed && task.completed_at.is_none() {
                task.completed_at = Some(Utc::now());
            }
        }
        if let Some(ref tags) = request.tags {
            task.tags = tags.clone();
        }
        if let Some(due_at) = request.due_at {
            task.due_at = Some(due_at);
        }

        let conn = self.conn();
        let tags_json = serde_json::to_string(&task.tags).unwrap_or_else(|_| "[]".to_string());
        conn.execute(
            "UPDATE tasks SET name = ?1, description = ?2, priority = ?3, status = ?4,
                    tags = ?5, due_at = ?6, completed_at = ?7
             WHERE id = ?8",
            rusqlite::params![
                &task.name,
                task.description.as_deref(),
                task.priority.as_str(),
                task.status.as_str(),
                tags_json,
                task.due_at.map(|d| d.to_rfc3339()),
                task.completed_at.map(|d| d.to_rfc3339()),
                id.to_string(),
            ],
        )?;

        log::info!("Task updated: {}", task.name);
        Ok(Some(task))
    }

    /// Delete a task. Returns true if a row was removed.
    pub fn delete_task(&self, id: Uuid) -> SqliteResult<bool> {
        let conn = self.conn();
        let rows = conn.execute("DELETE FROM tasks WHERE id = ?1", [id.to_string()])?;
        Ok(rows > 0)
    }

    /// Case-insensitive substring search over name and description,
    /// scoped to one user
    pub fn search_tasks(&self, user_id: Uuid, term: &str, limit: i64) -> SqliteResult<Vec<Task>> {
        let conn = self.conn();
        let pattern = format!("%{}%", term.to_lowercase());
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tasks
             WHERE user_id = ?1
               AND (LOWER(name) LIKE ?2 OR LOWER(COALESCE(description, '')) LIKE ?2)
             ORDER BY created_at DESC LIMIT ?3",
            TASK_COLUMNS
        ))?;

        let tasks = stmt
            .query_map(
                rusqlite::params![user_id.to_string(), pattern, limit],
                Self::row_to_task,
            )?
            .filter_map(|r| r.ok())
            .collect();

        Ok(tasks)
    }

    /// Open tasks whose due date has passed, earliest first
    pub fn list_overdue_tasks(&self, user_id: Uuid) -> SqliteResult<Vec<Task>> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tasks
             WHERE user_id = ?1 AND due_at IS NOT NULL AND due_at < ?2
               AND status IN ('pending', 'in_progress')
             ORDER BY due_at ASC",
            TASK_COLUMNS
        ))?;

        let tasks = stmt
            .query_map(rusqlite::params![user_id.to_string(), now], Self::row_to_task)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(tasks)
    }

    /// Per-status counts for one user
    pub fn task_statistics(&self, user_id: Uuid) -> SqliteResult<TaskStatistics> {
        let conn = self.conn();
        conn.query_row(
            "SELECT COUNT(*),
                    SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN status = 'in_progress' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN status = 'cancelled' THEN 1 ELSE 0 END)
             FROM tasks WHERE user_id = ?1",
            [user_id.to_string()],
            |row| {
                Ok(TaskStatistics {
                    total: row.get(0)?,
                    pending: row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                    in_progress: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                    completed: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
                    cancelled: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
                })
            },
        )
    }

    /// Move every open task due before `today_start` to today, preserving
    /// the original time of day. Used by the daily reschedule job. Returns
    /// the number of tasks touched.
    pub fn reschedule_overdue_tasks(&self, today_start: DateTime<Utc>) -> SqliteResult<usize> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tasks
             WHERE due_at IS NOT NULL AND due_at < ?1
               AND status IN ('pending', 'in_progress')",
            TASK_COLUMNS
        ))?;

        let stale: Vec<Task> = stmt
            .query_map([today_start.to_rfc3339()], Self::row_to_task)?
            .filter_map(|r| r.ok())
            .collect();
        drop(stmt);

        let mut rescheduled = 0;
        for task in &stale {
            let old_due = match task.due_at {
                Some(d) => d,
                None => continue,
            };
            let new_due = today_start
                .with_hour(old_due.hour())
                .and_then(|d| d.with_minute(old_due.minute()))
                .and_then(|d| d.with_second(old_due.second()))
                .unwrap_or(today_start);

            conn.execute(
                "UPDATE tasks SET due_at = ?1 WHERE id = ?2",
                rusqlite::params![new_due.to_rfc3339(), task.id.to_string()],
            )?;
            rescheduled += 1;
            log::debug!("Rescheduled task {}: {}", task.id, task.name);
        }

        Ok(rescheduled)
    }

    fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
        let id_str: String = row.get(0)?;
        let user_id_str: String = row.get(1)?;
        let priority_str: String = row.get(4)?;
        let status_str: String = row.get(5)?;
        let tags_json: String = row.get(6)?;
        let due_at_str: Option<String> = row.get(7)?;
        let created_at_str: String = row.get(8)?;
        let completed_at_str: Option<String> = row.get(9)?;

        Ok(Task {
            id: parse_uuid(&id_str, 0)?,
            user_id: parse_uuid(&user_id_str, 1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            priority: TaskPriority::from_str(&priority_str).unwrap_or_default(),
            status: TaskStatus::from_str(&status_str).unwrap_or_default(),
            tags: serde_json::from_str(&tags_json).unwrap_or_default(),
            due_at: match due_at_str {
                Some(s) => Some(parse_utc(&s, 7)?),
                None => None,
            },
            created_at: parse_utc(&created_at_str, 8)?,
            completed_at: match completed_at_str {
                Some(s) => Some(parse_utc(&s, 9)?),
                None => None,
            },
        })
    }
}

fn parse_uuid(s: &str, col: usize) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_db() -> (Database, Uuid) {
        let db = Database::new(":memory:").unwrap();
        let user = db.get_or_create_user("test-user").unwrap();
        (db, user.id)
    }

    fn create_request(name: &str) -> CreateTaskRequest {
        CreateTaskRequest {
            name: name.to_string(),
            description: None,
            priority: TaskPriority::Medium,
            tags: vec![],
            due_at: None,
        }
    }

    #[test]
    fn test_create_and_get_task() {
        let (db, uid) = test_db();
        let created = db
            .create_task(
                uid,
                &CreateTaskRequest {
                    name: "Write report".to_string(),
                    description: Some("quarterly".to_string()),
                    priority: TaskPriority::High,
                    tags: vec!["work".to_string()],
                    due_at: None,
                },
            )
            .unwrap();

        let fetched = db.get_task(created.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Write report");
        assert_eq!(fetched.priority, TaskPriority::High);
        assert_eq!(fetched.status, TaskStatus::Pending);
        assert_eq!(fetched.tags, vec!["work".to_string()]);
        assert_eq!(fetched.user_id, uid);
    }

    #[test]
    fn test_list_filters_by_user_and_status() {
        let (db, alice) = test_db();
        let bob = db.get_or_create_user("other-user").unwrap().id;

        db.create_task(alice, &create_request("Task A")).unwrap();
        let b = db.create_task(alice, &create_request("Task B")).unwrap();
        db.create_task(bob, &create_request("Bob task")).unwrap();

        db.update_task(
            b.id,
            &UpdateTaskRequest {
                status: Some(TaskStatus::InProgress),
                ..Default::default()
            },
        )
        .unwrap();

        let all = db.list_tasks_for_user(alice, None, None, 100, 0).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|t| t.user_id == alice));

        let in_progress = db
            .list_tasks_for_user(alice, Some(TaskStatus::InProgress), None, 100, 0)
            .unwrap();
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].name, "Task B");
    }

    #[test]
    fn test_update_stamps_completed_at() {
        let (db, uid) = test_db();
        let task = db.create_task(uid, &create_request("Finish")).unwrap();
        assert!(task.completed_at.is_none());

        let updated = db
            .update_task(
                task.id,
                &UpdateTaskRequest {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, TaskStatus::Completed);
        assert!(updated.completed_at.is_some());
    }

    #[test]
    fn test_update_missing_task_returns_none() {
        let (db, _) = test_db();
        let result = db
            .update_task(Uuid::new_v4(), &UpdateTaskRequest::default())
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_delete_task() {
        let (db, uid) = test_db();
        let task = db.create_task(uid, &create_request("Gone")).unwrap();

        assert!(db.delete_task(task.id).unwrap());
        assert!(db.get_task(task.id).unwrap().is_none());
        assert!(!db.delete_task(task.id).unwrap());
    }

    #[test]
    fn test_search_is_case_insensitive_and_scoped() {
        let (db, alice) = test_db();
        let bob = db.get_or_create_user("other-user").unwrap().id;

        db.create_task(
            alice,
            &CreateTaskRequest {
                name: "Buy groceries".to_string(),
                description: Some("milk and EGGS".to_string()),
                priority: TaskPriority::Low,
                tags: vec![],
                due_at: None,
            },
        )
        .unwrap();
        db.create_task(bob, &create_request("Groceries run")).unwrap();

        let by_name = db.search_tasks(alice, "GROCER", 50).unwrap();
        assert_eq!(by_name.len(), 1);

        let by_description = db.search_tasks(alice, "eggs", 50).unwrap();
        assert_eq!(by_description.len(), 1);

        assert!(db.search_tasks(alice, "nothing", 50).unwrap().is_empty());
    }

    #[test]
    fn test_statistics_counts() {
        let (db, uid) = test_db();
        let stats = db.task_statistics(uid).unwrap();
        assert_eq!(stats.total, 0);

        let a = db.create_task(uid, &create_request("A")).unwrap();
        db.create_task(uid, &create_request("B")).unwrap();
        db.update_task(
            a.id,
            &UpdateTaskRequest {
                status: Some(TaskStatus::Completed),
                ..Default::default()
            },
        )
        .unwrap();

        let stats = db.task_statistics(uid).unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.completion_percentage(), Some(50.0));
    }

    #[test]
    fn test_reschedule_overdue_preserves_time_of_day() {
        let (db, uid) = test_db();
        let yesterday_9am = (Utc::now() - Duration::days(2))
            .date_naive()
            .and_hms_opt(9, 30, 0)
            .unwrap()
            .and_utc();

        db.create_task(
            uid,
            &CreateTaskRequest {
                name: "Late".to_string(),
                description: None,
                priority: TaskPriority::Medium,
                tags: vec![],
                due_at: Some(yesterday_9am),
            },
        )
        .unwrap();

        let today_start = Utc::now().date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc();
        let count = db.reschedule_overdue_tasks(today_start).unwrap();
        assert_eq!(count, 1);

        let tasks = db.list_tasks_for_user(uid, None, None, 10, 0).unwrap();
        let due = tasks[0].due_at.unwrap();
        assert_eq!(due.date_naive(), today_start.date_naive());
        assert_eq!(due.hour(), 9);
        assert_eq!(due.minute(), 30);

        // Completed tasks are never touched
        let done = db.create_task(
            uid,
            &CreateTaskRequest {
                name: "Done".to_string(),
                description: None,
                priority: TaskPriority::Medium,
                tags: vec![],
                due_at: Some(yesterday_9am),
            },
        )
        .unwrap();
        db.update_task(
            done.id,
            &UpdateTaskRequest {
                status: Some(TaskStatus::Completed),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(db.reschedule_overdue_tasks(today_start).unwrap(), 0);
    }
}
