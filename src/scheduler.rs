//! Daily reschedule job.
//!
//! Once a day (cron expression from config) every open task whose due date
//! slipped into the past is moved to today, keeping its original time of
//! day. Single fixed job, no run-history bookkeeping.

use chrono::Utc;
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::db::Database;

/// Spawn the reschedule loop. Returns an error only for an unparseable
/// cron expression; the loop itself logs and keeps going on job failures.
pub fn start_reschedule_job(db: Arc<Database>, cron_expr: &str) -> Result<(), String> {
    let schedule = Schedule::from_str(cron_expr)
        .map_err(|e| format!("Invalid reschedule cron expression '{}': {}", cron_expr, e))?;

    log::info!("Scheduling daily task reschedule with cron '{}'", cron_expr);

    tokio::spawn(async move {
        loop {
            let next = match schedule.upcoming(Utc).next() {
                Some(next) => next,
                None => {
                    log::warn!("Reschedule cron has no upcoming fire times, stopping job");
                    break;
                }
            };

            let wait = (next - Utc::now())
                .to_std()
                .unwrap_or(Duration::from_secs(0));
            log::debug!("Next task reschedule at {}", next);
            tokio::time::sleep(wait).await;

            run_reschedule(&db);
        }
    });

    Ok(())
}

fn run_reschedule(db: &Database) {
    let today_start = match Utc::now().date_naive().and_hms_opt(0, 0, 0) {
        Some(start) => start.and_utc(),
        None => return,
    };

    match db.reschedule_overdue_tasks(today_start) {
        Ok(0) => log::info!("Reschedule job ran, no overdue tasks"),
        Ok(count) => log::info!("Reschedule job moved {} overdue task(s) to today", count),
        Err(e) => log::error!("Reschedule job failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateTaskRequest, TaskPriority};
    use chrono::{Duration as ChronoDuration, Timelike};

    #[test]
    fn test_rejects_bad_cron_expression() {
        let db = Arc::new(Database::new(":memory:").unwrap());
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let _guard = runtime.enter();

        assert!(start_reschedule_job(db.clone(), "not a cron").is_err());
        assert!(start_reschedule_job(db, "0 0 0 * * *").is_ok());
    }

    #[test]
    fn test_run_reschedule_moves_overdue_tasks() {
        let db = Database::new(":memory:").unwrap();
        let user = db.get_or_create_user("alice").unwrap();

        let overdue = (Utc::now() - ChronoDuration::days(3))
            .date_naive()
            .and_hms_opt(14, 0, 0)
            .unwrap()
            .and_utc();
        db.create_task(
            user.id,
            &CreateTaskRequest {
                name: "Stale".to_string(),
                description: None,
                priority: TaskPriority::Medium,
                tags: vec![],
                due_at: Some(overdue),
            },
        )
        .unwrap();

        run_reschedule(&db);

        let tasks = db.list_tasks_for_user(user.id, None, None, 10, 0).unwrap();
        let due = tasks[0].due_at.unwrap();
        assert_eq!(due.date_naive(), Utc::now().date_naive());
        assert_eq!(due.hour(), 14);
    }
}
