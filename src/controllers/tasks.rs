use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::controllers::{resolve_user, ErrorResponse};
use crate::models::{CreateTaskRequest, Task, TaskPriority, TaskStatus, UpdateTaskRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TaskStatus,
}

#[derive(Serialize)]
struct TaskListResponse {
    success: bool,
    tasks: Vec<Task>,
    count: usize,
}

#[derive(Serialize)]
struct StatisticsResponse {
    success: bool,
    total: i64,
    pending: i64,
    in_progress: i64,
    completed: i64,
    cancelled: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    completion_percentage: Option<f64>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/tasks")
            .route(web::post().to(create_task))
            .route(web::get().to(list_tasks)),
    )
    .service(web::resource("/api/tasks/statistics").route(web::get().to(statistics)))
    .service(
        web::resource("/api/tasks/{id}")
            .route(web::get().to(get_task))
            .route(web::put().to(update_task))
            .route(web::delete().to(delete_task)),
    )
    .service(web::resource("/api/tasks/{id}/status").route(web::post().to(update_status)));
}

/// Fetch a task and enforce ownership. Another user's task is reported as
/// not found rather than forbidden, so task ids don't leak across users.
fn owned_task(state: &AppState, user_id: Uuid, task_id: Uuid) -> Result<Task, HttpResponse> {
    match state.db.get_task(task_id) {
        Ok(Some(task)) if task.user_id == user_id => Ok(task),
        Ok(_) => Err(HttpResponse::NotFound().json(ErrorResponse::new("Task not found"))),
        Err(e) => {
            log::error!("Failed to load task {}: {}", task_id, e);
            Err(HttpResponse::InternalServerError().json(ErrorResponse::new("Internal server error")))
        }
    }
}

async fn create_task(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateTaskRequest>,
) -> impl Responder {
    let user = match resolve_user(&state, &req) {
        Ok(user) => user,
        Err(response) => return response,
    };

    if body.name.trim().is_empty() {
        return HttpResponse::BadRequest().json(ErrorResponse::new("Task name cannot be empty"));
    }

    match state.db.create_task(user.id, &body.into_inner()) {
        Ok(task) => HttpResponse::Created().json(task),
        Err(e) => {
            log::error!("Failed to create task: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Internal server error"))
        }
    }
}

async fn list_tasks(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListTasksQuery>,
) -> impl Responder {
    let user = match resolve_user(&state, &req) {
        Ok(user) => user,
        Err(response) => return response,
    };

    let status = match query.status.as_deref() {
        Some(raw) => match TaskStatus::from_str(raw) {
            Some(s) => Some(s),
            None => {
                return HttpResponse::BadRequest()
                    .json(ErrorResponse::new(format!("Invalid status '{}'", raw)))
            }
        },
        None => None,
    };
    let priority = match query.priority.as_deref() {
        Some(raw) => match TaskPriority::from_str(raw) {
            Some(p) => Some(p),
            None => {
                return HttpResponse::BadRequest()
                    .json(ErrorResponse::new(format!("Invalid priority '{}'", raw)))
            }
        },
        None => None,
    };

    let limit = query.limit.unwrap_or(100).clamp(1, 500);
    let offset = query.offset.unwrap_or(0).max(0);

    match state
        .db
        .list_tasks_for_user(user.id, status, priority, limit, offset)
    {
        Ok(tasks) => HttpResponse::Ok().json(TaskListResponse {
            success: true,
            count: tasks.len(),
            tasks,
        }),
        Err(e) => {
            log::error!("Failed to list tasks: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Internal server error"))
        }
    }
}

async fn get_task(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> impl Responder {
    let user = match resolve_user(&state, &req) {
        Ok(user) => user,
        Err(response) => return response,
    };

    match owned_task(&state, user.id, path.into_inner()) {
        Ok(task) => HttpResponse::Ok().json(task),
        Err(response) => response,
    }
}

async fn update_task(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<UpdateTaskRequest>,
) -> impl Responder {
    let user = match resolve_user(&state, &req) {
        Ok(user) => user,
        Err(response) => return response,
    };

    let task = match owned_task(&state, user.id, path.into_inner()) {
        Ok(task) => task,
        Err(response) => return response,
    };

    match state.db.update_task(task.id, &body.into_inner()) {
        Ok(Some(updated)) => HttpResponse::Ok().json(updated),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse::new("Task not found")),
        Err(e) => {
            log::error!("Failed to update task {}: {}", task.id, e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Internal server error"))
        }
    }
}

async fn update_status(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> impl Responder {
    let user = match resolve_user(&state, &req) {
        Ok(user) => user,
        Err(response) => return response,
    };

    let task = match owned_task(&state, user.id, path.into_inner()) {
        Ok(task) => task,
        Err(response) => return response,
    };

    let request = UpdateTaskRequest {
        status: Some(body.status),
        ..Default::default()
    };

    match state.db.update_task(task.id, &request) {
        Ok(Some(updated)) => HttpResponse::Ok().json(updated),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse::new("Task not found")),
        Err(e) => {
            log::error!("Failed to update task status {}: {}", task.id, e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Internal server error"))
        }
    }
}

async fn delete_task(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> impl Responder {
    let user = match resolve_user(&state, &req) {
        Ok(user) => user,
        Err(response) => return response,
    };

    let task = match owned_task(&state, user.id, path.into_inner()) {
        Ok(task) => task,
        Err(response) => return response,
    };

    match state.db.delete_task(task.id) {
        Ok(true) => HttpResponse::NoContent().finish(),
        Ok(false) => HttpResponse::NotFound().json(ErrorResponse::new("Task not found")),
        Err(e) => {
            log::error!("Failed to delete task {}: {}", task.id, e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Internal server error"))
        }
    }
}

async fn statistics(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let user = match resolve_user(&state, &req) {
        Ok(user) => user,
        Err(response) => return response,
    };

    match state.db.task_statistics(user.id) {
        Ok(stats) => HttpResponse::Ok().json(StatisticsResponse {
            success: true,
            completion_percentage: stats.completion_percentage(),
            total: stats.total,
            pending: stats.pending,
            in_progress: stats.in_progress,
            completed: stats.completed,
            cancelled: stats.cancelled,
        }),
        Err(e) => {
            log::error!("Failed to load statistics: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Internal server error"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::test_support::test_state;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::json;

    #[actix_web::test]
    async fn test_create_and_list_are_scoped_by_user() {
        let state = test_state(vec![]);
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::post()
            .uri("/api/tasks")
            .insert_header(("X-User-Id", "alice"))
            .set_json(json!({"name": "Write report", "priority": "high"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri("/api/tasks")
            .insert_header(("X-User-Id", "alice"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["tasks"][0]["name"], "Write report");
        assert_eq!(body["tasks"][0]["priority"], "high");

        let req = test::TestRequest::get()
            .uri("/api/tasks")
            .insert_header(("X-User-Id", "bob"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["count"], 0);
    }

    #[actix_web::test]
    async fn test_missing_user_header_is_rejected() {
        let state = test_state(vec![]);
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::get().uri("/api/tasks").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_other_users_task_reads_as_not_found() {
        let state = test_state(vec![]);
        let alice = state.db.get_or_create_user("alice").unwrap();
        let task = state
            .db
            .create_task(
                alice.id,
                &CreateTaskRequest {
                    name: "Private".to_string(),
                    description: None,
                    priority: TaskPriority::Medium,
                    tags: vec![],
                    due_at: None,
                },
            )
            .unwrap();

        let app =
            test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/tasks/{}", task.id))
            .insert_header(("X-User-Id", "bob"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        // And the task is untouched for its owner
        let req = test::TestRequest::get()
            .uri(&format!("/api/tasks/{}", task.id))
            .insert_header(("X-User-Id", "alice"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_status_endpoint_completes_task() {
        let state = test_state(vec![]);
        let alice = state.db.get_or_create_user("alice").unwrap();
        let task = state
            .db
            .create_task(
                alice.id,
                &CreateTaskRequest {
                    name: "Finish".to_string(),
                    description: None,
                    priority: TaskPriority::Medium,
                    tags: vec![],
                    due_at: None,
                },
            )
            .unwrap();

        let app =
            test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::post()
            .uri(&format!("/api/tasks/{}/status", task.id))
            .insert_header(("X-User-Id", "alice"))
            .set_json(json!({"status": "completed"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "completed");
        assert!(!body["completed_at"].is_null());
    }

    #[actix_web::test]
    async fn test_statistics_endpoint_omits_percentage_when_empty() {
        let state = test_state(vec![]);
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::get()
            .uri("/api/tasks/statistics")
            .insert_header(("X-User-Id", "alice"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 0);
        assert!(body.get("completion_percentage").is_none());
    }
}
