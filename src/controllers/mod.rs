pub mod chat;
pub mod health;
pub mod tasks;
pub mod tools;
pub mod users;

use actix_web::{HttpRequest, HttpResponse};
use serde::Serialize;

use crate::models::User;
use crate::AppState;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        ErrorResponse {
            success: false,
            error: error.into(),
        }
    }
}

/// Resolve the caller from the `X-User-Id` header, creating the user record
/// on first sight. Authentication is out of scope; the header is trusted.
pub fn resolve_user(state: &AppState, req: &HttpRequest) -> Result<User, HttpResponse> {
    let external_id = req
        .headers()
        .get("X-User-Id")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let external_id = match external_id {
        Some(id) => id,
        None => {
            return Err(HttpResponse::BadRequest()
                .json(ErrorResponse::new("Missing X-User-Id header")))
        }
    };

    state.db.get_or_create_user(external_id).map_err(|e| {
        log::error!("Failed to resolve user '{}': {}", external_id, e);
        HttpResponse::InternalServerError().json(ErrorResponse::new("Internal server error"))
    })
}
