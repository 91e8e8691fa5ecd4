use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;

use crate::controllers::{resolve_user, ErrorResponse};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: String,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/users/me")
            .route(web::get().to(me))
            .route(web::put().to(update_profile)),
    );
}

async fn me(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    match resolve_user(&state, &req) {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(response) => response,
    }
}

async fn update_profile(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<UpdateProfileRequest>,
) -> impl Responder {
    let user = match resolve_user(&state, &req) {
        Ok(user) => user,
        Err(response) => return response,
    };

    if body.display_name.trim().is_empty() {
        return HttpResponse::BadRequest().json(ErrorResponse::new("Display name cannot be empty"));
    }

    match state.db.set_user_display_name(user.id, body.display_name.trim()) {
        Ok(true) => match state.db.get_user(user.id) {
            Ok(Some(updated)) => HttpResponse::Ok().json(updated),
            _ => HttpResponse::InternalServerError()
                .json(ErrorResponse::new("Internal server error")),
        },
        Ok(false) => HttpResponse::NotFound().json(ErrorResponse::new("User not found")),
        Err(e) => {
            log::error!("Failed to update profile: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Internal server error"))
        }
    }
}
