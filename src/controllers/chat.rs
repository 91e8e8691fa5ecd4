use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::controllers::{resolve_user, ErrorResponse};
use crate::models::{ChatMessage, ChatRole};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    success: bool,
    response: String,
    session_id: i64,
}

#[derive(Serialize)]
struct HistoryResponse {
    success: bool,
    session_id: i64,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ResetResponse {
    success: bool,
    reset: bool,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/chat").route(web::post().to(chat)))
        .service(web::resource("/api/chat/history").route(web::get().to(history)))
        .service(web::resource("/api/chat/reset").route(web::post().to(reset)));
}

/// Drive the agent for one user message and persist the exchange to the
/// caller's chat session. The agent itself never raises for ordinary
/// model/tool failures, so this handler only deals with store errors.
async fn chat(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ChatRequest>,
) -> impl Responder {
    let user = match resolve_user(&state, &req) {
        Ok(user) => user,
        Err(response) => return response,
    };

    let message = body.message.trim();
    if message.is_empty() {
        return HttpResponse::BadRequest().json(ErrorResponse::new("Message cannot be empty"));
    }

    let session = match state.db.get_or_create_chat_session(user.id) {
        Ok(session) => session,
        Err(e) => {
            log::error!("Failed to get chat session: {}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::new("Internal server error"));
        }
    };

    if let Err(e) = state.db.add_chat_message(session.id, ChatRole::User, message) {
        log::error!("Failed to store user message: {}", e);
    }

    let response = state.agent.ainvoke(message, &user.external_id).await;

    if let Err(e) = state
        .db
        .add_chat_message(session.id, ChatRole::Assistant, &response)
    {
        log::error!("Failed to store agent response: {}", e);
    }

    HttpResponse::Ok().json(ChatResponse {
        success: true,
        response,
        session_id: session.id,
    })
}

async fn history(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let user = match resolve_user(&state, &req) {
        Ok(user) => user,
        Err(response) => return response,
    };

    let session = match state.db.get_or_create_chat_session(user.id) {
        Ok(session) => session,
        Err(e) => {
            log::error!("Failed to get chat session: {}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::new("Internal server error"));
        }
    };

    match state.db.get_recent_chat_messages(session.id, 100) {
        Ok(messages) => HttpResponse::Ok().json(HistoryResponse {
            success: true,
            session_id: session.id,
            messages,
        }),
        Err(e) => {
            log::error!("Failed to load chat history: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Internal server error"))
        }
    }
}

async fn reset(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let user = match resolve_user(&state, &req) {
        Ok(user) => user,
        Err(response) => return response,
    };

    match state.db.reset_chat_session(user.id) {
        Ok(reset) => HttpResponse::Ok().json(ResetResponse {
            success: true,
            reset,
        }),
        Err(e) => {
            log::error!("Failed to reset chat session: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Internal server error"))
        }
    }
}
