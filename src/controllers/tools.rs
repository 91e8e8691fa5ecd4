use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::tools::ToolDefinition;
use crate::AppState;

#[derive(Serialize)]
struct ToolListResponse {
    success: bool,
    count: usize,
    tools: Vec<ToolDefinition>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/tools").route(web::get().to(list_tools)));
}

/// The tool catalogue the agent binds into model requests
async fn list_tools(state: web::Data<AppState>) -> impl Responder {
    let tools = state.tool_registry.get_tool_definitions();
    HttpResponse::Ok().json(ToolListResponse {
        success: true,
        count: tools.len(),
        tools,
    })
}
