pub mod agent;
pub mod ai;
pub mod config;
pub mod controllers;
pub mod db;
pub mod http;
pub mod models;
pub mod scheduler;
pub mod tools;

use std::sync::Arc;

use agent::TaskAgent;
use config::Config;
use db::Database;
use tools::ToolRegistry;

/// Shared application state handed to every HTTP handler
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    pub agent: TaskAgent,
    pub tool_registry: Arc<ToolRegistry>,
}
