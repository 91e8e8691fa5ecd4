use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

use behflow_backend::agent::TaskAgent;
use behflow_backend::ai::AiClient;
use behflow_backend::config::Config;
use behflow_backend::db::Database;
use behflow_backend::{controllers, scheduler, tools, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url).expect("Failed to initialize database");
    let db = Arc::new(db);

    log::info!("Initializing tool registry");
    let tool_registry = Arc::new(tools::create_default_registry());
    log::info!("Registered {} tools", tool_registry.len());

    log::info!(
        "Initializing AI client: provider={} model={}",
        config.model.provider,
        config.model.model
    );
    let ai_client =
        Arc::new(AiClient::from_settings(&config.model).expect("Failed to create AI client"));

    let agent = TaskAgent::new(db.clone(), ai_client, tool_registry.clone())
        .with_max_round_trips(config.max_tool_iterations);

    scheduler::start_reschedule_job(db.clone(), &config.reschedule_cron)
        .expect("Failed to start reschedule job");

    log::info!("Starting Behflow server on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                config: config.clone(),
                agent: agent.clone(),
                tool_registry: Arc::clone(&tool_registry),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::users::config)
            .configure(controllers::tasks::config)
            .configure(controllers::chat::config)
            .configure(controllers::tools::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
