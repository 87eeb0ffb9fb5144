use crate::core::{AppConfig, AppState};
use axum::{
    routing::{get, post, put},
    Router,
};
use db::PgStore;
use dotenvy::dotenv;
use engine::{RunLocks, SystemClock};
use llm::{LlmClient, LlmConfig};
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

// Declare the modules we created.
mod api;
mod core;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from a .env file.
    dotenv().ok();
    // Use a JSON logger for production-ready structured logging
    tracing_subscriber::fmt().json().init();

    // --- Configuration ---
    let config = AppConfig::from_env()?;

    // --- Database Pool ---
    let db_pool = match PgPool::connect(&config.database_url).await {
        Ok(pool) => {
            info!("Database pool created successfully.");
            pool
        }
        Err(e) => {
            error!("Failed to create database pool: {}", e);
            return Err(e.into());
        }
    };

    // --- Shared Application State (for Axum) ---
    let app_state = AppState {
        store: PgStore::new(db_pool),
        llm: Arc::new(LlmClient::new(LlmConfig {
            api_key: config.llm_api_key.clone(),
            base_url: config.llm_base_url.clone(),
            model: config.llm_model.clone(),
        })),
        locks: Arc::new(RunLocks::new()),
        clock: SystemClock,
    };

    // --- Axum Router ---
    let app = Router::new()
        .route(
            "/api/labels",
            get(api::label::list_labels_handler).post(api::label::create_label_handler),
        )
        .route(
            "/api/labels/:label_id",
            put(api::label::update_label_handler).delete(api::label::delete_label_handler),
        )
        .route("/api/emails", get(api::email::list_emails_handler))
        .route("/api/emails/:email_id", get(api::email::get_email_handler))
        .route(
            "/api/emails/:email_id/read",
            post(api::email::mark_read_handler),
        )
        .route(
            "/api/emails/:email_id/labels/:label_id",
            post(api::email::assign_label_handler).delete(api::email::remove_label_handler),
        )
        .route(
            "/api/emails/:email_id/classify",
            post(api::email::classify_email_handler),
        )
        .route(
            "/api/workflows",
            get(api::workflow::list_workflows_handler).post(api::workflow::create_workflow_handler),
        )
        .route(
            "/api/workflows/:workflow_id",
            get(api::workflow::get_workflow_handler)
                .patch(api::workflow::update_workflow_handler)
                .delete(api::workflow::delete_workflow_handler),
        )
        .route(
            "/api/workflows/:workflow_id/execute",
            post(api::workflow::execute_workflow_handler),
        )
        .route(
            "/api/workflows/:workflow_id/executions",
            get(api::workflow::list_executions_handler),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // --- Start HTTP Server ---
    // Bind to 0.0.0.0 to be reachable in a container
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("HTTP Server listening on {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }

    Ok(())
}
