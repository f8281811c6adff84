use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod ai;
mod chat;
mod config;
mod db;
mod http;

use ai::llm::LlmClient;
use chat::ChatService;
use config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting chat relay...");

    // Missing credentials stop us here, before any traffic is served
    let config = AppConfig::from_env()?;
    tracing::info!("Config loaded. Model: {}", config.groq_model);

    // Initialize database (degrades to disabled on failure)
    let store = db::initialize(config.database_url.as_deref()).await;

    let llm_client = LlmClient::new(&config);

    // Build shared application state
    let state = Arc::new(http::AppState {
        chat: ChatService::new(store, llm_client),
    });

    let app = http::build_router(state, &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
