//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{FileStore, OpenAiChatAdapter, OpenAiFormatAdapter, OpenAiPlanAdapter},
    config::Config,
    error::ApiError,
    web::{build_router, rest::ApiDoc, AppState, TabRegistry},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const TAB_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");
    warn!("Passwords are stored as unsalted SHA-256 digests; do not reuse real passwords.");

    // --- 2. Open the Persistent Storage Area ---
    info!("Opening storage in {}", config.data_dir.display());
    let users_db = Arc::new(FileStore::open(&config.data_dir).await?);

    // --- 3. Initialize AI Adapters ---
    let ai_config = OpenAIConfig::new()
        .with_api_base(&config.ai_api_base)
        .with_api_key(&config.gemini_api_key);
    let ai_client = Client::with_config(ai_config);

    let plan_adapter = Arc::new(OpenAiPlanAdapter::new(
        ai_client.clone(),
        config.plan_model.clone(),
    ));
    let chat_adapter = Arc::new(OpenAiChatAdapter::new(
        ai_client.clone(),
        config.chat_model.clone(),
    ));
    let format_adapter = Arc::new(OpenAiFormatAdapter::new(
        ai_client.clone(),
        config.format_model.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let tabs = Arc::new(TabRegistry::new());
    tabs.spawn_sweeper(TAB_SWEEP_INTERVAL);
    let app_state = Arc::new(AppState {
        users_db,
        plan_adapter,
        chat_adapter,
        format_adapter,
        tabs,
    });

    // --- 5. Create the Web Router ---
    let origin = config.allowed_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!(
            "Invalid ALLOWED_ORIGIN '{}': {}",
            config.allowed_origin, e
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let app = Router::new()
        .merge(build_router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
