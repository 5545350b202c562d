//! HTTP server for the chat widget relay
//!
//! Endpoints:
//! - POST /api/chat - classify a prompt and answer it
//! - GET /api/status - health check
//! - GET /api/debug/catalog - env presence flags + latest-video probe
//! - GET /api/videos/latest - recent uploads from the public feed
//!
//! Everything else falls through to the static widget assets.

pub mod chat;
mod handlers;
pub mod types;

use anyhow::Result;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::catalog::{CatalogSource, YouTubeCatalog};
use crate::config::RelayConfig;
use crate::context::ContextStore;
use crate::llm::{GeminiClient, TextGenerator};

pub use types::API_VERSION;

// ============================================================================
// Server State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub contexts: Arc<ContextStore>,
    pub catalog: Arc<dyn CatalogSource>,
    pub generator: Arc<dyn TextGenerator>,
}

// ============================================================================
// Routes
// ============================================================================

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    // The widget may be embedded anywhere, so CORS stays wide open.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let version_header = SetResponseHeaderLayer::if_not_present(
        header::HeaderName::from_static("x-api-version"),
        HeaderValue::from_static(API_VERSION),
    );

    let assets = ServeDir::new(&state.config.assets_dir);

    Router::new()
        .route("/api/status", get(handlers::status_handler))
        .route("/api/chat", post(handlers::chat_handler))
        .route("/api/debug/catalog", get(handlers::debug_catalog_handler))
        .route("/api/videos/latest", get(handlers::latest_videos_handler))
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .layer(version_header)
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP server with the real catalog and generative gateways.
pub async fn run(config: RelayConfig) -> Result<()> {
    let client = reqwest::Client::new();

    let state = AppState {
        contexts: Arc::new(ContextStore::new()),
        catalog: Arc::new(YouTubeCatalog::new(
            client.clone(),
            config.catalog_api_key.clone(),
            config.channel_id.clone(),
        )),
        generator: Arc::new(GeminiClient::new(
            client,
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        )),
        config: Arc::new(config),
    };

    let addr = state.config.bind_address();
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("relay listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
