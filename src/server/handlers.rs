//! HTTP handlers for status, chat, catalog debug, and the feed listing.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{Value, json};

use crate::catalog::CatalogError;

use super::AppState;
use super::chat;
use super::types::{ChatRequest, error_body};

/// Up to this many feed entries are served from `/api/videos/latest`.
const FEED_LIMIT: usize = 6;

/// Health check and status endpoint
pub async fn status_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": state.config.gemini_model,
        "guardrail": state.config.guardrail_enabled,
        "catalog_configured": state.config.catalog_configured(),
        "generative_configured": state.config.gemini_api_key.is_some(),
    }))
}

/// `POST /api/chat`: the relay's single conversational endpoint.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> (StatusCode, Json<Value>) {
    chat::handle_chat(&state, request).await
}

/// `GET /api/debug/catalog`: which credentials the process actually sees.
/// Presence booleans and a 4-character key preview only; never full values.
pub async fn debug_catalog_handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let env_status = json!({
        "gemini_api_key_set": state.config.gemini_api_key.is_some(),
        "catalog_api_key_set": state.config.catalog_api_key.is_some(),
        "catalog_api_key_preview": state.config.catalog_key_preview(),
        "channel_id_set": state.config.channel_id.is_some(),
    });

    if !state.config.catalog_configured() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "ok": false,
                "step": "env",
                "env_status": env_status,
                "error": "Missing catalog API key or channel id. Set them on the service \
                          environment tab and redeploy.",
            })),
        );
    }

    match state.catalog.latest_video().await {
        Ok(video) => {
            let preview: String = video.description.chars().take(120).collect();
            (
                StatusCode::OK,
                Json(json!({
                    "ok": true,
                    "env_status": env_status,
                    "latest": {
                        "title": video.title,
                        "published": video.published,
                        "link": video.link,
                        "description_preview": format!("{preview}..."),
                    },
                })),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "ok": false,
                "step": "catalog_fetch",
                "env_status": env_status,
                "error": e.to_string(),
            })),
        ),
    }
}

/// `GET /api/videos/latest`: recent uploads from the public feed, for the
/// widget's carousel. Needs only a channel id, no API key.
pub async fn latest_videos_handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.catalog.feed_videos(FEED_LIMIT).await {
        Ok(videos) => (StatusCode::OK, Json(json!(videos))),
        Err(CatalogError::MissingConfig) => (
            StatusCode::BAD_REQUEST,
            Json(error_body("channel id is not configured")),
        ),
        Err(e) => (StatusCode::BAD_GATEWAY, Json(error_body(&e.to_string()))),
    }
}
