// tests/http_surface.rs
//
// Non-chat endpoints: status, catalog debug, and the feed listing.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use greenroom::catalog::{CatalogError, CatalogSource, FeedVideo, VideoRecord};
use greenroom::config::RelayConfig;
use greenroom::context::ContextStore;
use greenroom::llm::{GenerateError, TextGenerator};
use greenroom::server::{AppState, create_router};

struct StubCatalog {
    videos: Vec<VideoRecord>,
}

#[async_trait]
impl CatalogSource for StubCatalog {
    async fn latest_video(&self) -> Result<VideoRecord, CatalogError> {
        self.videos.first().cloned().ok_or(CatalogError::NoResults)
    }

    async fn recent_videos_with_stats(&self, n: usize) -> Result<Vec<VideoRecord>, CatalogError> {
        Ok(self.videos.iter().take(n).cloned().collect())
    }

    async fn feed_videos(&self, limit: usize) -> Result<Vec<FeedVideo>, CatalogError> {
        Ok(self
            .videos
            .iter()
            .take(limit)
            .map(|v| FeedVideo {
                title: v.title.clone(),
                video_id: v.video_id.clone(),
                link: v.link.clone(),
                published: v.published.clone(),
                thumbnail: format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", v.video_id),
                description: v.description.clone(),
            })
            .collect())
    }
}

struct NullGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl TextGenerator for NullGenerator {
    async fn generate(&self, _: &str, _: Option<&str>) -> Result<Value, GenerateError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Err(GenerateError::MissingKey)
    }
}

fn test_config() -> RelayConfig {
    RelayConfig {
        gemini_api_key: Some("test-key".into()),
        catalog_api_key: Some("AIzaTestKey".into()),
        channel_id: Some("UCtest".into()),
        host: "127.0.0.1".into(),
        port: 0,
        assets_dir: "public".into(),
        show_name: "The Signal".into(),
        gemini_model: "gemini-2.5-flash".into(),
        guardrail_enabled: true,
        popular_window: 6,
    }
}

fn videos(count: usize) -> Vec<VideoRecord> {
    (0..count)
        .map(|i| VideoRecord {
            video_id: format!("vid{i}"),
            title: format!("Episode {i}"),
            published: "2025-06-10T09:00:00Z".into(),
            description: "A perfectly ordinary description, long enough to preview.".into(),
            view_count: Some(100 * i as u64),
            link: format!("https://www.youtube.com/watch?v=vid{i}"),
        })
        .collect()
}

fn build_app(config: RelayConfig, records: Vec<VideoRecord>) -> Router {
    create_router(AppState {
        config: Arc::new(config),
        contexts: Arc::new(ContextStore::new()),
        catalog: Arc::new(StubCatalog { videos: records }),
        generator: Arc::new(NullGenerator { calls: AtomicUsize::new(0) }),
    })
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_status_reports_configuration() {
    let app = build_app(test_config(), videos(3));
    let (status, body) = get_json(&app, "/api/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["catalog_configured"], true);
    assert_eq!(body["generative_configured"], true);
    assert_eq!(body["guardrail"], true);
}

#[tokio::test]
async fn test_debug_catalog_reports_presence_and_latest() {
    let app = build_app(test_config(), videos(3));
    let (status, body) = get_json(&app, "/api/debug/catalog").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["env_status"]["catalog_api_key_set"], true);
    // Masked preview: first four characters only.
    assert_eq!(body["env_status"]["catalog_api_key_preview"], "AIza...");
    assert_eq!(body["latest"]["title"], "Episode 0");
    assert!(
        body["latest"]["description_preview"]
            .as_str()
            .unwrap()
            .ends_with("...")
    );
}

#[tokio::test]
async fn test_debug_catalog_missing_env_is_a_400_with_flags() {
    let mut config = test_config();
    config.catalog_api_key = None;
    let app = build_app(config, videos(3));

    let (status, body) = get_json(&app, "/api/debug/catalog").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert_eq!(body["step"], "env");
    assert_eq!(body["env_status"]["catalog_api_key_set"], false);
    assert_eq!(body["env_status"]["channel_id_set"], true);
}

#[tokio::test]
async fn test_latest_videos_serves_at_most_six_feed_entries() {
    let app = build_app(test_config(), videos(10));
    let (status, body) = get_json(&app, "/api/videos/latest").await;

    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().expect("feed endpoint returns a list");
    assert_eq!(list.len(), 6);

    let first = &list[0];
    assert_eq!(first["videoId"], "vid0");
    assert_eq!(first["title"], "Episode 0");
    assert!(first["link"].as_str().unwrap().contains("watch?v=vid0"));
    assert!(first["thumbnail"].as_str().unwrap().contains("vid0"));
    assert!(first.get("description").is_none(), "feed items stay lean");
}

#[tokio::test]
async fn test_empty_prompt_is_rejected_with_400() {
    let app = build_app(test_config(), videos(3));

    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "prompt": "   " }).to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"]["message"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_version_header_is_present() {
    let app = build_app(test_config(), videos(1));
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/status").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-api-version"));
}
