//! Wire types for the relay's HTTP surface.

use serde::Deserialize;
use serde_json::{Value, json};

/// API version for capability detection
pub const API_VERSION: &str = "2026.8.1";

/// Chat request from the widget.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    /// Per-tab id generated by the widget; requests without one share a
    /// single context slot.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Wrap locally-synthesized text into the generative API's envelope shape,
/// so the widget has exactly one rendering path for both kinds of answer.
pub fn wrap_text(text: &str) -> Value {
    json!({
        "candidates": [ { "content": { "parts": [ { "text": text } ] } } ]
    })
}

/// Guardrail shortcut reply; tells the widget no model was consulted.
pub fn guarded_reply(message: &str) -> Value {
    json!({ "guarded": true, "message": message })
}

/// Uniform error body, mirrored from upstream or synthesized locally.
pub fn error_body(message: &str) -> Value {
    json!({ "error": { "message": message } })
}
