//! Generative text gateway (Gemini `generateContent`)
//!
//! One request, one response: no retries, no streaming. On success the
//! upstream JSON is returned untouched so the widget sees the exact
//! `candidates` envelope the API produced; on non-success the status and
//! body are surfaced for the caller to mirror.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::catalog::VideoRecord;

const GENERATE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// System instruction for prompts the relay forwards verbatim.
pub const SITE_SYSTEM_INSTRUCTION: &str = "You are the friendly assistant embedded in a show's \
    website chat widget. Answer briefly and conversationally. Stick to the show, its episodes, \
    videos, and guests; if you are unsure, say so rather than inventing details.";

/// Description-only summarization prompt. The model is forbidden from adding
/// facts beyond the description text.
pub fn summary_prompt(video: &VideoRecord) -> String {
    format!(
        "You are summarizing an episode of a video show.\n\
         Use ONLY the description below. Do NOT add facts.\n\
         If something isn't in the description, say \"Not specified in the description.\"\n\
         \n\
         Title: {}\n\
         Published: {}\n\
         Link: {}\n\
         \n\
         Description:\n{}\n\
         \n\
         Return:\n\
         1) 3-5 sentence summary\n\
         2) 3 bullet key takeaways",
        video.title, video.published, video.link, video.description
    )
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generative API key is not configured")]
    MissingKey,

    /// Non-2xx upstream response; the handler mirrors `status` and `body`
    /// back to the caller untouched.
    #[error("generative API error {status}")]
    Upstream { status: u16, body: Value },

    #[error("generative request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Seam for the generative backend. Tests substitute a stub; production uses
/// [`GeminiClient`].
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        system_instruction: Option<&str>,
    ) -> Result<Value, GenerateError>;
}

pub struct GeminiClient {
    client: HttpClient,
    api_key: Option<String>,
    model: String,
}

impl GeminiClient {
    pub fn new(client: HttpClient, api_key: Option<String>, model: String) -> Self {
        Self { client, api_key, model }
    }

    fn endpoint(&self, key: &str) -> String {
        format!(
            "{GENERATE_API_BASE}/{}:generateContent?key={}",
            self.model,
            urlencoding::encode(key)
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        system_instruction: Option<&str>,
    ) -> Result<Value, GenerateError> {
        let key = self.api_key.as_deref().ok_or(GenerateError::MissingKey)?;

        let api_request = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt.to_string() }],
            }],
            system_instruction: system_instruction.map(|s| SystemInstruction {
                parts: vec![RequestPart { text: s.to_string() }],
            }),
        };

        let response = self
            .client
            .post(self.endpoint(key))
            .json(&api_request)
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or_default();

        if !status.is_success() {
            return Err(GenerateError::Upstream { status: status.as_u16(), body });
        }

        Ok(body)
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
}

#[derive(Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}
