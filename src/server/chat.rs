//! Relay orchestration: guardrail → intent → branch handler.
//!
//! Classified lookups (latest/popular/topic/person/guest branches) hit the
//! catalog and overwrite the session's context on success; follow-ups read
//! that context; everything else is forwarded to the generative gateway.
//! Locally-synthesized answers are wrapped into the generative envelope so
//! the widget renders them identically.

use axum::http::StatusCode;
use axum::response::Json;
use serde_json::Value;

use crate::catalog::{self, CatalogError, VideoRecord};
use crate::context::{DEFAULT_SESSION, ListingMode, SessionContext};
use crate::guardrail::{self, Verdict};
use crate::intent::{self, Intent};
use crate::llm::{GenerateError, SITE_SYSTEM_INSTRUCTION, summary_prompt};

use super::AppState;
use super::types::{ChatRequest, error_body, guarded_reply, wrap_text};

/// How many ranked entries a "most popular" answer lists.
const POPULAR_TOP_K: usize = 5;

/// How many guest names a guest listing shows.
const GUEST_TOP_K: usize = 10;

/// Descriptions shorter than this cannot be summarized honestly.
const MIN_SUMMARY_DESCRIPTION: usize = 20;

pub const NO_CONTEXT_MESSAGE: &str = "Ask for a latest, popular, topic, or guest listing first - \
    then I can tell you more about it.";

pub const LIST_CONTEXT_HINT: &str = "You're looking at a list - ask \"tell me about #2\" to pick \
    one.";

pub const SHORT_DESCRIPTION_MESSAGE: &str = "This video's description is too short to summarize \
    accurately.";

pub const MISSING_GEMINI_MESSAGE: &str = "The generative backend is missing GEMINI_API_KEY. Add \
    it to the service environment and redeploy.";

pub const MISSING_CATALOG_MESSAGE: &str = "Catalog credentials are missing. Open \
    /api/debug/catalog to see which variable is unset.";

type Reply = (StatusCode, Json<Value>);

/// Entry point for `POST /api/chat`. Unexpected failures are caught here,
/// logged, and answered with a generic 500 body.
pub async fn handle_chat(state: &AppState, request: ChatRequest) -> Reply {
    let prompt = request.prompt.trim().to_string();
    if prompt.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(error_body("prompt must not be empty")));
    }

    let session = request
        .session_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_SESSION)
        .to_string();

    if state.config.guardrail_enabled && guardrail::screen(&prompt) == Verdict::Rejected {
        tracing::info!(prompt = %prompt, "guardrail rejected prompt");
        return (StatusCode::OK, Json(guarded_reply(guardrail::OFF_TOPIC_MESSAGE)));
    }

    let intent = intent::classify(&prompt);
    tracing::debug!(intent = ?intent, session = %session, "classified prompt");

    match dispatch(state, &session, &prompt, intent).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!("chat handler failed: {e:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(error_body(&e.to_string())))
        }
    }
}

async fn dispatch(
    state: &AppState,
    session: &str,
    prompt: &str,
    intent: Intent,
) -> anyhow::Result<Reply> {
    match intent {
        Intent::LatestEpisode => latest_episode(state, session).await,
        Intent::MostPopular => most_popular(state, session).await,
        Intent::TopicVideos { topic } => topic_videos(state, session, &topic).await,
        Intent::PersonVideos { person } => person_videos(state, session, &person).await,
        Intent::GuestList => guest_list(state, session).await,
        Intent::GuestsByTopic { topic } => guests_by_topic(state, session, &topic).await,
        Intent::HasPersonBeen { person } => has_person_been(state, session, &person).await,
        Intent::AboutFollowUp => about_follow_up(state, session).await,
        Intent::IndexedFollowUp { index } => indexed_follow_up(state, session, prompt, index).await,
        Intent::Fallback => forward_to_generator(state, prompt).await,
    }
}

// ============================================================================
// Catalog-backed branches
// ============================================================================

async fn latest_episode(state: &AppState, session: &str) -> anyhow::Result<Reply> {
    let video = match state.catalog.latest_video().await {
        Ok(video) => video,
        Err(e) => return catalog_reply(e, "the latest episode"),
    };

    state
        .contexts
        .replace(session, SessionContext::Latest(video.clone()))
        .await;

    let text = format!(
        "Latest {} episode:\n\n• Title: {}\n• Published: {}\n• Watch: {}\n\nAsk: \"What was this \
         episode about?\"",
        state.config.show_name, video.title, video.published, video.link
    );
    Ok(ok_text(&text))
}

async fn most_popular(state: &AppState, session: &str) -> anyhow::Result<Reply> {
    let window = state.config.popular_window;
    let videos = match state.catalog.recent_videos_with_stats(window).await {
        Ok(videos) => videos,
        Err(e) => return catalog_reply(e, "popular videos"),
    };

    let top = catalog::rank_by_views(&videos, POPULAR_TOP_K);
    if top.is_empty() {
        return Ok(ok_text("The catalog returned no videos to rank right now."));
    }

    state
        .contexts
        .replace(
            session,
            SessionContext::Listing {
                mode: ListingMode::Popular,
                query: None,
                videos: top.clone(),
            },
        )
        .await;

    let text = format!(
        "Most viewed of the last {window} uploads:\n\n{}\n\nAsk \"tell me about #2\" for details.",
        numbered_list_with_views(&top)
    );
    Ok(ok_text(&text))
}

async fn topic_videos(state: &AppState, session: &str, topic: &str) -> anyhow::Result<Reply> {
    let window = state.config.popular_window;
    let videos = match state.catalog.recent_videos_with_stats(window).await {
        Ok(videos) => videos,
        Err(e) => return catalog_reply(e, "matching videos"),
    };

    let hits = catalog::filter_by_term(&videos, topic);
    if hits.is_empty() {
        return Ok(ok_text(&format!(
            "I couldn't find any videos about \"{topic}\" in the last {window} uploads."
        )));
    }

    state
        .contexts
        .replace(
            session,
            SessionContext::Listing {
                mode: ListingMode::Topic,
                query: Some(topic.to_string()),
                videos: hits.clone(),
            },
        )
        .await;

    let text = format!(
        "Videos about {topic}:\n\n{}\n\nAsk \"tell me about #2\" for details.",
        numbered_list(&hits)
    );
    Ok(ok_text(&text))
}

async fn person_videos(state: &AppState, session: &str, person: &str) -> anyhow::Result<Reply> {
    let window = state.config.popular_window;
    let videos = match state.catalog.recent_videos_with_stats(window).await {
        Ok(videos) => videos,
        Err(e) => return catalog_reply(e, "matching videos"),
    };

    let hits = catalog::filter_by_term(&videos, person);
    if hits.is_empty() {
        return Ok(ok_text(&format!(
            "I couldn't find {person} in the last {window} uploads."
        )));
    }

    state
        .contexts
        .replace(
            session,
            SessionContext::Listing {
                mode: ListingMode::Person,
                query: Some(person.to_string()),
                videos: hits.clone(),
            },
        )
        .await;

    let text = format!(
        "Videos featuring {person}:\n\n{}\n\nAsk \"tell me about #2\" for details.",
        numbered_list(&hits)
    );
    Ok(ok_text(&text))
}

async fn guest_list(state: &AppState, session: &str) -> anyhow::Result<Reply> {
    let window = state.config.popular_window;
    let videos = match state.catalog.recent_videos_with_stats(window).await {
        Ok(videos) => videos,
        Err(e) => return catalog_reply(e, "guest information"),
    };

    let guests = catalog::guests::extract_guests(&videos);
    if guests.is_empty() {
        return Ok(ok_text(
            "I couldn't spot any guest names in the recent uploads. (I read names out of titles \
             and descriptions, so I miss some.)",
        ));
    }

    state
        .contexts
        .replace(
            session,
            SessionContext::Listing {
                mode: ListingMode::Guests,
                query: None,
                videos: videos.clone(),
            },
        )
        .await;

    let lines: Vec<String> = guests
        .iter()
        .take(GUEST_TOP_K)
        .enumerate()
        .map(|(i, g)| format!("{}. {} — {} video(s)", i + 1, g.name, g.video_count))
        .collect();
    let text = format!(
        "Guests from the last {window} uploads:\n\n{}\n\nAsk \"videos with <name>\" to see their \
         episodes.",
        lines.join("\n")
    );
    Ok(ok_text(&text))
}

async fn guests_by_topic(state: &AppState, session: &str, topic: &str) -> anyhow::Result<Reply> {
    let window = state.config.popular_window;
    let videos = match state.catalog.recent_videos_with_stats(window).await {
        Ok(videos) => videos,
        Err(e) => return catalog_reply(e, "guest information"),
    };

    let hits = catalog::filter_by_term(&videos, topic);
    if hits.is_empty() {
        return Ok(ok_text(&format!(
            "I couldn't find any videos about \"{topic}\" in the last {window} uploads."
        )));
    }

    let guests = catalog::guests::extract_guests(&hits);
    if guests.is_empty() {
        return Ok(ok_text(&format!(
            "I found videos about \"{topic}\" but couldn't spot guest names in them."
        )));
    }

    state
        .contexts
        .replace(
            session,
            SessionContext::Listing {
                mode: ListingMode::Guests,
                query: Some(topic.to_string()),
                videos: hits.clone(),
            },
        )
        .await;

    let lines: Vec<String> = guests
        .iter()
        .take(GUEST_TOP_K)
        .enumerate()
        .map(|(i, g)| format!("{}. {} — {} video(s)", i + 1, g.name, g.video_count))
        .collect();
    let text = format!("Guests on \"{topic}\":\n\n{}", lines.join("\n"));
    Ok(ok_text(&text))
}

async fn has_person_been(state: &AppState, session: &str, person: &str) -> anyhow::Result<Reply> {
    let window = state.config.popular_window;
    let videos = match state.catalog.recent_videos_with_stats(window).await {
        Ok(videos) => videos,
        Err(e) => return catalog_reply(e, "guest information"),
    };

    let hits = catalog::filter_by_term(&videos, person);
    if hits.is_empty() {
        return Ok(ok_text(&format!(
            "I couldn't find {person} in the last {window} uploads. (I only scan recent videos, \
             so earlier appearances won't show up.)"
        )));
    }

    state
        .contexts
        .replace(
            session,
            SessionContext::Listing {
                mode: ListingMode::Person,
                query: Some(person.to_string()),
                videos: hits.clone(),
            },
        )
        .await;

    let text = format!(
        "Yes - {person} shows up in {} of the last {window} uploads:\n\n{}",
        hits.len(),
        numbered_list(&hits)
    );
    Ok(ok_text(&text))
}

// ============================================================================
// Context follow-ups
// ============================================================================

async fn about_follow_up(state: &AppState, session: &str) -> anyhow::Result<Reply> {
    let Some(context) = state.contexts.get(session).await else {
        return Ok(ok_text(NO_CONTEXT_MESSAGE));
    };

    match context.focus() {
        Some(video) => summarize_video(state, video).await,
        None => Ok(ok_text(LIST_CONTEXT_HINT)),
    }
}

async fn indexed_follow_up(
    state: &AppState,
    session: &str,
    prompt: &str,
    index: usize,
) -> anyhow::Result<Reply> {
    if let Some(context) = state.contexts.get(session).await {
        if let Some(video) = context.nth(index) {
            return summarize_video(state, video).await;
        }
    }
    // No context, a latest-only context, or an out-of-range index: the
    // follow-up is not resolved and the prompt takes the fallback path.
    forward_to_generator(state, prompt).await
}

async fn summarize_video(state: &AppState, video: &VideoRecord) -> anyhow::Result<Reply> {
    if state.config.gemini_api_key.is_none() {
        return Ok(ok_text(MISSING_GEMINI_MESSAGE));
    }
    if video.description.trim().len() < MIN_SUMMARY_DESCRIPTION {
        return Ok(ok_text(SHORT_DESCRIPTION_MESSAGE));
    }
    generator_call(state, &summary_prompt(video), None).await
}

// ============================================================================
// Generative gateway
// ============================================================================

async fn forward_to_generator(state: &AppState, prompt: &str) -> anyhow::Result<Reply> {
    if state.config.gemini_api_key.is_none() {
        return Ok(ok_text(MISSING_GEMINI_MESSAGE));
    }
    generator_call(state, prompt, Some(SITE_SYSTEM_INSTRUCTION)).await
}

/// A successful upstream body is returned untouched; a non-2xx upstream
/// response is mirrored (status and body) to the caller.
async fn generator_call(
    state: &AppState,
    prompt: &str,
    system_instruction: Option<&str>,
) -> anyhow::Result<Reply> {
    match state.generator.generate(prompt, system_instruction).await {
        Ok(body) => Ok((StatusCode::OK, Json(body))),
        Err(GenerateError::Upstream { status, body }) => Ok((
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            Json(body),
        )),
        Err(GenerateError::MissingKey) => Ok(ok_text(MISSING_GEMINI_MESSAGE)),
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// Reply helpers
// ============================================================================

fn ok_text(text: &str) -> Reply {
    (StatusCode::OK, Json(wrap_text(text)))
}

/// Catalog failure taxonomy: missing config and upstream errors become
/// canned explanatory messages; transport errors bubble to the 500 catch.
fn catalog_reply(err: CatalogError, what: &str) -> anyhow::Result<Reply> {
    match err {
        CatalogError::MissingConfig => Ok(ok_text(MISSING_CATALOG_MESSAGE)),
        CatalogError::Api { message, .. } => Ok(ok_text(&format!(
            "Couldn't fetch {what} right now. {message}"
        ))),
        CatalogError::NoResults => Ok(ok_text(&format!(
            "The catalog returned no results for {what}."
        ))),
        CatalogError::Feed(detail) => Ok(ok_text(&format!(
            "Couldn't read the catalog response right now. ({detail})"
        ))),
        CatalogError::Http(e) => Err(e.into()),
    }
}

fn numbered_list(videos: &[VideoRecord]) -> String {
    videos
        .iter()
        .enumerate()
        .map(|(i, v)| format!("{}. {} ({})\n   {}", i + 1, v.title, v.published, v.link))
        .collect::<Vec<_>>()
        .join("\n")
}

fn numbered_list_with_views(videos: &[VideoRecord]) -> String {
    videos
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let views = match v.view_count {
                Some(count) => format!("{count} views"),
                None => "view count unavailable".to_string(),
            };
            format!("{}. {} — {}\n   {}", i + 1, v.title, views, v.link)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
