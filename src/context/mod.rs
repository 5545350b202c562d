//! Follow-up context.
//!
//! Each classified lookup that produces a result set overwrites the
//! session's slot wholesale; follow-ups ("what was it about?", "#2") read
//! it. Context lives only in memory and is gone on restart.
//!
//! Slots are keyed by the widget-supplied session id so concurrent visitors
//! don't clobber each other. Callers that send no id share [`DEFAULT_SESSION`],
//! which keeps the old single-slot behavior (last write wins) for legacy
//! embeds that predate session ids.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::catalog::VideoRecord;

/// Slot key for requests that carry no session id.
pub const DEFAULT_SESSION: &str = "shared";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingMode {
    Popular,
    Topic,
    Person,
    Guests,
}

impl ListingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingMode::Popular => "popular",
            ListingMode::Topic => "topic",
            ListingMode::Person => "person",
            ListingMode::Guests => "guests",
        }
    }
}

/// The last classified result for one session.
#[derive(Debug, Clone)]
pub enum SessionContext {
    /// A single most-recent video ("latest" mode).
    Latest(VideoRecord),
    /// An ordered result list plus the query that produced it.
    Listing {
        mode: ListingMode,
        query: Option<String>,
        videos: Vec<VideoRecord>,
    },
}

impl SessionContext {
    /// Resolve a 1-indexed follow-up ("#2") against the stored list.
    /// Only listings carry a list; a latest-video context or an
    /// out-of-range index resolves to nothing.
    pub fn nth(&self, index: usize) -> Option<&VideoRecord> {
        match self {
            SessionContext::Listing { videos, .. } if index >= 1 => videos.get(index - 1),
            _ => None,
        }
    }

    /// The single video a bare "what was it about?" refers to.
    pub fn focus(&self) -> Option<&VideoRecord> {
        match self {
            SessionContext::Latest(video) => Some(video),
            SessionContext::Listing { .. } => None,
        }
    }
}

#[derive(Debug)]
struct Slot {
    context: SessionContext,
    updated_at: DateTime<Utc>,
}

/// Per-session context slots. Replacement is wholesale; there is no partial
/// update and no expiry beyond process restart.
#[derive(Debug, Default)]
pub struct ContextStore {
    slots: RwLock<HashMap<String, Slot>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn replace(&self, session: &str, context: SessionContext) {
        let slot = Slot { context, updated_at: Utc::now() };
        tracing::debug!(session = %session, at = %slot.updated_at, "context replaced");
        let mut slots = self.slots.write().await;
        slots.insert(session.to_string(), slot);
    }

    pub async fn get(&self, session: &str) -> Option<SessionContext> {
        let slots = self.slots.read().await;
        slots.get(session).map(|slot| slot.context.clone())
    }
}
